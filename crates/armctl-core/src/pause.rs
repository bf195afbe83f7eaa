//! Pause-for-external-signal
//!
//! The session stops between provisioning and cleanup until a [`Pause`]
//! says to continue. How long that takes, and whether it can be cancelled,
//! is up to the implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a pause ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// The signal arrived
    Continue,
    /// The wait was abandoned; cleanup still runs
    Cancelled,
}

#[async_trait]
pub trait Pause: Send + Sync {
    async fn wait(&self, prompt: &str) -> PauseOutcome;
}

/// Continue immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

#[async_trait]
impl Pause for Immediate {
    async fn wait(&self, _prompt: &str) -> PauseOutcome {
        PauseOutcome::Continue
    }
}

/// Continue after a fixed delay
#[derive(Debug, Clone, Copy)]
pub struct Delay(pub Duration);

#[async_trait]
impl Pause for Delay {
    async fn wait(&self, _prompt: &str) -> PauseOutcome {
        tokio::time::sleep(self.0).await;
        PauseOutcome::Continue
    }
}

/// Continue when `resume` fires; cancelled when `cancel` fires first
#[derive(Debug, Clone)]
pub struct SignalPause {
    resume: CancellationToken,
    cancel: CancellationToken,
}

impl SignalPause {
    pub fn new(resume: CancellationToken, cancel: CancellationToken) -> Self {
        Self { resume, cancel }
    }

    /// Token that releases the pause
    pub fn resume_token(&self) -> CancellationToken {
        self.resume.clone()
    }
}

#[async_trait]
impl Pause for SignalPause {
    async fn wait(&self, prompt: &str) -> PauseOutcome {
        debug!("Waiting for signal: {}", prompt);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => PauseOutcome::Cancelled,
            _ = self.resume.cancelled() => PauseOutcome::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn immediate_continues() {
        assert_eq!(Immediate.wait("go").await, PauseOutcome::Continue);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_continues_after_sleep() {
        assert_eq!(
            Delay(Duration::from_secs(60)).wait("go").await,
            PauseOutcome::Continue
        );
    }

    #[tokio::test]
    async fn signal_pause_resumes() {
        let pause = SignalPause::new(CancellationToken::new(), CancellationToken::new());
        let resume = pause.resume_token();
        let handle = tokio::spawn(async move { pause.wait("go").await });
        resume.cancel();
        assert_eq!(handle.await.unwrap(), PauseOutcome::Continue);
    }

    #[tokio::test]
    async fn signal_pause_cancel_wins() {
        let cancel = CancellationToken::new();
        let pause = SignalPause::new(CancellationToken::new(), cancel.clone());
        cancel.cancel();
        assert_eq!(pause.wait("go").await, PauseOutcome::Cancelled);
    }
}
