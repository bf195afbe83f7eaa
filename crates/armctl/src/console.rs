//! Console rendering of session events and the Enter-to-continue pause

use std::io::{self, Write};

use armctl_core::pause::{Pause, PauseOutcome};
use armctl_core::session::{CleanupScope, SessionEvent};
use async_trait::async_trait;
use colored::Colorize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Line printed to stdout for an event, if any
pub fn render(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Listing => Some("Resource Groups:".to_string()),
        SessionEvent::GroupListed { name, .. } => Some(format!("-- {}", name)),
        SessionEvent::NoGroups => Some("-- No Resource Groups".to_string()),
        SessionEvent::GroupCreated { name } => Some(format!("Created Resource Group: {}", name)),
        SessionEvent::StorageAccountCreated { name } => {
            Some(format!("Created Storage Account: {}", name))
        }
        SessionEvent::Paused { .. } => None,
        SessionEvent::Cancelled => Some("Cancelled, cleaning up".to_string()),
        SessionEvent::CleanupStarted { .. } => Some("Deleting Resource Groups:".to_string()),
        SessionEvent::GroupDeleted { name } => Some(format!("-- {} DELETED", name)),
        SessionEvent::GroupAlreadyGone { name } => Some(format!("-- {} already deleted", name)),
        SessionEvent::Failed { message, .. } => Some(format!("Exception: {}", message)),
    }
}

/// Prints session events as console lines
pub struct ConsoleReporter {
    subscription_id: String,
}

impl ConsoleReporter {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }

    pub fn report(&self, event: SessionEvent) {
        if let SessionEvent::CleanupStarted {
            scope: CleanupScope::All,
        } = event
        {
            eprintln!(
                "{}{} deleting every resource group in subscription {}",
                "warning".yellow().bold(),
                ":".bold(),
                self.subscription_id
            );
        }
        if let Some(line) = render(&event) {
            println!("{}", line);
        }
    }
}

/// Waits for a line on stdin
///
/// The read happens on a detached thread so an abandoned read never holds
/// up process exit. Cancelling `cancel` (Ctrl-C) ends the wait early.
pub struct StdinPause {
    cancel: CancellationToken,
    prompt_on_stderr: bool,
}

impl StdinPause {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            prompt_on_stderr: false,
        }
    }

    /// Keep stdout free for structured output
    pub fn prompt_on_stderr(mut self) -> Self {
        self.prompt_on_stderr = true;
        self
    }

    fn prompt_writer(&self) -> Box<dyn Write> {
        if self.prompt_on_stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }
}

#[async_trait]
impl Pause for StdinPause {
    async fn wait(&self, prompt: &str) -> PauseOutcome {
        {
            let mut out = self.prompt_writer();
            let _ = write!(out, "\n{} ", prompt);
            let _ = out.flush();
        }

        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let mut line = String::new();
            let _ = tx.send(io::stdin().read_line(&mut line));
        });

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                let _ = writeln!(self.prompt_writer());
                PauseOutcome::Cancelled
            }
            read = rx => {
                debug!("Pause ended by stdin: {:?}", read);
                PauseOutcome::Continue
            }
        }
    }
}
