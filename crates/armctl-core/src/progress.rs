//! Progress tracking for long-running ARM operations
//!
//! Deletes and storage account creation answer `202 Accepted` with an
//! operation URL (`Azure-AsyncOperation` or `Location`). That URL is polled
//! until it reports a terminal state.

use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::arm::ArmClient;
use crate::arm::client::retry_after;
use crate::error::{CoreError, Result};

/// Progress events emitted while an operation runs
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Polling has begun
    Started { operation_url: String },
    /// One poll came back without a terminal state
    Polling { status: String, elapsed: Duration },
    /// Operation finished successfully
    Completed { elapsed: Duration },
    /// Operation failed
    Failed { error: String },
}

/// Callback type for progress updates
///
/// The CLI drives a spinner with this; library callers usually pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Body of an `Azure-AsyncOperation` status resource
#[derive(Debug, Default, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Poll an operation URL until it completes
///
/// # Arguments
///
/// * `client` - Authenticated client (the operation URL needs the same token)
/// * `operation_url` - Value of `Azure-AsyncOperation` or `Location`
/// * `timeout` - Maximum time to wait
/// * `interval` - Delay between polls when the service sends no `Retry-After`
/// * `on_progress` - Optional callback for progress updates
///
/// # Example
///
/// ```rust,ignore
/// use armctl_core::progress::{wait_for_operation, ProgressEvent};
/// use std::time::Duration;
///
/// wait_for_operation(
///     &client,
///     &location,
///     Duration::from_secs(1800),
///     Duration::from_secs(5),
///     Some(Box::new(|event| {
///         if let ProgressEvent::Polling { status, elapsed } = event {
///             println!("{} ({:.0}s)", status, elapsed.as_secs());
///         }
///     })),
/// )
/// .await?;
/// ```
pub async fn wait_for_operation(
    client: &ArmClient,
    operation_url: &str,
    timeout: Duration,
    interval: Duration,
    on_progress: Option<&ProgressCallback>,
) -> Result<()> {
    let start = Instant::now();
    let url = Url::parse(operation_url)
        .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", operation_url, e)))?;

    emit(
        on_progress,
        ProgressEvent::Started {
            operation_url: operation_url.to_string(),
        },
    );

    loop {
        let elapsed = start.elapsed();
        if elapsed > timeout {
            emit(
                on_progress,
                ProgressEvent::Failed {
                    error: format!("timed out after {:?}", timeout),
                },
            );
            return Err(CoreError::OperationTimeout(timeout));
        }

        let response = client.send(Method::GET, url.clone(), None).await?;
        let status_code = response.status();
        let delay = retry_after(response.headers()).unwrap_or(interval);

        if status_code == StatusCode::ACCEPTED {
            emit(
                on_progress,
                ProgressEvent::Polling {
                    status: "Accepted".to_string(),
                    elapsed,
                },
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        let response = match ArmClient::check(response).await {
            Ok(response) => response,
            Err(err) => {
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let body = response.text().await?;
        let status: OperationStatus = serde_json::from_str(&body).unwrap_or_default();
        let state = status.status.unwrap_or_else(|| "Succeeded".to_string());
        debug!("Operation {} is {}", operation_url, state);

        match state.to_lowercase().as_str() {
            "succeeded" => {
                emit(on_progress, ProgressEvent::Completed { elapsed });
                return Ok(());
            }
            "failed" | "canceled" | "cancelled" => {
                let error = status
                    .error
                    .map(|e| match (e.code, e.message) {
                        (Some(code), Some(message)) => format!("{}: {}", code, message),
                        (None, Some(message)) => message,
                        (Some(code), None) => code,
                        (None, None) => format!("operation {}", state),
                    })
                    .unwrap_or_else(|| format!("operation {}", state));
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        error: error.clone(),
                    },
                );
                return Err(CoreError::OperationFailed(error));
            }
            _ => {
                emit(
                    on_progress,
                    ProgressEvent::Polling {
                        status: state.clone(),
                        elapsed,
                    },
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Helper to emit progress events
fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
