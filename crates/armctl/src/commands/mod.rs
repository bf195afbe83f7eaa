//! Command implementations

pub mod group;
pub mod profile;
pub mod run;
pub mod storage;

use armctl_core::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::OutputFormat;
use crate::output;

/// Structured output format, or `None` for human-readable text
pub(crate) fn structured(format: OutputFormat) -> Option<output::OutputFormat> {
    match output::OutputFormat::from(format) {
        output::OutputFormat::Table => None,
        structured => Some(structured),
    }
}

/// Spinner for a long-running ARM operation
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message(message.into());
    pb
}

/// Progress callback that drives `pb`
pub(crate) fn spinner_callback(pb: &ProgressBar, label: String) -> ProgressCallback {
    let pb = pb.clone();
    Box::new(move |event: ProgressEvent| match event {
        ProgressEvent::Started { .. } => {
            pb.set_message(format!("{}: accepted", label));
        }
        ProgressEvent::Polling { status, elapsed } => {
            pb.set_message(format!("{}: {} ({:.0}s)", label, status, elapsed.as_secs_f64()));
        }
        ProgressEvent::Completed { elapsed } => {
            pb.finish_with_message(format!(
                "{}: \u{2713} done in {:.0}s",
                label,
                elapsed.as_secs_f64()
            ));
        }
        ProgressEvent::Failed { error } => {
            pb.finish_with_message(format!("{}: \u{2717} {}", label, error));
        }
    })
}
