//! Error types for armctl
//!
//! Structured errors with suggestions, printed as cargo-style diagnostics.

use armctl_core::{ConfigError, CoreError};
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'dev' not found
///
///   tip: List available profiles: armctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Render without colors
    pub fn render_plain(&self) -> String {
        let mut out = format!("error: {}\n", self.message);
        if let Some(detail) = &self.detail {
            out.push_str(&format!("  {}\n", detail));
        }
        for (description, commands) in &self.tips {
            out.push_str(&format!("\n  tip: {}\n", description));
            for cmd in commands {
                out.push_str(&format!("      {}\n", cmd));
            }
        }
        out
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        if !colored::control::SHOULD_COLORIZE.should_colorize() {
            eprint!("{}", self.render_plain());
            return;
        }

        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the armctl application
#[derive(Error, Debug)]
pub enum ArmCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured and AZURE_* credentials are incomplete")]
    NoProfileConfigured,

    #[error("Profile '{name}' is missing {fields}")]
    MissingCredentials { name: String, fields: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("No enabled subscription is visible to this service principal")]
    NoSubscription,

    #[error("Resource group '{name}' not found")]
    ResourceGroupNotFound { name: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("Region unavailable: {message}")]
    RegionUnavailable { message: String },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for armctl operations
pub type Result<T> = std::result::Result<T, ArmCtlError>;

impl ArmCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ArmCtlError::ProfileNotFound { name } => vec![
                "List available profiles: armctl profile list".to_string(),
                format!(
                    "Create profile '{}': armctl profile set {} --client-id <id> --tenant-id <tenant>",
                    name, name
                ),
            ],
            ArmCtlError::NoProfileConfigured => vec![
                "Create a profile: armctl profile set dev --client-id <id> --tenant-id <tenant>"
                    .to_string(),
                "Or export AZURE_CLIENT_ID, AZURE_CLIENT_SECRET and AZURE_TENANT_ID".to_string(),
            ],
            ArmCtlError::MissingCredentials { name, .. } => vec![
                format!("Update profile credentials: armctl profile set {}", name),
                format!("Check profile details: armctl profile show {}", name),
            ],
            ArmCtlError::AuthenticationFailed { .. } => vec![
                "Check the client id, secret and tenant: armctl profile show <profile>".to_string(),
                "Client secrets expire; create a new one in the app registration if needed"
                    .to_string(),
                "Make sure --environment matches the cloud the tenant lives in".to_string(),
            ],
            ArmCtlError::NoSubscription => vec![
                "Grant the service principal a role on a subscription".to_string(),
                "Or pin one: armctl profile set <name> --subscription-id <id> ...".to_string(),
            ],
            ArmCtlError::ResourceGroupNotFound { .. } => vec![
                "List resource groups: armctl group list".to_string(),
                "Pass --if-exists to treat a missing group as success".to_string(),
            ],
            ArmCtlError::Conflict { .. } => {
                vec!["Pick another name; storage account names are global across Azure".to_string()]
            }
            ArmCtlError::RegionUnavailable { .. } => {
                vec!["Try another region with --region, e.g. --region eastus".to_string()]
            }
            ArmCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the management endpoint: armctl profile show <profile>".to_string(),
            ],
            ArmCtlError::InvalidInput { .. } => {
                vec!["Check the command syntax: armctl <command> --help".to_string()]
            }
            _ => vec![],
        }
    }

    /// Extra context shown under the message
    fn detail(&self) -> Option<String> {
        match self {
            ArmCtlError::MissingCredentials { .. } => Some(
                "A service principal needs a client id, a client secret and a tenant id"
                    .to_string(),
            ),
            ArmCtlError::QuotaExceeded { .. } => {
                Some("Delete unused resources or request a quota increase".to_string())
            }
            _ => None,
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));
        if let Some(detail) = self.detail() {
            diag = diag.detail(&detail);
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for ArmCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => ArmCtlError::AuthenticationFailed { message },
            CoreError::NoSubscription => ArmCtlError::NoSubscription,
            CoreError::ResourceConflict { message } | CoreError::NameUnavailable { message } => {
                ArmCtlError::Conflict { message }
            }
            CoreError::RegionUnavailable { message } => {
                ArmCtlError::RegionUnavailable { message }
            }
            CoreError::QuotaExceeded { message } => ArmCtlError::QuotaExceeded { message },
            CoreError::NotFound { message } => ArmCtlError::ApiError { message },
            CoreError::Request(e) => ArmCtlError::ConnectionError {
                message: e.to_string(),
            },
            CoreError::OperationTimeout(duration) => ArmCtlError::Timeout {
                message: format!("Operation timed out after {} seconds", duration.as_secs()),
            },
            CoreError::Validation(message) => ArmCtlError::InvalidInput { message },
            CoreError::Config(e) => ArmCtlError::from(e),
            other => ArmCtlError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for ArmCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => ArmCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => ArmCtlError::NoProfileConfigured,
            ConfigError::MissingField { profile, fields } => {
                ArmCtlError::MissingCredentials {
                    name: profile,
                    fields,
                }
            }
            other => ArmCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ArmCtlError {
    fn from(err: serde_json::Error) -> Self {
        ArmCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for ArmCtlError {
    fn from(err: std::io::Error) -> Self {
        ArmCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for ArmCtlError {
    fn from(err: anyhow::Error) -> Self {
        ArmCtlError::Configuration(format!("{:#}", err))
    }
}
