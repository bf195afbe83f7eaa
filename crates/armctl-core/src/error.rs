//! Unified error handling for armctl-core
//!
//! Failures reported by Azure Resource Manager are classified into the
//! variants callers branch on (conflict, quota, not found, ...). Anything
//! unrecognised keeps its HTTP status and ARM error code in
//! [`CoreError::Provider`].
//!
//! # Example
//!
//! ```rust
//! use armctl_core::CoreError;
//!
//! let err = CoreError::from_arm(404, Some("ResourceGroupNotFound"), "Resource group 'x' could not be found.");
//! assert!(err.is_not_found());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Credentials were rejected by the token endpoint or ARM
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A resource with this name already exists
    #[error("Resource conflict: {message}")]
    ResourceConflict { message: String },

    /// The region is not offered for this subscription or resource type
    #[error("Region unavailable: {message}")]
    RegionUnavailable { message: String },

    /// A subscription quota or limit was hit
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// The (globally namespaced) resource name cannot be used
    #[error("Name unavailable: {message}")]
    NameUnavailable { message: String },

    /// The resource does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other error returned by the management API
    #[error("Provider error (HTTP {status}{}): {message}", .code.as_deref().map(|c| format!(", {}", c)).unwrap_or_default())]
    Provider {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A management or operation URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A long-running operation did not finish in time
    #[error("Operation timed out after {0:?}")]
    OperationTimeout(Duration),

    /// A long-running operation reached a failed terminal state
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The identity can see no enabled subscription
    #[error("No enabled subscription is visible to this service principal")]
    NoSubscription,

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// ARM error codes, grouped by the variant they map to
const CONFLICT_CODES: &[&str] = &[
    "Conflict",
    "ResourceGroupExists",
    "ResourceExists",
    "StorageAccountAlreadyExists",
];

const NAME_CODES: &[&str] = &[
    "StorageAccountAlreadyTaken",
    "AccountNameInvalid",
    "AlreadyExists",
    "InvalidResourceName",
];

const REGION_CODES: &[&str] = &[
    "LocationNotAvailableForResourceGroup",
    "LocationNotAvailableForResourceType",
    "LocationRequired",
    "InvalidLocation",
    "NoRegisteredProviderFound",
    "DisallowedLocation",
    "RequestDisallowedByAzure",
];

const QUOTA_CODES: &[&str] = &[
    "QuotaExceeded",
    "OperationNotAllowed",
    "StorageAccountCountExceeded",
    "TooManyStorageAccounts",
    "SubscriptionStorageAccountLimitExceeded",
];

const NOT_FOUND_CODES: &[&str] = &["ResourceGroupNotFound", "ResourceNotFound", "NotFound"];

const AUTH_CODES: &[&str] = &[
    "AuthenticationFailed",
    "InvalidAuthenticationToken",
    "InvalidAuthenticationTokenTenant",
    "ExpiredAuthenticationToken",
    "AuthorizationFailed",
    "invalid_client",
    "unauthorized_client",
    "invalid_request",
];

impl CoreError {
    /// Classify an error response from ARM or the token endpoint
    pub fn from_arm(status: u16, code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        let matches = |codes: &[&str]| {
            code.is_some_and(|c| codes.iter().any(|k| k.eq_ignore_ascii_case(c)))
        };

        if matches(AUTH_CODES) || status == 401 {
            CoreError::Authentication { message }
        } else if matches(NAME_CODES) {
            CoreError::NameUnavailable { message }
        } else if matches(QUOTA_CODES) {
            CoreError::QuotaExceeded { message }
        } else if matches(REGION_CODES) {
            CoreError::RegionUnavailable { message }
        } else if matches(CONFLICT_CODES) || status == 409 {
            CoreError::ResourceConflict { message }
        } else if matches(NOT_FOUND_CODES) || status == 404 {
            CoreError::NotFound { message }
        } else {
            CoreError::Provider {
                status,
                code: code.map(str::to_string),
                message,
            }
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    /// Returns true if credentials were rejected
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Authentication { .. })
    }

    /// Returns true if this is a naming conflict
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::ResourceConflict { .. } | CoreError::NameUnavailable { .. }
        )
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            CoreError::Provider { status, .. } => *status >= 500,
            CoreError::Request(e) => e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }

    /// Returns true if this is a timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::OperationTimeout(_) => true,
            CoreError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_not_found() {
        let err = CoreError::from_arm(404, Some("ResourceGroupNotFound"), "gone");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());

        let bare = CoreError::from_arm(404, None, "gone");
        assert!(bare.is_not_found());
    }

    #[test]
    fn classifies_authentication() {
        let err = CoreError::from_arm(400, Some("invalid_client"), "AADSTS7000215: Invalid client secret");
        assert!(err.is_unauthorized());

        let arm = CoreError::from_arm(401, Some("InvalidAuthenticationToken"), "bad token");
        assert!(arm.is_unauthorized());
    }

    #[test]
    fn classifies_storage_name_errors() {
        let err = CoreError::from_arm(409, Some("StorageAccountAlreadyTaken"), "taken");
        assert!(matches!(err, CoreError::NameUnavailable { .. }));
        assert!(err.is_conflict());
    }

    #[test]
    fn classifies_region_and_quota() {
        let region = CoreError::from_arm(400, Some("LocationNotAvailableForResourceGroup"), "no");
        assert!(matches!(region, CoreError::RegionUnavailable { .. }));

        let quota = CoreError::from_arm(409, Some("TooManyStorageAccounts"), "limit");
        assert!(matches!(quota, CoreError::QuotaExceeded { .. }));
    }

    #[test]
    fn bare_conflict_status_is_resource_conflict() {
        let err = CoreError::from_arm(409, None, "exists");
        assert!(matches!(err, CoreError::ResourceConflict { .. }));
    }

    #[test]
    fn unknown_code_keeps_status_and_code() {
        let err = CoreError::from_arm(503, Some("ServiceUnavailable"), "try later");
        assert!(err.is_server_error());
        assert_eq!(
            err.to_string(),
            "Provider error (HTTP 503, ServiceUnavailable): try later"
        );

        let no_code = CoreError::from_arm(500, None, "boom");
        assert_eq!(no_code.to_string(), "Provider error (HTTP 500): boom");
    }

    #[test]
    fn timeout_helpers() {
        let err = CoreError::OperationTimeout(Duration::from_secs(60));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));
        assert!(!CoreError::OperationFailed("Canceled".to_string()).is_timeout());
    }
}
