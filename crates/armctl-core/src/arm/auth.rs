//! OAuth2 client-credentials flow for service principals

use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::config::ServicePrincipal;
use crate::error::{CoreError, Result};

/// Tokens are refreshed this long before they expire
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3599);

/// A bearer token and when it stops being valid
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_at: Instant,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            expires_at: Instant::now() + lifetime,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// True when the token expires within `margin`
    pub fn expires_within(&self, margin: Duration) -> bool {
        Instant::now() + margin >= self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Token endpoint for a tenant
pub fn token_url(credentials: &ServicePrincipal) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        credentials.authority_url, credentials.tenant_id
    )
}

/// Exchange service principal credentials for a management token
///
/// Rejections from the token endpoint become [`CoreError::Authentication`].
pub async fn request_token(
    http: &reqwest::Client,
    credentials: &ServicePrincipal,
) -> Result<AccessToken> {
    let url = token_url(credentials);
    debug!("Requesting token from {}", url);

    let form = serde_urlencoded::to_string([
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("scope", credentials.scope.as_str()),
    ])
    .map_err(|e| CoreError::Decode(format!("token request: {}", e)))?;

    let response = http
        .post(&url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(form)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    trace!("Token endpoint answered {}", status);

    if !status.is_success() {
        return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => CoreError::Authentication {
                message: err.error_description.unwrap_or(err.error),
            },
            Err(_) if status.is_client_error() => CoreError::Authentication {
                message: format!("token endpoint returned {}", status),
            },
            Err(_) => CoreError::from_arm(status.as_u16(), None, body),
        });
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| CoreError::Decode(format!("token response: {}", e)))?;
    let lifetime = token
        .expires_in
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_LIFETIME);

    debug!("Acquired token valid for {}s", lifetime.as_secs());
    Ok(AccessToken::new(token.access_token, lifetime))
}
