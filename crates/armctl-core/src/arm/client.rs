//! Authenticated Azure Resource Manager client
//!
//! [`ArmClient`] owns the HTTP client, the service principal, and a cached
//! bearer token. It is cheap to clone; resource handlers take a clone.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};
use url::Url;

use super::auth::{AccessToken, REFRESH_MARGIN, request_token};
use super::subscriptions::SubscriptionHandler;
use crate::config::ServicePrincipal;
use crate::error::{CoreError, Result};

/// User agent sent when the caller sets none
const DEFAULT_USER_AGENT: &str = concat!("armctl-core/", env!("CARGO_PKG_VERSION"));

/// Default interval between long-running operation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default ceiling for a single long-running operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Authenticated client bound to one subscription
#[derive(Clone)]
pub struct ArmClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    credentials: ServicePrincipal,
    management_url: Url,
    subscription_id: String,
    token: Mutex<Option<AccessToken>>,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("management_url", &self.inner.management_url.as_str())
            .field("subscription_id", &self.inner.subscription_id)
            .finish()
    }
}

/// Builder for [`ArmClient`]
pub struct ArmClientBuilder {
    credentials: ServicePrincipal,
    user_agent: String,
    request_timeout: Option<Duration>,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl ArmClientBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Timeout for each individual HTTP request
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Poll interval for long-running operations without `Retry-After`
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Maximum time to wait for one long-running operation
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Acquire a token and settle on a subscription
    ///
    /// When the credentials carry no subscription id, the first enabled
    /// subscription visible to the identity is used.
    pub async fn authenticate(self) -> Result<ArmClient> {
        let mut http = reqwest::Client::builder().user_agent(self.user_agent.clone());
        if let Some(timeout) = self.request_timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        let management_url = Url::parse(&self.credentials.management_url)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", self.credentials.management_url, e)))?;

        let token = request_token(&http, &self.credentials).await?;
        info!("Authenticated client {}", self.credentials.client_id);

        let mut client = ArmClient {
            inner: Arc::new(Inner {
                http,
                subscription_id: self.credentials.subscription_id.clone().unwrap_or_default(),
                credentials: self.credentials,
                management_url,
                token: Mutex::new(Some(token)),
                poll_interval: self.poll_interval,
                operation_timeout: self.operation_timeout,
            }),
        };

        if client.inner.subscription_id.is_empty() {
            let subscription = SubscriptionHandler::new(client.clone())
                .default_subscription()
                .await?;
            info!(
                "Using default subscription {} ({})",
                subscription.subscription_id,
                subscription.display_name.as_deref().unwrap_or("unnamed")
            );
            client = client.with_subscription(subscription.subscription_id);
        }

        Ok(client)
    }
}

#[derive(Deserialize)]
struct ArmErrorResponse {
    error: ArmErrorBody,
}

#[derive(Deserialize)]
struct ArmErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// One page of an ARM list response
#[derive(Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default, rename = "nextLink")]
    pub next_link: Option<String>,
}

impl ArmClient {
    pub fn builder(credentials: ServicePrincipal) -> ArmClientBuilder {
        ArmClientBuilder {
            credentials,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Authenticate with default settings
    pub async fn authenticate(credentials: ServicePrincipal) -> Result<Self> {
        Self::builder(credentials).authenticate().await
    }

    /// Same connection and token, different subscription
    pub fn with_subscription(&self, subscription_id: impl Into<String>) -> Self {
        let inner = &self.inner;
        let token = inner.token.try_lock().ok().and_then(|t| t.clone());
        Self {
            inner: Arc::new(Inner {
                http: inner.http.clone(),
                credentials: inner.credentials.clone(),
                management_url: inner.management_url.clone(),
                subscription_id: subscription_id.into(),
                token: Mutex::new(token),
                poll_interval: inner.poll_interval,
                operation_timeout: inner.operation_timeout,
            }),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.inner.subscription_id
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    pub fn operation_timeout(&self) -> Duration {
        self.inner.operation_timeout
    }

    /// Build a management URL from path segments and an `api-version`
    pub(crate) fn url(&self, segments: &[&str], api_version: &str) -> Result<Url> {
        let mut url = self.inner.management_url.clone();
        url.path_segments_mut()
            .map_err(|_| CoreError::InvalidUrl(self.inner.management_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// URL under the bound subscription
    pub(crate) fn subscription_url(&self, segments: &[&str], api_version: &str) -> Result<Url> {
        let mut all = vec!["subscriptions", self.subscription_id()];
        all.extend_from_slice(segments);
        self.url(&all, api_version)
    }

    /// Current bearer token, refreshed when close to expiry
    async fn bearer(&self) -> Result<String> {
        let mut guard = self.inner.token.lock().await;
        if let Some(token) = guard.as_ref()
            && !token.expires_within(REFRESH_MARGIN)
        {
            return Ok(token.secret().to_string());
        }

        debug!("Refreshing management token");
        let token = request_token(&self.inner.http, &self.inner.credentials).await?;
        let secret = token.secret().to_string();
        *guard = Some(token);
        Ok(secret)
    }

    /// Send an authenticated request and return the raw response
    ///
    /// Non-success statuses are left to the caller.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Response> {
        trace!("{} {}", method, url);
        let bearer = self.bearer().await?;
        let mut request = self
            .inner
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer));
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Send a request and turn error statuses into [`CoreError`]
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Response> {
        let response = self.send(method, url, body).await?;
        Self::check(response).await
    }

    /// GET and decode JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.execute(Method::GET, url, None).await?;
        Self::decode(response).await
    }

    /// GET every page of a list, following `nextLink`
    pub(crate) async fn get_all<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(url).await?;
            items.extend(page.value);
            if let Some(link) = page.next_link.filter(|l| !l.is_empty()) {
                next = Some(
                    Url::parse(&link).map_err(|e| CoreError::InvalidUrl(format!("{}: {}", link, e)))?,
                );
            }
        }

        Ok(items)
    }

    /// Decode a JSON body
    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let url = response.url().clone();
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Decode(format!("{} {}: {}", url.path(), e, truncate(&bytes))))
    }

    /// Pass success through, classify everything else
    pub(crate) async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::error_from(status, response.text().await.unwrap_or_default()))
    }

    fn error_from(status: StatusCode, body: String) -> CoreError {
        match serde_json::from_str::<ArmErrorResponse>(&body) {
            Ok(ArmErrorResponse { error }) => CoreError::from_arm(
                status.as_u16(),
                error.code.as_deref(),
                error.message.unwrap_or_else(|| status.to_string()),
            ),
            Err(_) if body.trim().is_empty() => {
                CoreError::from_arm(status.as_u16(), None, status.to_string())
            }
            Err(_) => CoreError::from_arm(status.as_u16(), None, body),
        }
    }
}

/// Long-running operation URL from a 201/202 response
///
/// `Azure-AsyncOperation` wins over `Location`.
pub(crate) fn operation_url(headers: &HeaderMap) -> Option<String> {
    ["azure-asyncoperation", "location"]
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `Retry-After` in seconds, if present
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn truncate(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn async_operation_header_wins_over_location() {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("https://x/location"));
        assert_eq!(operation_url(&headers).as_deref(), Some("https://x/location"));

        headers.insert(
            "azure-asyncoperation",
            HeaderValue::from_static("https://x/async"),
        );
        assert_eq!(operation_url(&headers).as_deref(), Some("https://x/async"));
    }

    #[test]
    fn retry_after_parses_seconds_only() {
        let mut headers = HeaderMap::new();
        assert!(retry_after(&headers).is_none());

        headers.insert("retry-after", HeaderValue::from_static("15"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(15)));

        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert!(retry_after(&headers).is_none());
    }

    #[test]
    fn arm_error_body_is_classified() {
        let err = ArmClient::error_from(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":"ResourceGroupNotFound","message":"Resource group 'x' could not be found."}}"#
                .to_string(),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("could not be found"));
    }

    #[test]
    fn non_json_error_body_keeps_text() {
        let err = ArmClient::error_from(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert_eq!(err.to_string(), "Provider error (HTTP 502): upstream down");

        let empty = ArmClient::error_from(StatusCode::CONFLICT, String::new());
        assert!(empty.is_conflict());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let long = "x".repeat(500);
        let shown = truncate(long.as_bytes());
        assert_eq!(shown.len(), 203);
        assert!(shown.ends_with("..."));
    }
}
