//! Subscription discovery

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::ArmClient;
use crate::error::{CoreError, Result};

const API_VERSION: &str = "2022-12-01";

/// A subscription visible to the authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Subscription {
    pub fn is_enabled(&self) -> bool {
        self.state
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("enabled"))
    }
}

/// Handler for subscription listing
pub struct SubscriptionHandler {
    client: ArmClient,
}

impl SubscriptionHandler {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// All subscriptions visible to the identity
    pub async fn list(&self) -> Result<Vec<Subscription>> {
        let url = self.client.url(&["subscriptions"], API_VERSION)?;
        self.client.get_all(url).await
    }

    /// First enabled subscription
    pub async fn default_subscription(&self) -> Result<Subscription> {
        let subscriptions = self.list().await?;
        debug!("Identity can see {} subscription(s)", subscriptions.len());
        subscriptions
            .into_iter()
            .find(Subscription::is_enabled)
            .ok_or(CoreError::NoSubscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_counts_as_enabled() {
        let sub: Subscription =
            serde_json::from_str(r#"{"subscriptionId":"abc","displayName":"Dev"}"#).unwrap();
        assert!(sub.is_enabled());

        let disabled: Subscription =
            serde_json::from_str(r#"{"subscriptionId":"abc","state":"Disabled"}"#).unwrap();
        assert!(!disabled.is_enabled());
    }
}
