//! Resource group operations

use std::collections::HashMap;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::client::{ArmClient, operation_url};
use crate::error::{CoreError, Result};
use crate::progress::{ProgressCallback, wait_for_operation};
use crate::region::Region;

const API_VERSION: &str = "2021-04-01";

/// A named container for resources within a subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceGroup {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// ARM location name
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

impl ResourceGroup {
    /// Region, when the location is one [`Region`] knows
    pub fn region(&self) -> Option<Region> {
        self.location.parse().ok()
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
    }
}

/// Handler for resource group operations
pub struct ResourceGroupHandler {
    client: ArmClient,
}

impl ResourceGroupHandler {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    /// Snapshot of every resource group in the subscription
    ///
    /// Follows `nextLink`; an empty subscription yields an empty vector.
    pub async fn list(&self) -> Result<Vec<ResourceGroup>> {
        let url = self.client.subscription_url(&["resourcegroups"], API_VERSION)?;
        let groups: Vec<ResourceGroup> = self.client.get_all(url).await?;
        debug!("Listed {} resource group(s)", groups.len());
        Ok(groups)
    }

    /// Fetch one resource group
    pub async fn get(&self, name: &str) -> Result<ResourceGroup> {
        let url = self
            .client
            .subscription_url(&["resourcegroups", name], API_VERSION)?;
        self.client.get_json(url).await
    }

    /// True when a group with this name exists
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let url = self
            .client
            .subscription_url(&["resourcegroups", name], API_VERSION)?;
        let response = self.client.send(Method::HEAD, url, None).await?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => ArmClient::check(response).await.map(|_| true),
        }
    }

    /// Create a resource group
    ///
    /// ARM's PUT would silently update an existing group, so existence is
    /// checked first and reported as [`CoreError::ResourceConflict`].
    pub async fn create(&self, name: &str, region: Region) -> Result<ResourceGroup> {
        if self.exists(name).await? {
            return Err(CoreError::ResourceConflict {
                message: format!("Resource group '{}' already exists", name),
            });
        }

        let url = self
            .client
            .subscription_url(&["resourcegroups", name], API_VERSION)?;
        let body = json!({ "location": region.name() });
        let response = self.client.execute(Method::PUT, url, Some(&body)).await?;
        let group: ResourceGroup = ArmClient::decode(response).await?;

        info!("Created resource group {} in {}", group.name, group.location);
        Ok(group)
    }

    /// Delete a resource group and wait for the deletion to finish
    ///
    /// A missing group yields [`CoreError::NotFound`].
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.delete_with_progress(name, None).await
    }

    /// [`delete`](Self::delete) with progress updates while ARM works
    pub async fn delete_with_progress(
        &self,
        name: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<()> {
        let url = self
            .client
            .subscription_url(&["resourcegroups", name], API_VERSION)?;
        let response = self.client.execute(Method::DELETE, url, None).await?;

        if response.status() == StatusCode::ACCEPTED {
            match operation_url(response.headers()) {
                Some(operation) => {
                    wait_for_operation(
                        &self.client,
                        &operation,
                        self.client.operation_timeout(),
                        self.client.poll_interval(),
                        on_progress,
                    )
                    .await?
                }
                None => debug!("Delete of {} accepted without an operation URL", name),
            }
        }

        info!("Deleted resource group {}", name);
        Ok(())
    }
}
