//! Storage account operations
//!
//! Storage account names are global across Azure, so creation checks name
//! availability before it sends the PUT.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::client::{ArmClient, operation_url};
use crate::error::{CoreError, Result};
use crate::progress::{ProgressCallback, wait_for_operation};
use crate::region::Region;

const API_VERSION: &str = "2023-01-01";
const RESOURCE_TYPE: &str = "Microsoft.Storage/storageAccounts";

pub const DEFAULT_SKU: &str = "Standard_LRS";
pub const DEFAULT_KIND: &str = "StorageV2";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_location: Option<String>,
}

/// A storage account as returned by ARM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageAccount {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub sku: Option<Sku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<StorageAccountProperties>,
}

impl StorageAccount {
    /// Name of the owning resource group, taken from the resource id
    pub fn resource_group(&self) -> Option<&str> {
        let mut parts = self.id.split('/');
        while let Some(part) = parts.next() {
            if part.eq_ignore_ascii_case("resourceGroups") {
                return parts.next().filter(|s| !s.is_empty());
            }
        }
        None
    }

    pub fn region(&self) -> Option<Region> {
        self.location.parse().ok()
    }

    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
    }
}

/// Result of a global name check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NameAvailability {
    pub name_available: bool,
    /// `AccountNameInvalid` or `AlreadyExists`
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// SKU and kind for a new account
#[derive(Debug, Clone, PartialEq)]
pub struct StorageAccountOptions {
    pub sku: String,
    pub kind: String,
}

impl Default for StorageAccountOptions {
    fn default() -> Self {
        Self {
            sku: DEFAULT_SKU.to_string(),
            kind: DEFAULT_KIND.to_string(),
        }
    }
}

/// Handler for storage account operations
pub struct StorageAccountHandler {
    client: ArmClient,
}

impl StorageAccountHandler {
    pub fn new(client: ArmClient) -> Self {
        Self { client }
    }

    pub async fn check_name_availability(&self, name: &str) -> Result<NameAvailability> {
        let url = self.client.subscription_url(
            &["providers", "Microsoft.Storage", "checkNameAvailability"],
            API_VERSION,
        )?;
        let body = json!({ "name": name, "type": RESOURCE_TYPE });
        let response = self.client.execute(Method::POST, url, Some(&body)).await?;
        ArmClient::decode(response).await
    }

    /// Create a `StorageV2`/`Standard_LRS` account
    pub async fn create(
        &self,
        resource_group: &str,
        name: &str,
        region: Region,
    ) -> Result<StorageAccount> {
        self.create_with_options(resource_group, name, region, &StorageAccountOptions::default(), None)
            .await
    }

    /// Create an account and wait for provisioning to finish
    ///
    /// Fails with [`CoreError::NameUnavailable`] when the name is taken or
    /// invalid, before anything is created.
    pub async fn create_with_options(
        &self,
        resource_group: &str,
        name: &str,
        region: Region,
        options: &StorageAccountOptions,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<StorageAccount> {
        let availability = self.check_name_availability(name).await?;
        if !availability.name_available {
            return Err(CoreError::NameUnavailable {
                message: availability.message.unwrap_or_else(|| {
                    format!(
                        "Storage account name '{}' is not available ({})",
                        name,
                        availability.reason.as_deref().unwrap_or("unknown reason")
                    )
                }),
            });
        }

        let url = self.account_url(resource_group, name)?;
        let body = json!({
            "sku": { "name": options.sku },
            "kind": options.kind,
            "location": region.name(),
        });
        let response = self.client.execute(Method::PUT, url, Some(&body)).await?;

        if response.status() == StatusCode::ACCEPTED {
            if let Some(operation) = operation_url(response.headers()) {
                wait_for_operation(
                    &self.client,
                    &operation,
                    self.client.operation_timeout(),
                    self.client.poll_interval(),
                    on_progress,
                )
                .await?;
            }
            let account = self.get(resource_group, name).await?;
            info!("Created storage account {} in {}", account.name, resource_group);
            return Ok(account);
        }

        let account: StorageAccount = ArmClient::decode(response).await?;
        info!("Created storage account {} in {}", account.name, resource_group);
        Ok(account)
    }

    pub async fn get(&self, resource_group: &str, name: &str) -> Result<StorageAccount> {
        let url = self.account_url(resource_group, name)?;
        self.client.get_json(url).await
    }

    pub async fn list_by_resource_group(&self, resource_group: &str) -> Result<Vec<StorageAccount>> {
        let url = self.client.subscription_url(
            &[
                "resourceGroups",
                resource_group,
                "providers",
                "Microsoft.Storage",
                "storageAccounts",
            ],
            API_VERSION,
        )?;
        let accounts: Vec<StorageAccount> = self.client.get_all(url).await?;
        debug!("{} storage account(s) in {}", accounts.len(), resource_group);
        Ok(accounts)
    }

    fn account_url(&self, resource_group: &str, name: &str) -> Result<url::Url> {
        self.client.subscription_url(
            &[
                "resourceGroups",
                resource_group,
                "providers",
                "Microsoft.Storage",
                "storageAccounts",
                name,
            ],
            API_VERSION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_group_comes_from_id() {
        let account: StorageAccount = serde_json::from_str(
            r#"{
                "id": "/subscriptions/s/resourceGroups/test_ab12/providers/Microsoft.Storage/storageAccounts/testcd34",
                "name": "testcd34",
                "location": "westus",
                "kind": "StorageV2",
                "sku": { "name": "Standard_LRS", "tier": "Standard" },
                "properties": { "provisioningState": "Succeeded" }
            }"#,
        )
        .unwrap();

        assert_eq!(account.resource_group(), Some("test_ab12"));
        assert_eq!(account.region(), Some(Region::WestUs));
        assert_eq!(account.provisioning_state(), Some("Succeeded"));
        assert_eq!(account.sku.unwrap().name, "Standard_LRS");
    }

    #[test]
    fn missing_id_has_no_resource_group() {
        let account: StorageAccount =
            serde_json::from_str(r#"{"name":"x","location":"westus"}"#).unwrap();
        assert_eq!(account.resource_group(), None);
    }

    #[test]
    fn default_options() {
        let options = StorageAccountOptions::default();
        assert_eq!(options.sku, "Standard_LRS");
        assert_eq!(options.kind, "StorageV2");
    }

    #[test]
    fn name_availability_payload() {
        let taken: NameAvailability = serde_json::from_str(
            r#"{"nameAvailable":false,"reason":"AlreadyExists","message":"The storage account named testab12 is already taken."}"#,
        )
        .unwrap();
        assert!(!taken.name_available);
        assert_eq!(taken.reason.as_deref(), Some("AlreadyExists"));
    }
}
