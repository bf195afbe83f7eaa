//! The provisioning session
//!
//! A session lists resource groups, creates a randomly named group and a
//! storage account inside it, pauses, and then cleans up. Cleanup runs on
//! every exit path of [`ProvisioningSession::run`]: after success, after a
//! failed create, and after cancellation.
//!
//! # Cleanup breadth
//!
//! With [`CleanupScope::All`] (the default) cleanup deletes **every**
//! resource group the identity can see, not just the ones this session
//! created. [`CleanupScope::Session`] narrows it to the session's own groups.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use armctl_core::pause::Immediate;
//! use armctl_core::session::{ProvisioningSession, SessionOptions};
//!
//! let session = ProvisioningSession::new(Arc::new(client), SessionOptions::default());
//! let report = session.run(&Immediate).await;
//! assert!(report.failures.is_empty());
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::arm::{ArmClient, ResourceGroup, ResourceGroupHandler, StorageAccount, StorageAccountHandler};
use crate::error::{CoreError, Result};
use crate::names;
use crate::pause::{Pause, PauseOutcome};
use crate::region::Region;

pub const DEFAULT_PROMPT: &str = "Press Enter to delete resource groups...";

/// The management operations a session needs
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>>;

    async fn create_resource_group(&self, name: &str, region: Region) -> Result<ResourceGroup>;

    async fn create_storage_account(
        &self,
        resource_group: &str,
        name: &str,
        region: Region,
    ) -> Result<StorageAccount>;

    /// Returns [`CoreError::NotFound`] when the group does not exist
    async fn delete_resource_group(&self, name: &str) -> Result<()>;
}

#[async_trait]
impl ManagementApi for ArmClient {
    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        ResourceGroupHandler::new(self.clone()).list().await
    }

    async fn create_resource_group(&self, name: &str, region: Region) -> Result<ResourceGroup> {
        ResourceGroupHandler::new(self.clone()).create(name, region).await
    }

    async fn create_storage_account(
        &self,
        resource_group: &str,
        name: &str,
        region: Region,
    ) -> Result<StorageAccount> {
        StorageAccountHandler::new(self.clone())
            .create(resource_group, name, region)
            .await
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        ResourceGroupHandler::new(self.clone()).delete(name).await
    }
}

/// Which groups cleanup deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CleanupScope {
    /// Every resource group in the subscription
    #[default]
    All,
    /// Only groups this session created
    Session,
}

/// What a failed delete does to the rest of the cleanup pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupFailurePolicy {
    /// Report the failure and keep deleting
    #[default]
    Continue,
    /// Stop the pass at the first failure
    AbortPass,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub region: Region,
    pub scope: CleanupScope,
    pub failure_policy: CleanupFailurePolicy,
    /// Fixed names instead of random ones
    pub resource_group_name: Option<String>,
    pub storage_account_name: Option<String>,
    pub prompt: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            region: Region::default(),
            scope: CleanupScope::default(),
            failure_policy: CleanupFailurePolicy::default(),
            resource_group_name: None,
            storage_account_name: None,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

/// Step of the session a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    ListGroups,
    CreateResourceGroup,
    CreateStorageAccount,
    Pause,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::ListGroups => "list resource groups",
            Stage::CreateResourceGroup => "create resource group",
            Stage::CreateStorageAccount => "create storage account",
            Stage::Pause => "pause",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}

/// Something that happened during a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Listing,
    GroupListed { name: String, location: String },
    NoGroups,
    GroupCreated { name: String },
    StorageAccountCreated { name: String },
    Paused { prompt: String },
    Cancelled,
    CleanupStarted { scope: CleanupScope },
    GroupDeleted { name: String },
    /// Delete target was already missing; counts as deleted
    GroupAlreadyGone { name: String },
    Failed { stage: Stage, message: String },
}

pub type EventCallback = Box<dyn Fn(SessionEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Outcome of [`ProvisioningSession::run`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    /// Groups present before anything was created
    pub listed: Vec<String>,
    pub resource_group: Option<String>,
    pub storage_account: Option<String>,
    pub deleted: Vec<String>,
    pub already_gone: Vec<String>,
    pub failures: Vec<StageFailure>,
    pub cancelled: bool,
}

impl SessionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, stage: Stage, message: String) {
        self.failures.push(StageFailure { stage, message });
    }
}

/// Resource groups the session created and has not yet deleted
///
/// Dropping a guard that still holds groups logs a warning naming them.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    groups: Vec<String>,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.groups.push(name.into());
    }

    /// Forget a group once it is gone
    pub fn release(&mut self, name: &str) {
        self.groups.retain(|g| g != name);
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.groups.is_empty() {
            warn!(
                "Resource groups created by this session were not deleted: {}",
                self.groups.join(", ")
            );
        }
    }
}

/// Provision-then-cleanup workflow against a [`ManagementApi`]
pub struct ProvisioningSession {
    api: Arc<dyn ManagementApi>,
    options: SessionOptions,
    on_event: Option<EventCallback>,
    cancel: CancellationToken,
}

impl ProvisioningSession {
    pub fn new(api: Arc<dyn ManagementApi>, options: SessionOptions) -> Self {
        Self {
            api,
            options,
            on_event: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, on_event: EventCallback) -> Self {
        self.on_event = Some(on_event);
        self
    }

    /// Cancelling `token` abandons provisioning; cleanup still runs
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Provision, pause, then clean up
    ///
    /// Errors are reported through events and collected in the report;
    /// they never skip cleanup.
    pub async fn run(&self, pause: &dyn Pause) -> SessionReport {
        let mut report = SessionReport::default();
        let mut guard = CleanupGuard::new();

        let provisioned = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(None),
            result = self.provision(pause, &mut guard, &mut report) => result,
        };

        match provisioned {
            Ok(PauseOutcome::Continue) => {}
            Ok(PauseOutcome::Cancelled) | Err(None) => {
                info!("Session cancelled; cleaning up");
                report.cancelled = true;
                self.emit(SessionEvent::Cancelled);
            }
            Err(Some(failure)) => {
                error!("{} failed: {}", failure.stage, failure.message);
                self.emit(SessionEvent::Failed {
                    stage: failure.stage,
                    message: failure.message.clone(),
                });
                report.failures.push(failure);
            }
        }

        self.cleanup(&mut guard, &mut report).await;
        report
    }

    /// List, create both resources, then pause
    ///
    /// `Err(None)` is never produced here; it marks cancellation in `run`.
    async fn provision(
        &self,
        pause: &dyn Pause,
        guard: &mut CleanupGuard,
        report: &mut SessionReport,
    ) -> std::result::Result<PauseOutcome, Option<StageFailure>> {
        let failed = |stage: Stage| {
            move |e: CoreError| {
                Some(StageFailure {
                    stage,
                    message: e.to_string(),
                })
            }
        };

        let group_name = self
            .options
            .resource_group_name
            .clone()
            .unwrap_or_else(names::resource_group_name);
        let account_name = self
            .options
            .storage_account_name
            .clone()
            .unwrap_or_else(names::storage_account_name);

        self.emit(SessionEvent::Listing);
        let groups = self
            .api
            .list_resource_groups()
            .await
            .map_err(failed(Stage::ListGroups))?;
        if groups.is_empty() {
            self.emit(SessionEvent::NoGroups);
        }
        for group in groups {
            report.listed.push(group.name.clone());
            self.emit(SessionEvent::GroupListed {
                name: group.name,
                location: group.location,
            });
        }

        // Registered before the request: a cancelled create may still land.
        let region = self.options.region;
        guard.register(group_name.clone());
        let group = match self.api.create_resource_group(&group_name, region).await {
            Ok(group) => group,
            Err(e) => {
                if matches!(e, CoreError::ResourceConflict { .. }) {
                    // Existed before this session; never ours to delete
                    guard.release(&group_name);
                }
                return Err(failed(Stage::CreateResourceGroup)(e));
            }
        };
        report.resource_group = Some(group.name.clone());
        self.emit(SessionEvent::GroupCreated {
            name: group.name.clone(),
        });

        let account = self
            .api
            .create_storage_account(&group.name, &account_name, region)
            .await
            .map_err(failed(Stage::CreateStorageAccount))?;
        report.storage_account = Some(account.name.clone());
        self.emit(SessionEvent::StorageAccountCreated { name: account.name });

        self.emit(SessionEvent::Paused {
            prompt: self.options.prompt.clone(),
        });
        Ok(pause.wait(&self.options.prompt).await)
    }

    /// Delete groups according to the scope and failure policy
    async fn cleanup(&self, guard: &mut CleanupGuard, report: &mut SessionReport) {
        let scope = self.options.scope;
        self.emit(SessionEvent::CleanupStarted { scope });

        let targets = match scope {
            CleanupScope::Session => guard.groups().to_vec(),
            CleanupScope::All => match self.api.list_resource_groups().await {
                Ok(groups) => groups.into_iter().map(|g| g.name).collect(),
                Err(e) => {
                    self.record_cleanup_failure(report, e);
                    return;
                }
            },
        };
        info!("Cleanup ({:?}) targets {} group(s)", scope, targets.len());

        for name in targets {
            match self.delete_group(&name).await {
                Ok(true) => {
                    guard.release(&name);
                    report.deleted.push(name.clone());
                    self.emit(SessionEvent::GroupDeleted { name });
                }
                Ok(false) => {
                    guard.release(&name);
                    report.already_gone.push(name.clone());
                    self.emit(SessionEvent::GroupAlreadyGone { name });
                }
                Err(e) => {
                    self.record_cleanup_failure(report, e);
                    if self.options.failure_policy == CleanupFailurePolicy::AbortPass {
                        warn!("Aborting cleanup pass after failed delete of {}", name);
                        break;
                    }
                }
            }
        }
    }

    /// Delete one group; `Ok(false)` when it was already gone
    pub async fn delete_group(&self, name: &str) -> Result<bool> {
        match self.api.delete_resource_group(name).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                info!("Resource group {} already gone", name);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn record_cleanup_failure(&self, report: &mut SessionReport, e: CoreError) {
        let message = e.to_string();
        error!("Cleanup failed: {}", message);
        self.emit(SessionEvent::Failed {
            stage: Stage::Cleanup,
            message: message.clone(),
        });
        report.fail(Stage::Cleanup, message);
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(cb) = &self.on_event {
            cb(event);
        }
    }
}
