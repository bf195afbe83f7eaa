//! # armctl-core
//!
//! Library behind the `armctl` CLI: profiles and credential resolution, a
//! small Azure Resource Manager client, and the provisioning session that
//! creates a resource group and storage account and then cleans up.
//!
//! ## Layout
//!
//! - [`config`] - TOML profiles, `AZURE_*` overrides, keyring references
//! - [`arm`] - token acquisition, resource groups, storage accounts
//! - [`progress`] - long-running operation polling
//! - [`session`] - provision, pause, guaranteed cleanup
//! - [`pause`] - the pause-for-signal seam
//! - [`names`] - random `test_xxxx` / `testxxxx` names
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use armctl_core::{ArmClient, Config, ProvisioningSession, SessionOptions};
//! use armctl_core::pause::Immediate;
//!
//! let config = Config::load()?;
//! let name = config.resolve_profile(None)?;
//! let credentials = config.profile(&name)?.resolve_credentials(true)?;
//! let client = ArmClient::authenticate(credentials).await?;
//!
//! let report = ProvisioningSession::new(Arc::new(client), SessionOptions::default())
//!     .run(&Immediate)
//!     .await;
//! ```

pub mod arm;
pub mod config;
pub mod error;
pub mod names;
pub mod pause;
pub mod progress;
pub mod region;
pub mod session;

pub use arm::{ArmClient, ArmClientBuilder, ResourceGroup, StorageAccount};
pub use config::{CloudEnvironment, Config, ConfigError, Profile, ServicePrincipal};
pub use error::{CoreError, Result};
pub use progress::{ProgressCallback, ProgressEvent};
pub use region::Region;
pub use session::{
    CleanupFailurePolicy, CleanupScope, ManagementApi, ProvisioningSession, SessionEvent,
    SessionOptions, SessionReport,
};
