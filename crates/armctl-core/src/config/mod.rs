//! Configuration and profile management
//!
//! A profile holds one service principal (client id, secret, tenant) plus
//! the cloud environment and subscription it targets.
//!
//! # Features
//!
//! - Multiple named profiles with a default
//! - Secure secret storage using the OS keyring (optional)
//! - Environment variable expansion in config files
//! - `AZURE_*` environment overrides
//! - Platform-specific config file locations

// The nested `config::config` module is intentional
#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;

pub use config::{CloudEnvironment, Config, Profile, ServicePrincipal};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
