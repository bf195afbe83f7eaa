//! Azure Resource Manager REST client
//!
//! [`ArmClient`] handles authentication, URL building and error
//! classification. Resource-specific calls live in the handlers, which each
//! wrap a clone of the client.

pub mod auth;
pub(crate) mod client;
pub mod resource_groups;
pub mod storage;
pub mod subscriptions;

pub use client::{ArmClient, ArmClientBuilder, DEFAULT_OPERATION_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use resource_groups::{ResourceGroup, ResourceGroupHandler};
pub use storage::{NameAvailability, StorageAccount, StorageAccountHandler, StorageAccountOptions};
pub use subscriptions::{Subscription, SubscriptionHandler};
