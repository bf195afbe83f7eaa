//! `run`, `group` and `storage` arguments

use armctl_core::Region;
use armctl_core::arm::storage::{DEFAULT_KIND, DEFAULT_SKU};
use armctl_core::session::CleanupScope;
use clap::{Args, Subcommand};

use super::parse_region;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Region for the new resources (defaults to the profile's region, then westus)
    #[arg(long, value_parser = parse_region)]
    pub region: Option<Region>,

    /// Which resource groups cleanup deletes
    #[arg(long, value_enum, default_value = "all")]
    pub cleanup_scope: CleanupScope,

    /// Stop the cleanup pass at the first failed delete
    #[arg(long)]
    pub abort_on_delete_failure: bool,

    /// Do not wait for Enter before cleanup
    #[arg(long, short, conflicts_with = "wait")]
    pub yes: bool,

    /// Wait this many seconds instead of for Enter
    #[arg(long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// Use this resource group name instead of a random test_xxxx
    #[arg(long)]
    pub resource_group_name: Option<String>,

    /// Use this storage account name instead of a random testxxxx
    #[arg(long)]
    pub storage_account_name: Option<String>,

    /// Wait for Enter once more before exiting
    #[arg(long)]
    pub pause_on_exit: bool,
}

/// Resource group commands
#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// List resource groups in the subscription
    #[command(visible_alias = "ls")]
    List,

    /// Show one resource group
    #[command(visible_alias = "get")]
    Show {
        /// Resource group name
        name: String,
    },

    /// Create a resource group
    Create {
        /// Resource group name
        name: String,

        /// Region (defaults to the profile's region, then westus)
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,
    },

    /// Delete a resource group and everything in it
    #[command(visible_alias = "rm")]
    Delete {
        /// Resource group name
        name: String,

        /// Succeed when the group does not exist
        #[arg(long)]
        if_exists: bool,
    },
}

/// Storage account commands
#[derive(Subcommand, Debug)]
pub enum StorageCommands {
    /// List storage accounts in a resource group
    #[command(visible_alias = "ls")]
    List {
        /// Resource group name
        #[arg(long, short = 'g')]
        resource_group: String,
    },

    /// Create a storage account
    Create {
        /// Storage account name (3-24 lowercase letters and digits)
        name: String,

        /// Resource group to create it in
        #[arg(long, short = 'g')]
        resource_group: String,

        /// Region (defaults to the profile's region, then westus)
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,

        /// SKU name
        #[arg(long, default_value = DEFAULT_SKU)]
        sku: String,

        /// Account kind
        #[arg(long, default_value = DEFAULT_KIND)]
        kind: String,
    },

    /// Check whether a storage account name is available
    #[command(name = "check-name")]
    CheckName {
        /// Storage account name
        name: String,
    },
}
