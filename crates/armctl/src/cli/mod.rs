//! CLI structure and command definitions
//!
//! `run` drives the whole provision-then-cleanup session. `group` and
//! `storage` expose the individual ARM operations, and `profile` manages
//! the stored service principals.

use armctl_core::{CloudEnvironment, Region};
use clap::{Parser, Subcommand};

pub mod resources;

pub use resources::*;

/// Azure Resource Manager demo CLI
#[derive(Parser, Debug)]
#[command(name = "armctl")]
#[command(
    version,
    about = "Azure management CLI: provision a resource group and storage account, then clean up"
)]
#[command(long_about = "
Azure management CLI: provision a resource group and storage account, then clean up

`armctl run` lists resource groups, creates a random test_xxxx group and a
testxxxx storage account, waits for Enter, and then deletes resource groups.
By default cleanup deletes EVERY resource group in the subscription.

EXAMPLES:
    # Store a service principal
    armctl profile set dev --client-id ID --tenant-id TENANT

    # Run the full session
    armctl run

    # Only delete what this run created, without waiting for Enter
    armctl run --cleanup-scope session --yes

    # Individual operations
    armctl group list -o json
    armctl storage check-name mystorage123

Credentials can also come from AZURE_CLIENT_ID, AZURE_CLIENT_SECRET,
AZURE_TENANT_ID and AZURE_SUBSCRIPTION_ID.

For more help on a specific command, run:
    armctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "ARMCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file (disables AZURE_* overrides)
    #[arg(long, global = true, env = "ARMCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Console lines for `run`, tables elsewhere
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List, create, pause, then delete resource groups
    #[command(after_help = "EXAMPLES:
    # Full session in the profile's region (westus by default)
    armctl run

    # Different region, keep pre-existing groups
    armctl run --region northeurope --cleanup-scope session

    # Stop the cleanup pass at the first failed delete
    armctl run --abort-on-delete-failure

    # Unattended: wait 30 seconds instead of for Enter, report as JSON
    armctl run --wait 30 -o json
")]
    Run(RunArgs),

    /// Resource group operations
    #[command(subcommand, visible_alias = "rg")]
    Group(GroupCommands),

    /// Storage account operations
    #[command(subcommand, visible_alias = "sa")]
    Storage(StorageCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile (secret will be prompted)
    armctl profile set dev --client-id ID --tenant-id TENANT

    # Pin a subscription and region
    armctl profile set dev --client-id ID --tenant-id TENANT \\
        --subscription-id SUB --region westeurope

    # List all profiles
    armctl profile list

    # Show profile details
    armctl profile show dev

    # Make a profile the default
    armctl profile default dev
")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Parse a region from an ARM location or display name
pub fn parse_region(s: &str) -> Result<Region, String> {
    s.parse().map_err(|e: armctl_core::region::UnknownRegion| e.to_string())
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// Application (client) id of the service principal
        #[arg(long)]
        client_id: String,

        /// Client secret (prompted when omitted)
        #[arg(long)]
        client_secret: Option<String>,

        /// Directory (tenant) id
        #[arg(long)]
        tenant_id: String,

        /// Subscription to use; the first enabled one is used when omitted
        #[arg(long)]
        subscription_id: Option<String>,

        /// Azure cloud
        #[arg(long, value_enum, default_value = "public")]
        environment: CloudEnvironment,

        /// Region for resources created by `run`
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,

        /// Override the token authority host
        #[arg(long)]
        authority_url: Option<String>,

        /// Override the management endpoint
        #[arg(long)]
        management_url: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,

        /// Store the client secret in the OS keyring instead of the config file
        #[cfg(feature = "secure-storage")]
        #[arg(long)]
        use_keyring: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use when --profile is not given
        name: String,
    },
}
