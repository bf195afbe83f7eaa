//! Connection management: profile or environment to an authenticated client

use crate::error::{ArmCtlError, Result as CliResult};
use anyhow::Context;
use armctl_core::config::ServicePrincipal;
use armctl_core::{ArmClient, Config, Region};
use tracing::{debug, info, trace};

/// User agent string for armctl HTTP requests
const ARMCTL_USER_AGENT: &str = concat!("armctl/", env!("CARGO_PKG_VERSION"));

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Environment variables apply unless --config-file was given
    fn use_env_vars(&self) -> bool {
        self.config_path.is_none()
    }

    /// Resolve service principal credentials
    ///
    /// With no profiles configured, complete `AZURE_*` variables are used on
    /// their own. Otherwise the resolved profile is used and, unless
    /// --config-file was given, `AZURE_*` variables override its values.
    pub fn resolve_credentials(&self, profile_name: Option<&str>) -> CliResult<ServicePrincipal> {
        let use_env_vars = self.use_env_vars();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        if profile_name.is_none()
            && self.config.profiles.is_empty()
            && use_env_vars
            && let Some(credentials) = ServicePrincipal::from_env()
        {
            info!("Using service principal from AZURE_* environment variables");
            return Ok(credentials);
        }

        let name = self.config.resolve_profile(profile_name)?;
        info!("Using profile: {}", name);
        let profile = self.config.profile(&name)?;
        trace!("Profile environment: {}", profile.environment);

        let credentials = profile.resolve_credentials(use_env_vars)?;
        credentials.ensure_complete(&name)?;

        Ok(credentials)
    }

    /// Region for new resources: explicit flag, then the profile, then westus
    pub fn region(&self, profile_name: Option<&str>, explicit: Option<Region>) -> Region {
        explicit
            .or_else(|| {
                let name = self.config.resolve_profile(profile_name).ok()?;
                self.config.profile(&name).ok()?.region
            })
            .unwrap_or_default()
    }

    /// Authenticate and return a client bound to a subscription
    pub async fn create_client(&self, profile_name: Option<&str>) -> CliResult<ArmClient> {
        debug!("Creating ARM client");
        let credentials = self.resolve_credentials(profile_name)?;
        trace!("Credentials: {:?}", credentials);

        let client = ArmClient::builder(credentials)
            .user_agent(ARMCTL_USER_AGENT)
            .authenticate()
            .await?;
        info!("Using subscription {}", client.subscription_id());
        Ok(client)
    }
}
