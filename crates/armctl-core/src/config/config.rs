//! Configuration management for armctl
//!
//! Profiles are stored in TOML, one per service principal. Values may
//! reference environment variables (`${VAR}` / `${VAR:-default}`) and
//! secrets may live in the OS keyring (`keyring:<key>`).

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::region::Region;

/// Environment variables that override profile values
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// A service principal and the cloud it authenticates against
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub client_id: String,
    /// Plaintext or `keyring:` reference
    pub client_secret: String,
    pub tenant_id: String,
    /// Subscription to operate on; the first enabled one is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub environment: CloudEnvironment,
    /// Override for the token authority host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_url: Option<String>,
    /// Override for the management endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_url: Option<String>,
    /// Region for resources created by `run`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// Azure clouds with distinct authority and management endpoints
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CloudEnvironment {
    #[default]
    Public,
    China,
    UsGovernment,
}

impl CloudEnvironment {
    pub fn authority_url(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://login.microsoftonline.com",
            CloudEnvironment::China => "https://login.chinacloudapi.cn",
            CloudEnvironment::UsGovernment => "https://login.microsoftonline.us",
        }
    }

    pub fn management_url(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://management.azure.com",
            CloudEnvironment::China => "https://management.chinacloudapi.cn",
            CloudEnvironment::UsGovernment => "https://management.usgovcloudapi.net",
        }
    }

    /// OAuth scope requested for management tokens
    pub fn scope(&self) -> String {
        format!("{}/.default", self.management_url())
    }
}

impl std::fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudEnvironment::Public => write!(f, "public"),
            CloudEnvironment::China => write!(f, "china"),
            CloudEnvironment::UsGovernment => write!(f, "us-government"),
        }
    }
}

/// Fully resolved credentials, ready to exchange for a token
#[derive(Clone, PartialEq)]
pub struct ServicePrincipal {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: Option<String>,
    pub authority_url: String,
    pub management_url: String,
    pub scope: String,
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("authority_url", &self.authority_url)
            .field("management_url", &self.management_url)
            .finish()
    }
}

impl Profile {
    /// Build a profile for the public cloud
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            subscription_id: None,
            environment: CloudEnvironment::Public,
            authority_url: None,
            management_url: None,
            region: None,
        }
    }

    /// Authority host, honouring the override
    pub fn authority_url(&self) -> &str {
        self.authority_url
            .as_deref()
            .unwrap_or_else(|| self.environment.authority_url())
    }

    /// Management endpoint, honouring the override
    pub fn management_url(&self) -> &str {
        self.management_url
            .as_deref()
            .unwrap_or_else(|| self.environment.management_url())
    }

    /// Resolve secrets (keyring lookups included)
    ///
    /// With `env_override` set, `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET`,
    /// `AZURE_TENANT_ID` and `AZURE_SUBSCRIPTION_ID` replace the stored values.
    pub fn resolve_credentials(&self, env_override: bool) -> Result<ServicePrincipal> {
        let store = CredentialStore::new();
        let env = |name: &'static str| env_override.then_some(name);

        let client_id = store
            .get_credential(&self.client_id, env(ENV_CLIENT_ID))
            .map_err(|e| ConfigError::CredentialError(format!("client id: {}", e)))?;
        let client_secret = store
            .get_credential(&self.client_secret, env(ENV_CLIENT_SECRET))
            .map_err(|e| ConfigError::CredentialError(format!("client secret: {}", e)))?;
        let tenant_id = store
            .get_credential(&self.tenant_id, env(ENV_TENANT_ID))
            .map_err(|e| ConfigError::CredentialError(format!("tenant id: {}", e)))?;
        let subscription_id = match env(ENV_SUBSCRIPTION_ID).and_then(|v| std::env::var(v).ok()) {
            Some(id) => Some(id),
            None => self.subscription_id.clone(),
        };

        Ok(ServicePrincipal {
            client_id,
            client_secret,
            tenant_id,
            subscription_id,
            authority_url: self.authority_url().trim_end_matches('/').to_string(),
            management_url: self.management_url().trim_end_matches('/').to_string(),
            scope: self.environment.scope(),
        })
    }

    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.trim().is_empty() {
            missing.push("client_id");
        }
        if self.client_secret.trim().is_empty() {
            missing.push("client_secret");
        }
        if self.tenant_id.trim().is_empty() {
            missing.push("tenant_id");
        }
        missing
    }
}

impl ServicePrincipal {
    /// Fail with [`ConfigError::MissingField`] if any required value is blank
    pub fn ensure_complete(&self, profile: &str) -> Result<()> {
        let missing: Vec<&str> = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("tenant_id", &self.tenant_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingField {
                profile: profile.to_string(),
                fields: missing.join(", "),
            })
        }
    }

    /// Credentials taken purely from `AZURE_*` environment variables
    ///
    /// Returns `None` unless client id, secret and tenant are all set.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var(ENV_CLIENT_ID).ok()?;
        let client_secret = std::env::var(ENV_CLIENT_SECRET).ok()?;
        let tenant_id = std::env::var(ENV_TENANT_ID).ok()?;
        let environment = CloudEnvironment::Public;

        Some(Self {
            client_id,
            client_secret,
            tenant_id,
            subscription_id: std::env::var(ENV_SUBSCRIPTION_ID).ok(),
            authority_url: environment.authority_url().to_string(),
            management_url: environment.management_url().to_string(),
            scope: environment.scope(),
        })
    }
}

impl Config {
    /// Pick the profile name to use
    ///
    /// Order: explicit name, `default_profile`, then the first profile by name.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            return Ok(name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| (*name).clone())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'armctl profile set' to create a profile.".to_string(),
            })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path; a missing file yields the default
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Path to the configuration file
    ///
    /// macOS prefers `~/.config/armctl/config.toml` when it (or its directory)
    /// exists, like Linux; otherwise the platform config directory is used.
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("armctl")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path.parent().is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "armctl", "armctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left untouched so that profiles
    /// which are not in use do not fail to load.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_profile() -> Profile {
        Profile {
            subscription_id: Some("00000000-0000-0000-0000-000000000001".to_string()),
            region: Some(Region::WestUs),
            ..Profile::new("app-id", "app-secret", "tenant")
        }
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let mut config = Config::default();
        config.set_profile("demo".to_string(), sample_profile());
        config.default_profile = Some("demo".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("demo"));
        assert_eq!(deserialized.profiles.get("demo"), Some(&sample_profile()));
    }

    #[test]
    fn minimal_profile_gets_public_cloud_defaults() {
        let content = r#"
[profiles.min]
client_id = "id"
client_secret = "secret"
tenant_id = "tenant"
"#;
        let config: Config = toml::from_str(content).unwrap();
        let profile = config.profile("min").unwrap();

        assert_eq!(profile.environment, CloudEnvironment::Public);
        assert_eq!(profile.authority_url(), "https://login.microsoftonline.com");
        assert_eq!(profile.management_url(), "https://management.azure.com");
        assert!(profile.subscription_id.is_none());
        assert!(profile.region.is_none());
    }

    #[test]
    fn environment_and_overrides_parse() {
        let content = r#"
[profiles.gov]
client_id = "id"
client_secret = "secret"
tenant_id = "tenant"
environment = "us-government"
management_url = "http://127.0.0.1:8080/"
region = "eastus"
"#;
        let config: Config = toml::from_str(content).unwrap();
        let profile = config.profile("gov").unwrap();

        assert_eq!(profile.environment, CloudEnvironment::UsGovernment);
        assert_eq!(profile.authority_url(), "https://login.microsoftonline.us");
        assert_eq!(profile.management_url(), "http://127.0.0.1:8080/");
        assert_eq!(profile.region, Some(Region::EastUs));

        let sp = profile.resolve_credentials(false).unwrap();
        assert_eq!(sp.management_url, "http://127.0.0.1:8080");
        assert_eq!(sp.scope, "https://management.usgovcloudapi.net/.default");
    }

    #[test]
    fn resolve_profile_prefers_explicit_then_default_then_first() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), sample_profile());
        config.set_profile("alpha".to_string(), sample_profile());

        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");
    }

    #[test]
    fn resolve_profile_without_profiles_suggests_setup() {
        let err = Config::default().resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("armctl profile set"));
    }

    #[test]
    fn unknown_profile_is_reported_by_name() {
        let err = Config::default().profile("nope").unwrap_err();
        assert_eq!(err.to_string(), "Profile 'nope' not found");
    }

    #[test]
    fn remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("demo".to_string(), sample_profile());
        config.default_profile = Some("demo".to_string());

        assert!(config.remove_profile("demo").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn missing_fields_lists_blank_values() {
        let profile = Profile::new("", "secret", " ");
        assert_eq!(profile.missing_fields(), vec!["client_id", "tenant_id"]);
        assert!(sample_profile().missing_fields().is_empty());
    }

    #[test]
    fn blank_secret_fails_completeness_check() {
        let sp = Profile::new("app-id", "", "tenant")
            .resolve_credentials(false)
            .unwrap();
        match sp.ensure_complete("dev").unwrap_err() {
            ConfigError::MissingField { profile, fields } => {
                assert_eq!(profile, "dev");
                assert_eq!(fields, "client_secret");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let complete = sample_profile().resolve_credentials(false).unwrap();
        assert!(complete.ensure_complete("dev").is_ok());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let sp = sample_profile().resolve_credentials(false).unwrap();
        let rendered = format!("{:?}", sp);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("app-secret"));
    }

    #[test]
    #[serial_test::serial]
    fn env_override_replaces_profile_values() {
        unsafe {
            std::env::set_var(ENV_CLIENT_SECRET, "env-secret");
            std::env::set_var(ENV_SUBSCRIPTION_ID, "env-sub");
        }

        let profile = sample_profile();
        let with_env = profile.resolve_credentials(true).unwrap();
        let without_env = profile.resolve_credentials(false).unwrap();

        assert_eq!(with_env.client_secret, "env-secret");
        assert_eq!(with_env.subscription_id.as_deref(), Some("env-sub"));
        assert_eq!(with_env.client_id, "app-id");
        assert_eq!(without_env.client_secret, "app-secret");

        unsafe {
            std::env::remove_var(ENV_CLIENT_SECRET);
            std::env::remove_var(ENV_SUBSCRIPTION_ID);
        }
    }

    #[test]
    #[serial_test::serial]
    fn env_var_expansion_with_defaults() {
        unsafe {
            std::env::set_var("ARMCTL_TEST_TENANT", "expanded-tenant");
            std::env::remove_var("ARMCTL_TEST_MISSING");
        }

        let content = r#"
[profiles.env]
client_id = "${ARMCTL_TEST_MISSING:-fallback-id}"
client_secret = "static"
tenant_id = "${ARMCTL_TEST_TENANT}"
"#;
        let expanded = Config::expand_env_vars(content);
        let config: Config = toml::from_str(&expanded).unwrap();
        let profile = config.profile("env").unwrap();

        assert_eq!(profile.client_id, "fallback-id");
        assert_eq!(profile.tenant_id, "expanded-tenant");

        unsafe {
            std::env::remove_var("ARMCTL_TEST_TENANT");
        }
    }

    #[test]
    #[serial_test::serial]
    fn from_env_requires_all_three_values() {
        unsafe {
            std::env::set_var(ENV_CLIENT_ID, "id");
            std::env::set_var(ENV_CLIENT_SECRET, "secret");
            std::env::remove_var(ENV_TENANT_ID);
        }
        assert!(ServicePrincipal::from_env().is_none());

        unsafe {
            std::env::set_var(ENV_TENANT_ID, "tenant");
        }
        let sp = ServicePrincipal::from_env().unwrap();
        assert_eq!(sp.tenant_id, "tenant");
        assert_eq!(sp.management_url, "https://management.azure.com");

        unsafe {
            std::env::remove_var(ENV_CLIENT_ID);
            std::env::remove_var(ENV_CLIENT_SECRET);
            std::env::remove_var(ENV_TENANT_ID);
        }
    }
}
