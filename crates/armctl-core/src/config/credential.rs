//! Secret resolution for service principal credentials
//!
//! A secret stored in a profile is one of:
//! - a plaintext value
//! - a `keyring:<key>` reference into the OS keyring (needs `secure-storage`)
//!
//! Either form can be overridden by an environment variable at lookup time.

use super::error::{ConfigError, Result};
use std::env;

/// Prefix marking a value that lives in the OS keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "armctl";

/// Where newly stored secrets go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    /// OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Written into the config file as-is
    Plaintext,
}

/// Resolves and stores secrets referenced from profiles
#[derive(Debug, Clone)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Pick the keyring when the feature is on and a keyring answers, plaintext otherwise
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            let storage = if keyring::Entry::new(SERVICE_NAME, "__probe__").is_ok() {
                CredentialStorage::Keyring
            } else {
                CredentialStorage::Plaintext
            };
            Self { storage }
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Self::plaintext()
        }
    }

    /// A store that never touches the keyring
    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    /// Backend used by [`store_credential`](Self::store_credential)
    pub fn storage(&self) -> CredentialStorage {
        self.storage
    }

    /// Store a secret and return the string to write into the config file
    pub fn store_credential(&self, key: &str, value: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                entry.set_password(value).map_err(|e| {
                    ConfigError::KeyringError(format!("Failed to store '{}' in keyring: {}", key, e))
                })?;
                Ok(format!("{}{}", KEYRING_PREFIX, key))
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(value.to_string())
            }
        }
    }

    /// Resolve a stored value to the actual secret
    ///
    /// Resolution order:
    /// 1. `env_var`, if given and set
    /// 2. keyring lookup for `keyring:` references
    /// 3. the value itself
    pub fn get_credential(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            return Ok(env_value);
        }

        let Some(key) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, key)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            entry.get_password().map_err(|e| {
                ConfigError::KeyringError(format!(
                    "Failed to read '{}' from keyring: {}",
                    key, e
                ))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "'{}' references the keyring but armctl was built without secure-storage",
                key
            )))
        }
    }

    /// Remove a keyring entry; missing entries are not an error
    pub fn delete_credential(&self, key: &str) -> Result<()> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                    Err(e) => Err(ConfigError::KeyringError(e.to_string())),
                }
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(())
            }
        }
    }

    /// True for `keyring:` references
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_value_is_returned_verbatim() {
        let store = CredentialStore::plaintext();
        assert_eq!(store.get_credential("s3cret", None).unwrap(), "s3cret");
    }

    #[test]
    #[serial_test::serial]
    fn env_var_wins_over_stored_value() {
        unsafe {
            env::set_var("ARMCTL_TEST_SECRET", "from-env");
        }

        let store = CredentialStore::plaintext();
        let resolved = store
            .get_credential("from-config", Some("ARMCTL_TEST_SECRET"))
            .unwrap();
        assert_eq!(resolved, "from-env");

        unsafe {
            env::remove_var("ARMCTL_TEST_SECRET");
        }
    }

    #[test]
    #[serial_test::serial]
    fn unset_env_var_falls_back_to_value() {
        unsafe {
            env::remove_var("ARMCTL_TEST_UNSET");
        }
        let store = CredentialStore::plaintext();
        let resolved = store
            .get_credential("from-config", Some("ARMCTL_TEST_UNSET"))
            .unwrap();
        assert_eq!(resolved, "from-config");
    }

    #[test]
    fn keyring_reference_detection() {
        assert!(CredentialStore::is_keyring_reference("keyring:client-secret"));
        assert!(!CredentialStore::is_keyring_reference("client-secret"));
        assert!(!CredentialStore::is_keyring_reference(""));
    }

    #[test]
    fn plaintext_store_returns_value_for_config() {
        let store = CredentialStore::plaintext();
        assert_eq!(store.storage(), CredentialStorage::Plaintext);
        assert_eq!(store.store_credential("k", "v").unwrap(), "v");
        assert!(store.delete_credential("k").is_ok());
    }

    #[cfg(not(feature = "secure-storage"))]
    #[test]
    fn keyring_reference_without_feature_is_an_error() {
        let store = CredentialStore::plaintext();
        let err = store.get_credential("keyring:x", None).unwrap_err();
        assert!(err.to_string().contains("secure-storage"));
    }
}
