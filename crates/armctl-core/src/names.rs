//! Random resource names
//!
//! No uniqueness check is made against existing groups; with 36^4 suffixes
//! a collision within one subscription is unlikely enough to ignore.

use rand::Rng;

use crate::error::{CoreError, Result};

pub const RESOURCE_GROUP_PREFIX: &str = "test_";
pub const STORAGE_ACCOUNT_PREFIX: &str = "test";
pub const SUFFIX_LEN: usize = 4;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// `prefix` followed by `len` lowercase alphanumeric characters
pub fn random_name(prefix: &str, len: usize) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", prefix, suffix)
}

pub fn resource_group_name() -> String {
    random_name(RESOURCE_GROUP_PREFIX, SUFFIX_LEN)
}

pub fn storage_account_name() -> String {
    random_name(STORAGE_ACCOUNT_PREFIX, SUFFIX_LEN)
}

/// 1-90 characters of alphanumerics, `_`, `-`, `.`, `(` or `)`, not ending in `.`
pub fn validate_resource_group_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(1..=90).contains(&len) {
        return Err(CoreError::Validation(format!(
            "resource group name must be 1-90 characters, got {}",
            len
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')')))
    {
        return Err(CoreError::Validation(format!(
            "resource group name '{}' contains invalid character '{}'",
            name, bad
        )));
    }
    if name.ends_with('.') {
        return Err(CoreError::Validation(format!(
            "resource group name '{}' must not end with a period",
            name
        )));
    }
    Ok(())
}

/// 3-24 characters, lowercase letters and digits only
pub fn validate_storage_account_name(name: &str) -> Result<()> {
    if !(3..=24).contains(&name.len()) {
        return Err(CoreError::Validation(format!(
            "storage account name must be 3-24 characters, got {}",
            name.len()
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err(CoreError::Validation(format!(
            "storage account name '{}' may only contain lowercase letters and digits",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_have_prefix_and_suffix() {
        for _ in 0..50 {
            let rg = resource_group_name();
            assert!(rg.starts_with("test_"));
            assert_eq!(rg.len(), 9);
            assert!(
                rg[5..]
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            );
            validate_resource_group_name(&rg).unwrap();

            let sa = storage_account_name();
            assert!(sa.starts_with("test"));
            assert_eq!(sa.len(), 8);
            validate_storage_account_name(&sa).unwrap();
        }
    }

    #[test]
    fn resource_group_rules() {
        assert!(validate_resource_group_name("my-rg_(1).x").is_ok());
        assert!(validate_resource_group_name("").is_err());
        assert!(validate_resource_group_name("ends.").is_err());
        assert!(validate_resource_group_name("has space").is_err());
        assert!(validate_resource_group_name(&"a".repeat(91)).is_err());
    }

    #[test]
    fn storage_account_rules() {
        assert!(validate_storage_account_name("test1a2b").is_ok());
        assert!(validate_storage_account_name("ab").is_err());
        assert!(validate_storage_account_name("Upper").is_err());
        assert!(validate_storage_account_name("test_ab12").is_err());
        assert!(validate_storage_account_name(&"a".repeat(25)).is_err());
    }
}
