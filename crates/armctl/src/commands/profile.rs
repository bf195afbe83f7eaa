//! Profile management command implementations

use std::io::{self, Write};

use anyhow::Context;
use armctl_core::config::CredentialStore;
use armctl_core::{CloudEnvironment, Config, Profile, Region};
use colored::Colorize;
use tracing::{debug, info, trace};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{ArmCtlError, Result as CliResult};
use crate::output;

use super::structured;

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            client_id,
            client_secret,
            tenant_id,
            subscription_id,
            environment,
            region,
            authority_url,
            management_url,
            default,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let request = SetRequest {
                name,
                client_id,
                client_secret: client_secret.as_deref(),
                tenant_id,
                subscription_id: subscription_id.as_deref(),
                environment: *environment,
                region: *region,
                authority_url: authority_url.as_deref(),
                management_url: management_url.as_deref(),
                make_default: *default,
                #[cfg(feature = "secure-storage")]
                use_keyring: *use_keyring,
                #[cfg(not(feature = "secure-storage"))]
                use_keyring: false,
            };
            handle_set(conn_mgr, request)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| Config::config_path().ok().map(|p| p.display().to_string()))
}

/// Secret as shown to the user: keyring references as-is, plaintext redacted
fn redact_secret(secret: &str) -> String {
    if CredentialStore::is_keyring_reference(secret) {
        secret.to_string()
    } else if secret.is_empty() {
        "not set".to_string()
    } else {
        "********".to_string()
    }
}

fn profile_summary(name: &str, profile: &Profile, is_default: bool) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "name": name,
        "is_default": is_default,
        "client_id": profile.client_id,
        "tenant_id": profile.tenant_id,
        "environment": profile.environment.to_string(),
    });
    if let Some(subscription) = &profile.subscription_id {
        obj["subscription_id"] = serde_json::json!(subscription);
    }
    if let Some(region) = profile.region {
        obj["region"] = serde_json::json!(region.name());
    }
    let missing = profile.missing_fields();
    if !missing.is_empty() {
        obj["missing"] = serde_json::json!(missing);
    }
    obj
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());
    let default = conn_mgr.config.default_profile.as_deref();

    if let Some(format) = structured(output_format) {
        let list: Vec<serde_json::Value> = profiles
            .iter()
            .map(|(name, profile)| profile_summary(name, profile, default == Some(name.as_str())))
            .collect();
        let output_data = serde_json::json!({
            "config_path": config_path_display(conn_mgr),
            "profiles": list,
            "count": profiles.len(),
        });
        output::print_output(&output_data, format)?;
        return Ok(());
    }

    if let Some(path) = config_path_display(conn_mgr) {
        println!("Configuration file: {}", path);
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'armctl profile set' to create a profile.");
        return Ok(());
    }

    for (name, profile) in &profiles {
        let mut line = format!("  {}", name.bold());
        if default == Some(name.as_str()) {
            line.push_str(&format!(" {}", "(default)".green()));
        }
        line.push_str(&format!(
            "  {} tenant {}",
            profile.environment, profile.tenant_id
        ));
        if let Some(region) = profile.region {
            line.push_str(&format!(", {}", region.name()));
        }
        let missing = profile.missing_fields();
        if !missing.is_empty() {
            line.push_str(&format!(
                " {}",
                format!("(incomplete: {})", missing.join(", ")).yellow()
            ));
        }
        println!("{}", line);
    }
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match structured(output_format) {
        Some(format) => output::print_output(
            serde_json::json!({ "config_path": config_path.display().to_string() }),
            format,
        )?,
        None => println!("{}", config_path.display()),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr.config.profile(name)?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    if let Some(format) = structured(output_format) {
        let mut output_data = profile_summary(name, profile, is_default);
        output_data["client_secret"] = serde_json::json!(redact_secret(&profile.client_secret));
        output_data["authority_url"] = serde_json::json!(profile.authority_url());
        output_data["management_url"] = serde_json::json!(profile.management_url());
        output::print_output(&output_data, format)?;
        return Ok(());
    }

    println!("Profile: {}", name);
    println!("Client ID: {}", profile.client_id);
    println!("Client Secret: {}", redact_secret(&profile.client_secret));
    println!("Tenant ID: {}", profile.tenant_id);
    println!(
        "Subscription: {}",
        profile
            .subscription_id
            .as_deref()
            .unwrap_or("first enabled")
    );
    println!("Environment: {}", profile.environment);
    println!("Authority: {}", profile.authority_url());
    println!("Management: {}", profile.management_url());
    println!(
        "Region: {}",
        profile.region.unwrap_or_default().display_name()
    );
    if is_default {
        println!("Default: yes");
    }
    Ok(())
}

/// Arguments of `profile set`
struct SetRequest<'a> {
    name: &'a str,
    client_id: &'a str,
    client_secret: Option<&'a str>,
    tenant_id: &'a str,
    subscription_id: Option<&'a str>,
    environment: CloudEnvironment,
    region: Option<Region>,
    authority_url: Option<&'a str>,
    management_url: Option<&'a str>,
    make_default: bool,
    use_keyring: bool,
}

fn handle_set(conn_mgr: &ConnectionManager, request: SetRequest<'_>) -> CliResult<()> {
    let name = request.name;
    debug!("Setting profile: {}", name);

    let secret = match request.client_secret {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            print!("Enter client secret: ");
            io::stdout().flush()?;
            rpassword::read_password().context("Failed to read client secret")?
        }
    };
    if secret.trim().is_empty() {
        return Err(ArmCtlError::InvalidInput {
            message: "client secret cannot be empty".to_string(),
        });
    }

    let stored_secret = if request.use_keyring {
        let store = CredentialStore::new();
        let reference = store
            .store_credential(&format!("{}-client-secret", name), &secret)
            .context("Failed to store client secret in keyring")?;
        if CredentialStore::is_keyring_reference(&reference) {
            println!("Client secret stored securely in OS keyring");
        }
        reference
    } else {
        secret
    };

    let profile = Profile {
        client_id: request.client_id.to_string(),
        client_secret: stored_secret,
        tenant_id: request.tenant_id.to_string(),
        subscription_id: request.subscription_id.map(str::to_string),
        environment: request.environment,
        authority_url: request.authority_url.map(str::to_string),
        management_url: request.management_url.map(str::to_string),
        region: request.region,
    };

    let mut updated = conn_mgr.clone();
    updated.config.set_profile(name.to_string(), profile);
    if request.make_default {
        updated.config.default_profile = Some(name.to_string());
    }
    updated.save_config()?;

    match config_path_display(&updated) {
        Some(path) => {
            println!("Profile '{}' saved successfully to:", name);
            println!("  {}", path);
        }
        None => println!("Profile '{}' saved successfully.", name),
    }

    if !request.make_default
        && updated.config.profiles.len() > 1
        && updated.config.default_profile.is_none()
    {
        println!();
        println!("Tip: Set as default with:");
        println!("  armctl profile default {}", name);
    }

    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);
    let profile = conn_mgr.config.profile(name)?;

    if conn_mgr.config.default_profile.as_deref() == Some(name) {
        println!("Warning: '{}' is the default profile.", name);
    }

    print!(
        "Are you sure you want to remove profile '{}'? (y/N): ",
        name
    );
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    if input != "y" && input != "yes" {
        println!("Profile removal cancelled.");
        return Ok(());
    }

    if let Some(key) = profile.client_secret.strip_prefix("keyring:")
        && let Err(e) = CredentialStore::new().delete_credential(key)
    {
        println!("Warning: could not remove keyring entry '{}': {}", key, e);
    }

    let mut updated = conn_mgr.clone();
    let was_default = updated.config.default_profile.as_deref() == Some(name);
    updated.config.remove_profile(name);
    updated.save_config()?;

    if was_default {
        println!("Default profile cleared.");
    }
    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Setting default profile: {}", name);
    conn_mgr.config.profile(name)?;

    let mut updated = conn_mgr.clone();
    updated.config.default_profile = Some(name.to_string());
    updated.save_config()?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_redacted() {
        assert_eq!(redact_secret("hunter2"), "********");
        assert_eq!(redact_secret(""), "not set");
        assert_eq!(
            redact_secret("keyring:dev-client-secret"),
            "keyring:dev-client-secret"
        );
    }

    #[test]
    fn summary_flags_incomplete_profiles() {
        let profile = Profile::new("id", "", "tenant");
        let summary = profile_summary("dev", &profile, true);
        assert_eq!(summary["is_default"], true);
        assert_eq!(summary["missing"], serde_json::json!(["client_secret"]));
        assert!(summary.get("client_secret").is_none());
    }
}
