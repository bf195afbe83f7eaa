//! `armctl storage` commands

use armctl_core::arm::{StorageAccount, StorageAccountHandler, StorageAccountOptions};
use armctl_core::names;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::cli::{OutputFormat, StorageCommands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;

use super::{spinner, spinner_callback, structured};

#[derive(Debug, Serialize)]
struct AccountRow<'a> {
    name: &'a str,
    resource_group: &'a str,
    location: &'a str,
    kind: &'a str,
    sku: &'a str,
    state: &'a str,
}

impl<'a> From<&'a StorageAccount> for AccountRow<'a> {
    fn from(account: &'a StorageAccount) -> Self {
        Self {
            name: &account.name,
            resource_group: account.resource_group().unwrap_or("-"),
            location: &account.location,
            kind: account.kind.as_deref().unwrap_or("-"),
            sku: account.sku.as_ref().map_or("-", |sku| sku.name.as_str()),
            state: account.provisioning_state().unwrap_or("-"),
        }
    }
}

fn print_accounts(accounts: &[StorageAccount], output_format: OutputFormat) -> CliResult<()> {
    match structured(output_format) {
        Some(format) => output::print_output(accounts, format)?,
        None => {
            let rows: Vec<AccountRow> = accounts.iter().map(AccountRow::from).collect();
            output::print_output(&rows, output::OutputFormat::Table)?;
        }
    }
    Ok(())
}

pub async fn handle_storage_command(
    cmd: &StorageCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        StorageCommands::Create { name, .. } | StorageCommands::CheckName { name } => {
            names::validate_storage_account_name(name)?;
        }
        StorageCommands::List { .. } => {}
    }

    let client = conn_mgr.create_client(profile_name).await?;
    let handler = StorageAccountHandler::new(client);

    match cmd {
        StorageCommands::List { resource_group } => {
            let accounts = handler.list_by_resource_group(resource_group).await?;
            print_accounts(&accounts, output_format)
        }
        StorageCommands::Create {
            name,
            resource_group,
            region,
            sku,
            kind,
        } => {
            let region = conn_mgr.region(profile_name, *region);
            let options = StorageAccountOptions {
                sku: sku.clone(),
                kind: kind.clone(),
            };
            info!(
                "Creating storage account {} ({}, {}) in {}",
                name, options.kind, options.sku, region
            );

            let pb = spinner(format!("Creating {}", name));
            let callback = spinner_callback(&pb, format!("Creating {}", name));
            let result = handler
                .create_with_options(resource_group, name, region, &options, Some(&callback))
                .await;
            if !pb.is_finished() {
                pb.finish_and_clear();
            }

            let account = result?;
            print_accounts(std::slice::from_ref(&account), output_format)
        }
        StorageCommands::CheckName { name } => {
            let availability = handler.check_name_availability(name).await?;
            match structured(output_format) {
                Some(format) => output::print_output(&availability, format)?,
                None if availability.name_available => {
                    println!("{} {} is available", "\u{2713}".green(), name);
                }
                None => {
                    println!(
                        "{} {} is not available: {}",
                        "\u{2717}".red(),
                        name,
                        availability
                            .message
                            .as_deref()
                            .or(availability.reason.as_deref())
                            .unwrap_or("no reason given")
                    );
                }
            }
            Ok(())
        }
    }
}
