//! `armctl group` commands

use armctl_core::arm::{ResourceGroup, ResourceGroupHandler};
use armctl_core::{CoreError, names};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{GroupCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::{ArmCtlError, Result as CliResult};
use crate::output;

use super::{spinner, spinner_callback, structured};

/// Table row for a resource group
#[derive(Debug, Serialize)]
struct GroupRow<'a> {
    name: &'a str,
    location: &'a str,
    state: &'a str,
}

impl<'a> From<&'a ResourceGroup> for GroupRow<'a> {
    fn from(group: &'a ResourceGroup) -> Self {
        Self {
            name: &group.name,
            location: &group.location,
            state: group.provisioning_state().unwrap_or("-"),
        }
    }
}

fn print_groups(groups: &[ResourceGroup], output_format: OutputFormat) -> CliResult<()> {
    match structured(output_format) {
        Some(format) => output::print_output(groups, format)?,
        None => {
            let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
            output::print_output(&rows, output::OutputFormat::Table)?;
        }
    }
    Ok(())
}

fn print_group(group: &ResourceGroup, output_format: OutputFormat) -> CliResult<()> {
    let format = structured(output_format).unwrap_or(output::OutputFormat::Table);
    match format {
        output::OutputFormat::Table => output::print_output(GroupRow::from(group), format)?,
        _ => output::print_output(group, format)?,
    }
    Ok(())
}

pub async fn handle_group_command(
    cmd: &GroupCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    if let GroupCommands::Create { name, .. } = cmd {
        names::validate_resource_group_name(name)?;
    }

    let client = conn_mgr.create_client(profile_name).await?;
    let handler = ResourceGroupHandler::new(client);

    match cmd {
        GroupCommands::List => {
            let groups = handler.list().await?;
            debug!("Found {} resource group(s)", groups.len());
            print_groups(&groups, output_format)
        }
        GroupCommands::Show { name } => match handler.get(name).await {
            Ok(group) => print_group(&group, output_format),
            Err(e) if e.is_not_found() => Err(ArmCtlError::ResourceGroupNotFound {
                name: name.clone(),
            }),
            Err(e) => Err(e.into()),
        },
        GroupCommands::Create { name, region } => {
            let region = conn_mgr.region(profile_name, *region);
            info!("Creating resource group {} in {}", name, region);
            let group = handler.create(name, region).await?;
            print_group(&group, output_format)
        }
        GroupCommands::Delete { name, if_exists } => {
            let pb = spinner(format!("Deleting {}", name));
            let callback = spinner_callback(&pb, format!("Deleting {}", name));
            let result = handler.delete_with_progress(name, Some(&callback)).await;
            if !pb.is_finished() {
                pb.finish_and_clear();
            }

            let deleted = match result {
                Ok(()) => true,
                Err(CoreError::NotFound { .. }) if *if_exists => false,
                Err(CoreError::NotFound { .. }) => {
                    return Err(ArmCtlError::ResourceGroupNotFound { name: name.clone() });
                }
                Err(e) => return Err(e.into()),
            };

            match structured(output_format) {
                Some(format) => output::print_output(
                    serde_json::json!({ "name": name, "deleted": deleted }),
                    format,
                )?,
                None if deleted => println!("Deleted resource group {}", name),
                None => println!("Resource group {} does not exist", name),
            }
            Ok(())
        }
    }
}
