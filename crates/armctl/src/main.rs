use anyhow::Result;
use armctl_core::Config;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod console;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::ArmCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let (config, config_path) = match load_config(cli.config_file.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };
    debug!(
        "Creating ConnectionManager with config_path: {:?}",
        config_path
    );
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

/// Load configuration from the given path or the default location
fn load_config(
    config_file: Option<&str>,
) -> Result<(Config, Option<std::path::PathBuf>), ArmCtlError> {
    match config_file {
        Some(config_file) => {
            let path = std::path::PathBuf::from(config_file);
            debug!("Loading config from explicit path: {:?}", path);
            let config = Config::load_from_path(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            debug!("Loading config from default location");
            Ok((Config::load()?, None))
        }
    }
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "armctl=warn,armctl_core=warn",
            1 => "armctl=info,armctl_core=info",
            2 => "armctl=debug,armctl_core=debug",
            _ => "armctl=trace,armctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), ArmCtlError> {
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let profile = cli.profile.as_deref();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match commands::structured(cli.output) {
                Some(format) => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, format)?;
                }
                None => println!("armctl {}", env!("CARGO_PKG_VERSION")),
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Commands::Run(args) => {
            commands::run::handle_run(args, conn_mgr, profile, cli.output).await
        }
        Commands::Group(cmd) => {
            commands::group::handle_group_command(cmd, conn_mgr, profile, cli.output).await
        }
        Commands::Storage(cmd) => {
            commands::storage::handle_storage_command(cmd, conn_mgr, profile, cli.output).await
        }
        Commands::Profile(cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(cmd, conn_mgr, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Run(args) => format!(
            "run --cleanup-scope {:?}{}",
            args.cleanup_scope,
            if args.yes { " --yes" } else { "" }
        ),
        Commands::Group(cmd) => format!("group {:?}", cmd),
        Commands::Storage(cmd) => format!("storage {:?}", cmd),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands;
            match cmd {
                ProfileCommands::List => "profile list".to_string(),
                ProfileCommands::Path => "profile path".to_string(),
                ProfileCommands::Show { name } => format!("profile show {}", name),
                ProfileCommands::Set { name, .. } => {
                    format!("profile set {} [credentials redacted]", name)
                }
                ProfileCommands::Remove { name } => format!("profile remove {}", name),
                ProfileCommands::Default { name } => format!("profile default {}", name),
            }
        }
    }
}
