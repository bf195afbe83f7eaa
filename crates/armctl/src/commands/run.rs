//! `armctl run`: the provision, pause, cleanup session

use std::sync::Arc;
use std::time::Duration;

use armctl_core::names;
use armctl_core::pause::{Delay, Immediate, Pause};
use armctl_core::session::{
    CleanupFailurePolicy, DEFAULT_PROMPT, ProvisioningSession, SessionEvent, SessionOptions,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{OutputFormat, RunArgs};
use crate::connection::ConnectionManager;
use crate::console::{ConsoleReporter, StdinPause};
use crate::error::Result as CliResult;
use crate::output;

use super::structured;

const EXIT_PROMPT: &str = "Press Enter to exit...";

/// Build session options from the command line
pub fn session_options(
    args: &RunArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
) -> CliResult<SessionOptions> {
    if let Some(name) = &args.resource_group_name {
        names::validate_resource_group_name(name)?;
    }
    if let Some(name) = &args.storage_account_name {
        names::validate_storage_account_name(name)?;
    }

    Ok(SessionOptions {
        region: conn_mgr.region(profile_name, args.region),
        scope: args.cleanup_scope,
        failure_policy: if args.abort_on_delete_failure {
            CleanupFailurePolicy::AbortPass
        } else {
            CleanupFailurePolicy::Continue
        },
        resource_group_name: args.resource_group_name.clone(),
        storage_account_name: args.storage_account_name.clone(),
        prompt: DEFAULT_PROMPT.to_string(),
    })
}

/// Enter-to-continue pause; structured output keeps its prompt off stdout
fn stdin_pause(cancel: &CancellationToken, structured_output: bool) -> StdinPause {
    let pause = StdinPause::new(cancel.clone());
    if structured_output {
        pause.prompt_on_stderr()
    } else {
        pause
    }
}

/// Pause implementation selected by `--yes` / `--wait`
fn pause_for(
    args: &RunArgs,
    cancel: &CancellationToken,
    structured_output: bool,
) -> Box<dyn Pause> {
    if args.yes {
        Box::new(Immediate)
    } else if let Some(seconds) = args.wait {
        Box::new(Delay(Duration::from_secs(seconds)))
    } else {
        Box::new(stdin_pause(cancel, structured_output))
    }
}

/// Cancel `token` on the first Ctrl-C; exit on the second
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted; cleaning up (press Ctrl-C again to abort cleanup)");
        token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cleanup aborted; resources may remain");
            std::process::exit(130);
        }
    });
}

pub async fn handle_run(
    args: &RunArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let options = session_options(args, conn_mgr, profile_name)?;
    debug!("Session options: {:?}", options);

    let client = conn_mgr.create_client(profile_name).await?;
    let subscription_id = client.subscription_id().to_string();

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let format = structured(output_format);
    let mut session =
        ProvisioningSession::new(Arc::new(client), options).with_cancellation(cancel.clone());
    if format.is_none() {
        let reporter = ConsoleReporter::new(subscription_id);
        session = session.with_events(Box::new(move |event: SessionEvent| reporter.report(event)));
    }

    let pause = pause_for(args, &cancel, format.is_some());
    let report = session.run(pause.as_ref()).await;

    if report.is_clean() {
        info!("Session finished cleanly");
    } else {
        warn!("Session finished with {} failure(s)", report.failures.len());
    }

    if let Some(format) = format {
        output::print_output(&report, format)?;
    }

    if args.pause_on_exit && !cancel.is_cancelled() {
        stdin_pause(&cancel, format.is_some())
            .wait(EXIT_PROMPT)
            .await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use armctl_core::session::CleanupScope;
    use armctl_core::{Config, Region};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["armctl", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn manager() -> ConnectionManager {
        ConnectionManager::with_config_path(Config::default(), None)
    }

    #[test]
    fn defaults_delete_everything_and_continue() {
        let options = session_options(&run_args(&[]), &manager(), None).unwrap();
        assert_eq!(options.region, Region::WestUs);
        assert_eq!(options.scope, CleanupScope::All);
        assert_eq!(options.failure_policy, CleanupFailurePolicy::Continue);
        assert!(options.resource_group_name.is_none());
    }

    #[test]
    fn flags_map_to_options() {
        let args = run_args(&[
            "--region",
            "northeurope",
            "--cleanup-scope",
            "session",
            "--abort-on-delete-failure",
            "--resource-group-name",
            "test_demo",
        ]);
        let options = session_options(&args, &manager(), None).unwrap();
        assert_eq!(options.region, Region::NorthEurope);
        assert_eq!(options.scope, CleanupScope::Session);
        assert_eq!(options.failure_policy, CleanupFailurePolicy::AbortPass);
        assert_eq!(options.resource_group_name.as_deref(), Some("test_demo"));
    }

    #[test]
    fn invalid_storage_name_is_rejected_before_connecting() {
        let args = run_args(&["--storage-account-name", "Not_Valid"]);
        assert!(session_options(&args, &manager(), None).is_err());
    }

    #[test]
    fn yes_conflicts_with_wait() {
        assert!(Cli::try_parse_from(["armctl", "run", "--yes", "--wait", "5"]).is_err());
    }
}
