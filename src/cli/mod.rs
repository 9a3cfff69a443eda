pub mod daemon_path;
pub mod process;
pub mod report;
pub mod reset;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{daemon_executable, kill_previous_servers, parse_daemon_command, restart_server};
use report::{render_report, ReportCommand};
use reset::{apply_reset, ResetTarget};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    daemon::{args::TrackerArgs, load_store, start_daemon},
    utils::{
        clock::DefaultClock,
        dir::resolve_application_path,
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
    },
};

const DIR_HELP: &str =
    "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state";

#[derive(Parser, Debug)]
#[command(name = "screentime", version, long_about = None)]
#[command(about = "Tracks how long applications and websites are used", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging", global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Summarize usage of a period")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(
        about = "Remove tracked usage. A running daemon is restarted so it doesn't write old data back"
    )]
    Reset {
        #[command(flatten)]
        target: ResetTarget,
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
}

impl Commands {
    fn dir(&self) -> Option<PathBuf> {
        match self {
            Commands::Init { dir, .. }
            | Commands::Serve { dir, .. }
            | Commands::Report { dir, .. }
            | Commands::Reset { dir, .. } => dir.clone(),
            Commands::Stop {} => None,
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = resolve_application_path(args.commands.dir())?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Serve { .. } => DAEMON_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init { dir, tracker } => {
            restart_server(dir.as_deref(), &tracker)?;
            Ok(())
        }
        Commands::Stop {} => {
            let stopped = kill_previous_servers(&daemon_executable()?)?;
            println!("Stopped {} daemon(s)", stopped.len());
            Ok(())
        }
        Commands::Serve { tracker, .. } => {
            start_daemon(app_dir, tracker.into()).await?;
            Ok(())
        }
        Commands::Report { command, .. } => {
            let store = load_store(app_dir, Arc::new(DefaultClock)).await;
            let store = store.lock().await;
            print!("{}", render_report(&store, &command)?);
            Ok(())
        }
        Commands::Reset { target, dir } => {
            // The daemon keeps usage in memory and would write removed data back.
            let stopped = kill_previous_servers(&daemon_executable()?)?;
            let store = load_store(app_dir, Arc::new(DefaultClock)).await;
            if apply_reset(&store, &target).await? {
                println!("Usage removed");
            } else {
                println!("Nothing was tracked for it");
            }
            let Some(command_line) = stopped.first() else {
                return Ok(());
            };
            info!("Restarting daemon");
            match parse_daemon_command(command_line) {
                Some(previous) => {
                    let dir = previous.dir.or(dir);
                    restart_server(dir.as_deref(), &previous.tracker)?;
                }
                None => {
                    println!("Couldn't read the daemon's settings, it's restarted with defaults");
                    restart_server(dir.as_deref(), &TrackerArgs::default())?;
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::query::Period;

    use super::{Args, Commands};

    #[test]
    fn test_report_arguments() {
        let args = Args::try_parse_from([
            "screentime",
            "report",
            "--period",
            "this-week",
            "--websites",
            "--top",
            "3",
        ])
        .unwrap();
        let Commands::Report { command, dir } = args.commands else {
            panic!("Expected report");
        };
        assert_eq!(command.period, Period::ThisWeek);
        assert!(command.websites);
        assert_eq!(command.top, 3);
        assert_eq!(dir, None);
    }

    #[test]
    fn test_reset_requires_one_target() {
        assert!(Args::try_parse_from(["screentime", "reset"]).is_err());
        assert!(
            Args::try_parse_from(["screentime", "reset", "--all", "--app", "code"]).is_err()
        );
        let args = Args::try_parse_from(["screentime", "reset", "--website", "github.com"])
            .unwrap();
        let Commands::Reset { target, .. } = args.commands else {
            panic!("Expected reset");
        };
        assert_eq!(target.website.as_deref(), Some("github.com"));
        assert!(!target.all);
    }
}
