use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use clap::Parser;
use sysinfo::{get_current_pid, Signal, System};
use tracing::{info, warn};

use crate::daemon::args::{DaemonArgs, TrackerArgs};

use super::daemon_path::to_daemon_path;

pub fn daemon_executable() -> Result<PathBuf> {
    // The daemon is expected next to the executable of the cli. It's not the best option but it
    // will do the job in most cases.
    Ok(to_daemon_path(env::current_exe()?))
}

/// Stops every process started from `name` and waits for them to exit. Returns the command line
/// of each stopped process.
pub fn kill_previous_servers(name: &Path) -> Result<Vec<Vec<String>>> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't read own pid {e}"))?;
    let mut killed = Vec::new();
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            let command_line = process
                .cmd()
                .iter()
                .map(|v| v.to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            info!(%pid, ?command_line, "Stopping daemon");
            // On unix the daemon saves on SIGTERM. This will forcefully terminate the process on
            // Windows, the last autosave is kept there.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            killed.push(command_line);
        }
    }
    Ok(killed)
}

/// Parses the command line of a stopped daemon so it can be started again the same way. `None`
/// when it isn't a daemon command line.
pub fn parse_daemon_command(command_line: &[String]) -> Option<DaemonArgs> {
    // Processes of other users don't expose their arguments.
    if command_line.is_empty() {
        return None;
    }
    DaemonArgs::try_parse_from(command_line)
        .inspect_err(|e| warn!(?command_line, "Can't read daemon arguments {e}"))
        .ok()
}

/// Intended for shutting down previous daemon and starting new one. The daemon detaches itself,
/// the process spawned here exits as soon as it did.
pub fn restart_server(dir: Option<&Path>, tracker: &TrackerArgs) -> Result<()> {
    let daemon = daemon_executable()?;
    kill_previous_servers(&daemon)?;
    let mut command = std::process::Command::new(&daemon);
    if let Some(dir) = dir {
        command.arg("--dir").arg(std::path::absolute(dir)?);
    }
    command.args(tracker.to_command_args());

    println!("Spawning");
    let status = command
        .spawn()
        .map_err(|e| anyhow!("Failed to start {daemon:?} {e}"))?
        .wait()?;
    if !status.success() {
        warn!(?status, "Daemon launcher failed");
        return Err(anyhow!("Daemon launcher exited with {status}"));
    }
    println!("Success");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::daemon::config::TrackerConfig;

    use super::parse_daemon_command;

    fn command_line(args: &[&str]) -> Vec<String> {
        args.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_daemon_flags_are_recovered() {
        let args = parse_daemon_command(&command_line(&[
            "/usr/local/bin/screentime-daemon",
            "--dir",
            "/home/user/.local/state/screentime",
            "--afk-threshold",
            "0",
            "--browser",
            "librewolf",
            "--force",
        ]))
        .unwrap();
        assert_eq!(
            args.dir.as_deref(),
            Some(std::path::Path::new("/home/user/.local/state/screentime"))
        );
        let config = TrackerConfig::from(args.tracker);
        assert_eq!(config.afk_threshold, None);
        assert_eq!(config.browsers, vec!["librewolf"]);
    }

    #[test]
    fn test_unknown_command_line_is_rejected() {
        assert!(parse_daemon_command(&command_line(&["screentime-daemon", "--bogus"])).is_none());
        assert!(parse_daemon_command(&[]).is_none());
    }
}
