//! Process lifecycle: pid file bookkeeping and the stop/status subcommands.

use coordinator_config_and_utils::Paths;
use coordinator_ipc::{Action, IpcClient, Request};
use std::time::Duration;
use tracing::{debug, warn};

const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Write this process's pid file.
pub fn write_pid_file(paths: &Paths) -> std::io::Result<()> {
    std::fs::write(paths.pid_file(), std::process::id().to_string())
}

/// Remove the pid file, ignoring a file that is already gone.
pub fn remove_pid_file(paths: &Paths) {
    if let Err(e) = std::fs::remove_file(paths.pid_file()) {
        debug!(error = %e, "Could not remove pid file");
    }
}

/// Ask a running coordinator to shut down.
pub async fn stop_coordinator(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let socket = paths.socket_file();
    let client = IpcClient::new(socket.to_str().ok_or("Socket path is not valid UTF-8")?);

    match client
        .call_with_timeout(Request::new(Action::Shutdown), STOP_TIMEOUT)
        .await
    {
        Ok(_) => {
            println!("Coordinator stopping");
        }
        Err(e) => {
            warn!(error = %e, "Shutdown request failed");
            println!("Coordinator is not running");
        }
    }

    Ok(())
}

/// Report whether a coordinator is running and its sign-in state.
pub async fn check_status(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let socket = paths.socket_file();
    let client = IpcClient::new(socket.to_str().ok_or("Socket path is not valid UTF-8")?);

    if !client.is_coordinator_running().await {
        println!("Coordinator is not running");
        return Ok(());
    }

    match client.call_action(Action::CheckAuthStatus).await {
        Ok(response) => {
            let authenticated = response
                .result
                .as_ref()
                .and_then(|r| r.get("isAuthenticated"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            println!(
                "Coordinator is running ({})",
                if authenticated { "signed in" } else { "signed out" }
            );
        }
        Err(e) => {
            warn!(error = %e, "Status query failed");
            println!("Coordinator is running (state unknown)");
        }
    }

    Ok(())
}
