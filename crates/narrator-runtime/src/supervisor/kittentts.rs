//! KittenTTS: Python virtual environment plus a Flask server script.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;

use narrator_core::domain::KITTENTTS_PACKAGES;
use narrator_core::{LocalServer, StartOptions, SupervisorError};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::ProcessSupervisor;
use crate::paths::{KittenTtsPaths, venv_bin};
use crate::process::{
    Readiness, SHUTDOWN_GRACE, is_http_ready, run, run_checked, shutdown_child, wait_for_http_ready,
};

const SERVER: LocalServer = LocalServer::KittenTts;

/// Create the virtual environment if needed and install the packages.
pub(super) async fn setup(paths: &KittenTtsPaths) -> Result<String, SupervisorError> {
    let venv = paths.setup_venv_dir().ok_or_else(|| SupervisorError::MissingPath {
        what: "scripts directory".to_string(),
        path: paths.describe_script_search(),
    })?;

    if venv.exists() {
        debug!(venv = %venv.display(), "Reusing virtual environment");
    } else {
        info!(venv = %venv.display(), "Creating virtual environment");
        run_checked("python3", [OsStr::new("-m"), OsStr::new("venv"), venv.as_os_str()]).await?;
    }

    let pip = venv_bin(&venv, "pip");
    info!(packages = ?KITTENTTS_PACKAGES, "Installing KittenTTS packages");
    run_checked(&pip, ["install"].into_iter().chain(KITTENTTS_PACKAGES)).await?;

    Ok(format!("Packages installed into {}", venv.display()))
}

fn server_command(paths: &KittenTtsPaths, options: &StartOptions) -> Result<Command, SupervisorError> {
    let script = paths.script().ok_or_else(|| SupervisorError::MissingPath {
        what: "KittenTTS server script".to_string(),
        path: paths.describe_script_search(),
    })?;
    let python = paths.venv_python().unwrap_or_else(|| PathBuf::from("python3"));

    let mut command = Command::new(python);
    command
        .arg(script)
        .args(["--port", SERVER.default_port().to_string().as_str()]);
    if let Some(threads) = options.threads.filter(|t| *t > 0) {
        command.args(["--threads", threads.to_string().as_str()]);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    Ok(command)
}

pub(super) async fn start(
    supervisor: &ProcessSupervisor,
    options: &StartOptions,
) -> Result<(), SupervisorError> {
    {
        let mut tracked = supervisor.kitten_child.lock().await;
        if let Some(child) = tracked.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                debug!("KittenTTS already running");
                return Ok(());
            }
            *tracked = None;
        }
    }

    // A server launched by another session already holds the port.
    let url = supervisor.ready_url(SERVER);
    if is_http_ready(&url).await {
        info!(url = %url, "Adopting KittenTTS server that is already answering");
        return Ok(());
    }

    let mut command = server_command(&supervisor.paths, options)?;
    let mut child = command.spawn().map_err(|e| SupervisorError::CommandFailed {
        command: "kittentts-server.py".to_string(),
        reason: e.to_string(),
    })?;
    info!(pid = ?child.id(), threads = ?options.threads, "KittenTTS server launched");

    // The child is only tracked once it is ready; a stop in the meantime
    // falls back to freeing the port.
    let readiness = wait_for_http_ready(&url, options.ready_timeout, Some(&mut child))
        .await
        .map_err(|e| SupervisorError::Other(e.to_string()))?;

    match readiness {
        Readiness::Ready => {
            *supervisor.kitten_child.lock().await = Some(child);
            Ok(())
        }
        Readiness::Exited(reason) => Err(SupervisorError::Exited {
            server: SERVER,
            reason,
        }),
        Readiness::TimedOut => {
            if let Err(e) = shutdown_child(&mut child, SHUTDOWN_GRACE).await {
                warn!(error = %e, "Failed to stop KittenTTS after startup timeout");
            }
            Err(SupervisorError::NotReady {
                server: SERVER,
                seconds: options.ready_timeout.as_secs(),
            })
        }
    }
}

pub(super) async fn stop(supervisor: &ProcessSupervisor) -> Result<(), SupervisorError> {
    let tracked = supervisor.kitten_child.lock().await.take();
    if let Some(mut child) = tracked {
        let status = shutdown_child(&mut child, SHUTDOWN_GRACE)
            .await
            .map_err(|e| SupervisorError::Other(format!("failed to stop KittenTTS: {e}")))?;
        info!(%status, "KittenTTS server stopped");
        return Ok(());
    }

    // Not ours (or launched by an earlier session): free the port instead.
    let port = format!("{}/tcp", SERVER.default_port());
    match run("fuser", ["-k", port.as_str()]).await {
        Ok(output) => debug!(freed = output.success, "Freed KittenTTS port"),
        Err(e) => debug!(error = %e, "fuser unavailable, nothing to stop"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_passes_threads_only_when_positive() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("kittentts-server.py"), "").unwrap();
        let paths = KittenTtsPaths::with_roots([root.path()]);

        let with_threads = StartOptions {
            threads: Some(4),
            ..StartOptions::default()
        };
        let command = server_command(&paths, &with_threads).unwrap();
        let args: Vec<_> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.ends_with(&["--port".into(), "8192".into(), "--threads".into(), "4".into()]));

        let auto = StartOptions {
            threads: Some(0),
            ..StartOptions::default()
        };
        let command = server_command(&paths, &auto).unwrap();
        assert!(!command.as_std().get_args().any(|a| a == "--threads"));
    }

    #[test]
    fn missing_script_is_reported_with_search_path() {
        let root = tempfile::tempdir().unwrap();
        let paths = KittenTtsPaths::with_roots([root.path()]);

        let err = server_command(&paths, &StartOptions::default()).unwrap_err();
        assert!(matches!(err, SupervisorError::MissingPath { path, .. } if path.contains("kittentts-server.py")));
    }
}
