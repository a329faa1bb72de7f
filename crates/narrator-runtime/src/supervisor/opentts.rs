//! OpenTTS: a docker container.

use narrator_core::domain::{OPENTTS_CONTAINER, OPENTTS_IMAGE};
use narrator_core::{LocalServer, StartOptions, SupervisorError};
use tracing::{debug, info};

use super::ProcessSupervisor;
use crate::process::{Readiness, run, run_checked, wait_for_http_ready};

const SERVER: LocalServer = LocalServer::OpenTts;

pub(super) async fn setup() -> Result<String, SupervisorError> {
    info!(image = OPENTTS_IMAGE, "Pulling OpenTTS image");
    run_checked("docker", ["pull", OPENTTS_IMAGE]).await?;
    Ok(format!("Image {OPENTTS_IMAGE} pulled"))
}

pub(super) async fn start(
    supervisor: &ProcessSupervisor,
    options: &StartOptions,
) -> Result<(), SupervisorError> {
    // Reuse a stopped container before creating a new one.
    let restarted = run("docker", ["start", OPENTTS_CONTAINER]).await?;
    if restarted.success {
        debug!("Restarted existing OpenTTS container");
    } else {
        let port = format!("{0}:{0}", SERVER.default_port());
        run_checked(
            "docker",
            [
                "run",
                "-d",
                "--name",
                OPENTTS_CONTAINER,
                "-p",
                port.as_str(),
                OPENTTS_IMAGE,
            ],
        )
        .await?;
        info!(image = OPENTTS_IMAGE, "Created OpenTTS container");
    }

    let url = supervisor.ready_url(SERVER);
    let readiness = wait_for_http_ready(&url, options.ready_timeout, None)
        .await
        .map_err(|e| SupervisorError::Other(e.to_string()))?;
    match readiness {
        Readiness::Ready => Ok(()),
        Readiness::Exited(reason) => Err(SupervisorError::Exited {
            server: SERVER,
            reason,
        }),
        Readiness::TimedOut => Err(SupervisorError::NotReady {
            server: SERVER,
            seconds: options.ready_timeout.as_secs(),
        }),
    }
}

pub(super) async fn stop() -> Result<(), SupervisorError> {
    let output = run("docker", ["stop", OPENTTS_CONTAINER]).await?;
    if output.success || output.stderr.contains("No such container") {
        info!("OpenTTS container stopped");
        Ok(())
    } else {
        Err(SupervisorError::CommandFailed {
            command: "docker stop".to_string(),
            reason: output.error_line("docker stop failed"),
        })
    }
}
