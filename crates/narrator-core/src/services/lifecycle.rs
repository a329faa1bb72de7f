//! Local server lifecycle manager.
//!
//! Tracks `idle → starting → running` per self-hosted server and drives the
//! check → remediate → start sequence through a [`ServerSupervisor`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{DependencyCheck, DependencyReport, LocalServer, ServerState, StartOptions};
use crate::ports::{ServerReadiness, ServerSupervisor, SupervisorError};

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// A dependency check failed; the check is the remediation target.
    #[error("{server} is not ready to start: {} ({})", .check.label, .check.detail)]
    DependencyMissing {
        server: LocalServer,
        check: DependencyCheck,
    },

    /// Another start for the same server has not finished yet.
    #[error("{0} is already starting")]
    StartInProgress(LocalServer),

    /// The supervisor failed to start the server. State is back to idle.
    #[error("Failed to start {server}: {source}")]
    StartFailed {
        server: LocalServer,
        #[source]
        source: SupervisorError,
    },

    /// A stop arrived while the start was in flight.
    #[error("Start of {0} was cancelled by a stop request")]
    Aborted(LocalServer),

    /// The supervisor failed to stop the server. State is idle regardless.
    #[error("Failed to stop {server}: {source}")]
    StopFailed {
        server: LocalServer,
        #[source]
        source: SupervisorError,
    },

    /// Dependency installation failed.
    #[error("Setup of {server} failed: {source}")]
    SetupFailed {
        server: LocalServer,
        #[source]
        source: SupervisorError,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    state: ServerState,
    /// Bumped on every start and stop so a finishing start can tell whether
    /// it was overtaken.
    attempt: u64,
}

/// Lifecycle manager for the self-hosted speech servers.
pub struct LifecycleManager {
    supervisor: Arc<dyn ServerSupervisor>,
    slots: Mutex<BTreeMap<LocalServer, Slot>>,
}

impl LifecycleManager {
    pub fn new(supervisor: Arc<dyn ServerSupervisor>) -> Self {
        Self {
            supervisor,
            slots: Mutex::new(BTreeMap::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<LocalServer, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of a server.
    pub fn state(&self, server: LocalServer) -> ServerState {
        self.slots()
            .get(&server)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    /// Run the server's full dependency battery.
    ///
    /// All probes run concurrently and are re-evaluated on every call;
    /// results are reported in battery order.
    pub async fn check_dependencies(&self, server: LocalServer) -> DependencyReport {
        let checks = join_all(
            server
                .probes()
                .iter()
                .map(|probe| self.supervisor.check(*probe)),
        )
        .await;

        let report = DependencyReport { server, checks };
        match report.remediation_target() {
            Some(failed) => debug!(
                server = %server,
                label = %failed.label,
                detail = %failed.detail,
                "Dependency check failed"
            ),
            None => debug!(server = %server, "All dependency checks passed"),
        }
        report
    }

    /// Install missing dependencies.
    pub async fn setup(&self, server: LocalServer) -> Result<String, LifecycleError> {
        info!(server = %server, "Running server setup");
        self.supervisor
            .setup(server)
            .await
            .map_err(|source| LifecycleError::SetupFailed { server, source })
    }

    /// Start a server.
    ///
    /// Rejected without a state change when any dependency check fails.
    /// Starting a running server is a no-op.
    pub async fn start(
        &self,
        server: LocalServer,
        options: &StartOptions,
    ) -> Result<(), LifecycleError> {
        if self.reject_busy(server)? {
            return Ok(());
        }

        let report = self.check_dependencies(server).await;
        if let Some(failed) = report.remediation_target() {
            return Err(LifecycleError::DependencyMissing {
                server,
                check: failed.clone(),
            });
        }

        let attempt = {
            let mut slots = self.slots();
            let slot = slots.entry(server).or_default();
            match slot.state {
                ServerState::Running => return Ok(()),
                ServerState::Starting => return Err(LifecycleError::StartInProgress(server)),
                ServerState::Idle => {}
            }
            slot.state = ServerState::Starting;
            slot.attempt += 1;
            slot.attempt
        };

        info!(server = %server, threads = ?options.threads, "Starting server");
        let result = self.supervisor.start(server, options).await;

        let overtaken = {
            let mut slots = self.slots();
            let slot = slots.entry(server).or_default();
            if slot.attempt == attempt {
                slot.state = if result.is_ok() {
                    ServerState::Running
                } else {
                    ServerState::Idle
                };
                None
            } else {
                Some(slot.state)
            }
        };

        if let Some(current) = overtaken {
            warn!(server = %server, "Server start superseded by a stop request");
            if result.is_ok() && current == ServerState::Idle {
                if let Err(e) = self.supervisor.stop(server).await {
                    warn!(server = %server, error = %e, "Cleanup stop after aborted start failed");
                }
            }
            return Err(LifecycleError::Aborted(server));
        }

        match result {
            Ok(()) => {
                info!(server = %server, "Server running");
                Ok(())
            }
            Err(source) => {
                warn!(server = %server, error = %source, "Server failed to start");
                Err(LifecycleError::StartFailed { server, source })
            }
        }
    }

    /// Start the server unless it is already running.
    ///
    /// Returns `true` when this call started it.
    pub async fn ensure_running(
        &self,
        server: LocalServer,
        options: &StartOptions,
    ) -> Result<bool, LifecycleError> {
        if self.state(server) == ServerState::Running {
            return Ok(false);
        }
        self.start(server, options).await?;
        Ok(true)
    }

    /// Stop a server. The state becomes idle unconditionally, even when a
    /// start is in flight or the supervisor reports an error.
    pub async fn stop(&self, server: LocalServer) -> Result<(), LifecycleError> {
        let previous = {
            let mut slots = self.slots();
            let slot = slots.entry(server).or_default();
            let previous = slot.state;
            slot.state = ServerState::Idle;
            slot.attempt += 1;
            previous
        };

        info!(server = %server, previous = %previous, "Stopping server");
        self.supervisor
            .stop(server)
            .await
            .map_err(|source| LifecycleError::StopFailed { server, source })
    }

    /// `Ok(true)` when already running, `Err` when a start is in flight.
    fn reject_busy(&self, server: LocalServer) -> Result<bool, LifecycleError> {
        match self.state(server) {
            ServerState::Running => Ok(true),
            ServerState::Starting => Err(LifecycleError::StartInProgress(server)),
            ServerState::Idle => Ok(false),
        }
    }
}

impl ServerReadiness for LifecycleManager {
    fn server_state(&self, server: LocalServer) -> ServerState {
        self.state(server)
    }
}
