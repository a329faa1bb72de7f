//! Server supervisor port.
//!
//! The supervisor is the piece that actually runs dependency probes and
//! starts/stops the self-hosted speech servers (subprocesses, containers).
//! Core owns the trait; `narrator-runtime` owns the implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DependencyCheck, DependencyProbe, LocalServer, StartOptions};

/// Errors reported by a supervisor operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// A command the operation needed could not be launched.
    #[error("Failed to run {command}: {reason}")]
    CommandFailed { command: String, reason: String },

    /// The server process/container launched but never became ready.
    #[error("{server} did not become ready within {seconds}s")]
    NotReady { server: LocalServer, seconds: u64 },

    /// The server exited on its own during startup.
    #[error("{server} exited during startup: {reason}")]
    Exited { server: LocalServer, reason: String },

    /// A required file or directory is missing.
    #[error("Missing {what}: {path}")]
    MissingPath { what: String, path: String },

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Port for probing, installing, starting and stopping self-hosted servers.
///
/// Probes must be side-effect free and are re-run on every call.
#[async_trait]
pub trait ServerSupervisor: Send + Sync {
    /// Evaluate one precondition.
    async fn check(&self, probe: DependencyProbe) -> DependencyCheck;

    /// Install what the server needs (venv + packages, or image pull).
    /// Returns a short human-readable summary on success.
    async fn setup(&self, server: LocalServer) -> Result<String, SupervisorError>;

    /// Launch the server and wait until it answers.
    async fn start(
        &self,
        server: LocalServer,
        options: &StartOptions,
    ) -> Result<(), SupervisorError>;

    /// Stop the server. Stopping a server that is not running is not an error.
    async fn stop(&self, server: LocalServer) -> Result<(), SupervisorError>;
}
