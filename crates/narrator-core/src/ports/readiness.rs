//! Readiness port consumed by the self-hosted speech providers.

use crate::domain::{LocalServer, ServerState};

/// Reports whether a self-hosted server may be used right now.
///
/// Providers consult this before every request instead of probing the
/// server over the network.
pub trait ServerReadiness: Send + Sync {
    fn server_state(&self, server: LocalServer) -> ServerState;

    fn is_running(&self, server: LocalServer) -> bool {
        self.server_state(server) == ServerState::Running
    }
}
