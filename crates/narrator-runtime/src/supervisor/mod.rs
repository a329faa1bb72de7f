//! [`ServerSupervisor`] backed by real processes and containers.
//!
//! KittenTTS runs as a Python child process this supervisor owns. OpenTTS
//! runs in a docker container named `opentts`.

mod kittentts;
mod opentts;
mod probes;

use async_trait::async_trait;
use narrator_core::{
    DependencyCheck, DependencyProbe, LocalServer, ServerSupervisor, StartOptions, SupervisorError,
};
use tokio::process::Child;
use tokio::sync::Mutex;

use crate::paths::KittenTtsPaths;

/// Supervises the self-hosted speech servers on this machine.
pub struct ProcessSupervisor {
    paths: KittenTtsPaths,
    /// The KittenTTS server this supervisor launched, if any.
    kitten_child: Mutex<Option<Child>>,
    /// Host the servers listen on.
    host: String,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(KittenTtsPaths::default())
    }
}

impl ProcessSupervisor {
    pub fn new(paths: KittenTtsPaths) -> Self {
        Self {
            paths,
            kitten_child: Mutex::new(None),
            host: "127.0.0.1".to_string(),
        }
    }

    pub const fn paths(&self) -> &KittenTtsPaths {
        &self.paths
    }

    /// URL polled to decide whether a server is up.
    pub fn ready_url(&self, server: LocalServer) -> String {
        format!("http://{}:{}/api/voices", self.host, server.default_port())
    }
}

#[async_trait]
impl ServerSupervisor for ProcessSupervisor {
    async fn check(&self, probe: DependencyProbe) -> DependencyCheck {
        probes::probe(&self.paths, probe).await
    }

    async fn setup(&self, server: LocalServer) -> Result<String, SupervisorError> {
        match server {
            LocalServer::KittenTts => kittentts::setup(&self.paths).await,
            LocalServer::OpenTts => opentts::setup().await,
        }
    }

    async fn start(
        &self,
        server: LocalServer,
        options: &StartOptions,
    ) -> Result<(), SupervisorError> {
        match server {
            LocalServer::KittenTts => kittentts::start(self, options).await,
            LocalServer::OpenTts => opentts::start(self, options).await,
        }
    }

    async fn stop(&self, server: LocalServer) -> Result<(), SupervisorError> {
        match server {
            LocalServer::KittenTts => kittentts::stop(self).await,
            LocalServer::OpenTts => opentts::stop().await,
        }
    }
}
