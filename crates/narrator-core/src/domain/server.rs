//! Self-hosted speech servers, their dependency checks and lifecycle state.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::provider::{ProviderId, UnknownProvider};

/// Docker image backing the OpenTTS provider.
pub const OPENTTS_IMAGE: &str = "synesthesiam/opentts:en";

/// Container name used for OpenTTS.
pub const OPENTTS_CONTAINER: &str = "opentts";

/// Python packages the KittenTTS server script imports.
pub const KITTENTTS_PACKAGES: [&str; 4] = ["kittentts", "flask", "soundfile", "numpy"];

/// A speech server the application starts and stops itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalServer {
    #[serde(rename = "kittentts")]
    KittenTts,
    #[serde(rename = "opentts")]
    OpenTts,
}

impl LocalServer {
    pub const ALL: [Self; 2] = [Self::KittenTts, Self::OpenTts];

    pub const fn provider_id(self) -> ProviderId {
        match self {
            Self::KittenTts => ProviderId::KittenTts,
            Self::OpenTts => ProviderId::OpenTts,
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::KittenTts => "KittenTTS",
            Self::OpenTts => "OpenTTS",
        }
    }

    pub const fn default_port(self) -> u16 {
        match self {
            Self::KittenTts => 8192,
            Self::OpenTts => 5500,
        }
    }

    /// Ordered dependency battery for this server.
    pub const fn probes(self) -> &'static [DependencyProbe] {
        match self {
            Self::KittenTts => &[
                DependencyProbe::PythonInstalled,
                DependencyProbe::KittenVenv,
                DependencyProbe::KittenPackages,
                DependencyProbe::KittenScript,
            ],
            Self::OpenTts => &[
                DependencyProbe::DockerInstalled,
                DependencyProbe::DockerRunning,
                DependencyProbe::OpenTtsImage,
            ],
        }
    }
}

impl fmt::Display for LocalServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_id().as_str())
    }
}

impl FromStr for LocalServer {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ProviderId>()?
            .local_server()
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// One precondition a self-hosted server needs before it can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyProbe {
    /// `python3` is on PATH.
    PythonInstalled,
    /// The KittenTTS virtual environment exists.
    KittenVenv,
    /// The KittenTTS packages import inside the venv.
    KittenPackages,
    /// The KittenTTS server script is present.
    KittenScript,
    /// The `docker` CLI is on PATH.
    DockerInstalled,
    /// The docker daemon answers `docker info`.
    DockerRunning,
    /// The OpenTTS image has been pulled.
    OpenTtsImage,
}

impl DependencyProbe {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PythonInstalled => "Python 3",
            Self::KittenVenv => "Virtual environment",
            Self::KittenPackages => "KittenTTS packages",
            Self::KittenScript => "Server script",
            Self::DockerInstalled => "Docker",
            Self::DockerRunning => "Docker daemon",
            Self::OpenTtsImage => "OpenTTS image",
        }
    }
}

/// Result of probing one precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCheck {
    pub ok: bool,
    pub label: String,
    pub detail: String,
    pub fix_hint: Option<String>,
}

impl DependencyCheck {
    pub fn passed(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            label: label.into(),
            detail: detail.into(),
            fix_hint: None,
        }
    }

    pub fn failed(
        label: impl Into<String>,
        detail: impl Into<String>,
        fix_hint: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            label: label.into(),
            detail: detail.into(),
            fix_hint: Some(fix_hint.into()),
        }
    }
}

/// The full battery result for one server, in battery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub server: LocalServer,
    pub checks: Vec<DependencyCheck>,
}

impl DependencyReport {
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|check| check.ok)
    }

    /// The first failing check, which is what the user should fix next.
    pub fn remediation_target(&self) -> Option<&DependencyCheck> {
        self.checks.iter().find(|check| !check.ok)
    }
}

/// Lifecycle state of a self-hosted server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    #[default]
    Idle,
    Starting,
    Running,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
        })
    }
}

/// Options passed through to the supervisor's start operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOptions {
    /// CPU threads for local inference; `None` lets the server decide.
    pub threads: Option<u32>,
    /// How long to wait for the server to answer after launching it.
    pub ready_timeout: Duration,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            threads: None,
            ready_timeout: Duration::from_secs(60),
        }
    }
}
