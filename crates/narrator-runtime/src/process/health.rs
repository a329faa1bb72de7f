//! Readiness polling for freshly launched speech servers.

use std::time::Duration;

use anyhow::Result;
use tokio::process::Child;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Delay between readiness probes.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-request timeout for a single probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// How a readiness wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The server answered with a success status.
    Ready,
    /// The deadline passed without a successful answer.
    TimedOut,
    /// The tracked process exited before becoming ready.
    Exited(String),
}

/// Whether something already answers 2xx at `url`, with a single probe.
pub async fn is_http_ready(url: &str) -> bool {
    let Ok(client) = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() else {
        return false;
    };
    client
        .get(url)
        .send()
        .await
        .is_ok_and(|response| response.status().is_success())
}

/// Poll `url` until it answers 2xx, the deadline passes, or `child` exits.
pub async fn wait_for_http_ready(
    url: &str,
    timeout: Duration,
    mut child: Option<&mut Child>,
) -> Result<Readiness> {
    info!(url, "Waiting for server to become ready");
    let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(child) = child.as_deref_mut() {
            if let Some(status) = child.try_wait()? {
                return Ok(Readiness::Exited(status.to_string()));
            }
        }

        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(url, "Server is ready");
                return Ok(Readiness::Ready);
            }
            Ok(response) => {
                debug!(url, status = %response.status(), "Readiness probe rejected, retrying");
            }
            Err(e) => {
                debug!(url, error = %e, "Readiness probe failed, retrying");
            }
        }

        if Instant::now() >= deadline {
            return Ok(Readiness::TimedOut);
        }
        sleep(POLL_INTERVAL).await;
    }
}
