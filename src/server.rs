//! Dev-server reachability probe.
//!
//! The scenarios assume a locally running dev server; probing it first turns
//! "net::ERR_CONNECTION_REFUSED somewhere inside the browser" into a clear
//! startup error.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::sleep;

const PROBE_INTERVAL: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("dev server at {url} not reachable within {timeout_secs}s")]
    Unreachable { url: String, timeout_secs: u64 },
    #[error("failed to construct probe client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },
}

/// Poll `url` until it answers an HTTP request or `timeout` elapses.
///
/// Any HTTP status counts as reachable; the scenarios care that something is
/// listening, not what it serves on `/`.
pub async fn wait_for_server(url: &str, timeout: Duration) -> Result<(), ServerError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|source| ServerError::Client { source })?;

    let start = Instant::now();
    loop {
        if client.get(url).send().await.is_ok() {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(ServerError::Unreachable {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        sleep(PROBE_INTERVAL).await;
    }
}
