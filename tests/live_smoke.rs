//! End-to-end smoke test against a live app instance.
//!
//! Requires:
//! - `GOLCHECK_CHROME_BIN` pointing to a Chrome/Chromium binary.
//! - The app's dev server running at `GOLCHECK_BASE_URL` (default
//!   `http://localhost:5173`).
//! The test is skipped, not failed, when either is missing.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use golcheck::client::HarnessClient;
use golcheck::config::HarnessConfig;
use golcheck::runtime::ChromiumoxideRuntime;
use golcheck::scenario;
use golcheck::server::wait_for_server;

#[tokio::test]
async fn controls_scenario_runs_against_live_app() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let chrome_bin = match env::var("GOLCHECK_CHROME_BIN") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => {
            eprintln!("skipping live smoke test: GOLCHECK_CHROME_BIN not set");
            return Ok(());
        }
    };

    if !chrome_bin.exists() {
        eprintln!(
            "skipping live smoke test: chrome executable not found at {}",
            chrome_bin.display()
        );
        return Ok(());
    }

    let base_url =
        env::var("GOLCHECK_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
    if wait_for_server(&base_url, Duration::from_secs(2)).await.is_err() {
        eprintln!("skipping live smoke test: no dev server at {base_url}");
        return Ok(());
    }

    let shot_dir = tempfile::tempdir().context("failed to create screenshot dir")?;

    let mut config = HarnessConfig::default();
    config.base_url = base_url;
    config.headless = true;
    config.viewport = scenario::MOBILE_VIEWPORT;
    config.chrome_executable = Some(chrome_bin);
    config.screenshot_dir = shot_dir.path().to_path_buf();

    let runtime = Arc::new(ChromiumoxideRuntime::new());
    let client = HarnessClient::new(config, runtime).context("failed to construct client")?;

    let result = scenario::run_controls(&client).await;

    // Cleanup must hold regardless of the scenario outcome.
    client.shutdown().await.context("shutdown failed")?;

    let report = result.context("controls scenario failed")?;
    assert!(!report.checks.is_empty(), "expected recorded checks");

    let shot = report
        .screenshot
        .clone()
        .context("expected a screenshot path in the report")?;
    assert!(
        shot.exists(),
        "screenshot should have been written to {}",
        shot.display()
    );

    Ok(())
}
