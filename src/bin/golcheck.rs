//! golcheck CLI.
//!
//! Runs the UI verification scenarios against a locally running instance of
//! the Game of Life app and leaves screenshots under the output directory.
//!
//! Usage examples:
//!   Mobile controls check:
//!     $ GOLCHECK_CHROME_BIN=/path/to/chrome cargo run --bin golcheck -- controls
//!   Game-of-life run against a non-default port, watching the browser:
//!     $ cargo run --bin golcheck -- life --url http://localhost:5175 --show-browser
//!   Everything:
//!     $ cargo run --bin golcheck -- all -v

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use golcheck::client::HarnessClient;
use golcheck::config::{DEFAULT_BASE_URL, HarnessConfig, LoggerCallback, Verbosity};
use golcheck::runtime::ChromiumoxideRuntime;
use golcheck::scenario::{
    self, DESKTOP_VIEWPORT, LIFE_DEFAULT_URL, MOBILE_VIEWPORT, SPHERE_VIEWPORT,
};
use golcheck::server::wait_for_server;
use golcheck::types::{ScenarioKind, ScenarioReport};
use log::{info, warn};

#[derive(Parser)]
#[command(
    name = "golcheck",
    author,
    version,
    about = "UI verification scenarios for the Game of Life app"
)]
struct Cli {
    /// Increase log verbosity (pass multiple times for DEBUG).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify the mobile control layout at a phone-sized viewport.
    Controls(ScenarioArgs),
    /// Verify a seeded game-of-life run with the Glider preset.
    Life(ScenarioArgs),
    /// Verify the 3D sphere view.
    Sphere(ScenarioArgs),
    /// Run all three scenarios in sequence.
    All(ScenarioArgs),
}

#[derive(Args, Clone)]
struct ScenarioArgs {
    /// App URL (defaults: 5173, or 5174 for the life scenario).
    #[arg(long)]
    url: Option<String>,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    show_browser: bool,

    /// Directory screenshots are written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Chrome/Chromium executable (overrides GOLCHECK_CHROME_BIN).
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Seconds to wait for the dev server before giving up.
    #[arg(long, default_value_t = 10)]
    server_wait: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env_logger();

    let cli = Cli::parse();
    // Absent -v flags leave GOLCHECK_VERBOSE (or the default) in charge.
    let verbosity = (cli.verbose > 0).then(|| verbosity_from_count(cli.verbose));

    match cli.command {
        Command::Controls(args) => run_scenario(ScenarioKind::Controls, &args, verbosity).await?,
        Command::Life(args) => run_scenario(ScenarioKind::GameOfLife, &args, verbosity).await?,
        Command::Sphere(args) => run_scenario(ScenarioKind::Sphere, &args, verbosity).await?,
        Command::All(args) => {
            for kind in [
                ScenarioKind::Controls,
                ScenarioKind::GameOfLife,
                ScenarioKind::Sphere,
            ] {
                run_scenario(kind, &args, verbosity).await?;
            }
        }
    }

    Ok(())
}

async fn run_scenario(
    kind: ScenarioKind,
    args: &ScenarioArgs,
    verbosity: Option<Verbosity>,
) -> Result<()> {
    info!("Running {kind} verification");

    let config = build_config(kind, args, verbosity)?;

    wait_for_server(&config.base_url, Duration::from_secs(args.server_wait))
        .await
        .with_context(|| format!("is the app running at {}?", config.base_url))?;

    let client = HarnessClient::new(config, Arc::new(ChromiumoxideRuntime::new()))
        .context("failed to construct harness client")?;

    let result = match kind {
        ScenarioKind::Controls => scenario::run_controls(&client).await,
        ScenarioKind::GameOfLife => scenario::run_game_of_life(&client).await,
        ScenarioKind::Sphere => scenario::run_sphere(&client).await,
    };

    // The browser must terminate whether the scenario succeeded or not.
    let shutdown = client.shutdown().await;
    if let Err(err) = shutdown {
        warn!("runtime shutdown failed: {err}");
    }

    match result {
        Ok(report) => {
            print_report(&report);
            info!("Verification complete!");
            Ok(())
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!("{kind} scenario aborted"))),
    }
}

fn build_config(
    kind: ScenarioKind,
    args: &ScenarioArgs,
    verbosity: Option<Verbosity>,
) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::from_env().context("failed to load configuration")?;
    if let Some(verbosity) = verbosity {
        config.verbose = verbosity;
    }
    config.logger = Some(make_logger_callback());

    config.viewport = match kind {
        ScenarioKind::Controls => MOBILE_VIEWPORT,
        ScenarioKind::GameOfLife => DESKTOP_VIEWPORT,
        ScenarioKind::Sphere => SPHERE_VIEWPORT,
    };

    if let Some(url) = &args.url {
        config.base_url = url.clone();
    } else if kind == ScenarioKind::GameOfLife && config.base_url == DEFAULT_BASE_URL {
        config.base_url = LIFE_DEFAULT_URL.to_string();
    }

    if args.show_browser {
        config.headless = false;
    }
    if let Some(dir) = &args.output_dir {
        config.screenshot_dir = dir.clone();
    }
    if let Some(chrome) = &args.chrome {
        config.chrome_executable = Some(chrome.clone());
    }

    Ok(config)
}

fn print_report(report: &ScenarioReport) {
    for check in &report.checks {
        info!(
            "[{}] {}: {}",
            check.status.label(),
            check.name,
            check.detail
        );
    }
    if let Some(shot) = &report.screenshot {
        info!("Screenshot: {}", shot.display());
    }
    if report.has_failures() {
        warn!("{} verification finished with failed checks", report.scenario);
    }
}

fn make_logger_callback() -> LoggerCallback {
    Arc::new(|line: &str| {
        log::info!("{line}");
    })
}

fn verbosity_from_count(count: u8) -> Verbosity {
    match count {
        0 => Verbosity::Medium,
        _ => Verbosity::Detailed,
    }
}

fn init_env_logger() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }

    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp_secs()
        .try_init();
}
