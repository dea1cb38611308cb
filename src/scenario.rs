//! The three verification scenarios.
//!
//! Each scenario is a linear sequence over an already-constructed
//! [`HarnessClient`]: navigate, dismiss the intro overlay, poke the UI,
//! record checks, screenshot. The caller owns browser shutdown so cleanup
//! also happens when a scenario aborts mid-way.

use std::sync::Arc;

use serde_json::json;
use tokio::time::{Duration, sleep};

use crate::browser::Viewport;
use crate::client::{ClientError, HarnessClient};
use crate::page::{MatchMode, VerifierPage};
use crate::runtime::ChromiumoxideRuntime;
use crate::types::{Check, CheckStatus, ScenarioKind, ScenarioReport};

/// Label on the intro overlay's start button.
pub const INTRO_START_LABEL: &str = "Simulation Starten";
/// Label fragment on the sphere view toggle.
pub const SPHERE_TOGGLE_LABEL: &str = "3D Sphäre";
/// Label of the grid-size control that must be absent on mobile.
pub const SIZE_CONTROL_LABEL: &str = "Größe";
/// Glyph on the upward directional control button.
pub const DIRECTIONAL_ARROW: &str = "▲";
/// Preset pattern selected in the game-of-life run.
pub const PRESET_GLIDER: &str = "Glider";
/// Label on the playback start button (exact match; "Simulation Starten"
/// must not qualify).
pub const RUN_BUTTON_LABEL: &str = "Start";

/// Default address of the game-of-life dev server (the other scenarios use
/// the configured default port).
pub const LIFE_DEFAULT_URL: &str = "http://localhost:5174";

pub const MOBILE_VIEWPORT: Viewport = Viewport::new(400, 800);
pub const DESKTOP_VIEWPORT: Viewport = Viewport::new(1280, 800);
pub const SPHERE_VIEWPORT: Viewport = Viewport::new(1280, 720);

pub const CONTROLS_SCREENSHOT: &str = "mobile_controls.png";
pub const LIFE_SCREENSHOT: &str = "game_of_life_verified.png";
pub const SPHERE_SCREENSHOT: &str = "sphere_visual_check.png";
pub const ERROR_SCREENSHOT: &str = "error_state.png";

/// The intro overlay fades out without a DOM-observable end signal.
const INTRO_FADE: Duration = Duration::from_millis(1_000);
/// Window for a few generations to run after pressing Start.
const RUN_WINDOW: Duration = Duration::from_millis(1_000);
/// The 3D renderer needs a moment before the canvas holds a frame.
const RENDER_SETTLE: Duration = Duration::from_millis(2_000);

type LivePage<'client> = VerifierPage<'client, Arc<ChromiumoxideRuntime>>;

/// Mobile controls scenario: directional buttons present, size control gone.
pub async fn run_controls(
    client: &HarnessClient<Arc<ChromiumoxideRuntime>>,
) -> Result<ScenarioReport, ClientError> {
    let logger = client.logger();
    let timeout = client.config().element_timeout_ms;
    let mut report = ScenarioReport::new(ScenarioKind::Controls);

    logger.info("Navigating to app...", Some("nav"), None);
    let page_id = client.open_page(&client.config().base_url).await?;
    let page = client.page(page_id);

    logger.info("Closing intro...", Some("intro"), None);
    dismiss_intro(&page, timeout).await?;
    sleep(INTRO_FADE).await;

    let arrows = page
        .count_buttons(DIRECTIONAL_ARROW, MatchMode::Contains)
        .await?;
    let labels = if arrows == 0 {
        page.button_labels().await?
    } else {
        Vec::new()
    };
    let check = assess_directional_controls(arrows, &labels);
    match check.status {
        CheckStatus::Passed => {
            logger.info(
                "Found Up Arrow. Mobile controls visible.",
                Some("controls"),
                None,
            );
        }
        _ => {
            logger.error(
                "Up Arrow not found!",
                Some("controls"),
                Some(json!({ "buttons": labels })),
            );
        }
    }
    report.push(check);

    let size_occurrences = page.count_exact_text(SIZE_CONTROL_LABEL).await?;
    let check = assess_size_control(size_occurrences);
    match check.status {
        CheckStatus::Passed => {
            logger.info("Size control correctly removed.", Some("controls"), None);
        }
        _ => {
            logger.error("Size control still visible!", Some("controls"), None);
        }
    }
    report.push(check);

    let shot = client.config().screenshot_dir.join(CONTROLS_SCREENSHOT);
    page.screenshot(&shot).await?;
    logger.info(
        format!("Screenshot saved to {}", shot.display()),
        Some("shot"),
        None,
    );
    report.screenshot = Some(shot);

    Ok(report)
}

/// Game-of-life scenario: seed three cells, load the Glider preset, run.
pub async fn run_game_of_life(
    client: &HarnessClient<Arc<ChromiumoxideRuntime>>,
) -> Result<ScenarioReport, ClientError> {
    let logger = client.logger();
    let timeout = client.config().element_timeout_ms;
    let mut report = ScenarioReport::new(ScenarioKind::GameOfLife);

    logger.info("Loading page...", Some("nav"), None);
    let page_id = client.open_page(&client.config().base_url).await?;
    let page = client.page(page_id);

    logger.info("Starting Simulation from Intro...", Some("intro"), None);
    dismiss_intro(&page, timeout).await?;

    logger.info("Waiting for Canvas...", Some("canvas"), None);
    page.wait_for_visible("canvas", timeout).await?;
    report.push(Check::passed("canvas-visible", "rendering canvas is visible"));

    match page.bounding_box("canvas").await? {
        Some(bounds) => {
            let (cx, cy) = bounds.center();
            page.click_at(cx, cy).await?;
            page.click_at(cx + 20.0, cy).await?;
            page.click_at(cx - 20.0, cy).await?;
            report.push(Check::passed(
                "seed-cells",
                "clicked three cells around the canvas center",
            ));
        }
        None => {
            report.push(Check::warned(
                "seed-cells",
                "canvas bounding box unavailable; skipped seeding",
            ));
        }
    }

    logger.info("Selecting Glider...", Some("pattern"), None);
    if !page.select_option_by_label(PRESET_GLIDER).await? {
        return Err(ClientError::Unsupported(
            "no dropdown offers the Glider pattern",
        ));
    }
    report.push(Check::passed(
        "preset-glider",
        "Glider selected from the pattern dropdown",
    ));

    logger.info("Starting Game...", Some("run"), None);
    if !page.click_button(RUN_BUTTON_LABEL, MatchMode::Exact).await? {
        return Err(ClientError::Unsupported("no visible Start button to click"));
    }

    sleep(RUN_WINDOW).await;

    page.wait_for_visible("canvas", timeout).await?;
    report.push(Check::passed(
        "canvas-after-run",
        "canvas still visible after the run window",
    ));

    logger.info("Taking screenshot...", Some("shot"), None);
    let shot = client.config().screenshot_dir.join(LIFE_SCREENSHOT);
    page.screenshot(&shot).await?;
    report.screenshot = Some(shot);

    Ok(report)
}

/// Sphere scenario: switch into the 3D view and screenshot it. On failure an
/// error-state screenshot is captured before the error propagates.
pub async fn run_sphere(
    client: &HarnessClient<Arc<ChromiumoxideRuntime>>,
) -> Result<ScenarioReport, ClientError> {
    let logger = client.logger();
    let mut report = ScenarioReport::new(ScenarioKind::Sphere);

    logger.info("Navigating to app...", Some("nav"), None);
    let page_id = client.open_page(&client.config().base_url).await?;
    let page = client.page(page_id);

    match sphere_steps(client, &page, &mut report).await {
        Ok(()) => Ok(report),
        Err(err) => {
            logger.error(format!("Error: {err}"), Some("sphere"), None);
            let shot = client.config().screenshot_dir.join(ERROR_SCREENSHOT);
            if page.screenshot(&shot).await.is_ok() {
                logger.info(
                    format!("Error screenshot saved to {}", shot.display()),
                    Some("shot"),
                    None,
                );
            }
            Err(err)
        }
    }
}

async fn sphere_steps(
    client: &HarnessClient<Arc<ChromiumoxideRuntime>>,
    page: &LivePage<'_>,
    report: &mut ScenarioReport,
) -> Result<(), ClientError> {
    let logger = client.logger();
    let timeout = client.config().element_timeout_ms;

    logger.info("Looking for Start button...", Some("intro"), None);
    if page
        .button_visible(INTRO_START_LABEL, MatchMode::Exact)
        .await?
    {
        page.click_button(INTRO_START_LABEL, MatchMode::Exact)
            .await?;
        logger.info("Clicked Start button", Some("intro"), None);
    } else {
        logger.info(
            "Start button not found, maybe already started?",
            Some("intro"),
            None,
        );
    }

    page.wait_for_text_hidden(INTRO_START_LABEL, timeout).await?;
    logger.info("Intro dismissed", Some("intro"), None);

    logger.info("Switching to Sphere view...", Some("sphere"), None);
    if !page
        .click_button(SPHERE_TOGGLE_LABEL, MatchMode::Contains)
        .await?
    {
        return Err(ClientError::Unsupported("no visible sphere view toggle"));
    }
    logger.info("Clicked Sphere button", Some("sphere"), None);

    page.wait_for_visible("canvas", timeout).await?;
    logger.info("Canvas found", Some("sphere"), None);
    report.push(Check::passed(
        "sphere-canvas",
        "canvas visible in sphere view",
    ));

    sleep(RENDER_SETTLE).await;

    let shot = client.config().screenshot_dir.join(SPHERE_SCREENSHOT);
    page.screenshot(&shot).await?;
    logger.info(
        format!("Screenshot saved to {}", shot.display()),
        Some("shot"),
        None,
    );
    report.screenshot = Some(shot);

    Ok(())
}

/// Wait for the intro start button and click it.
async fn dismiss_intro(page: &LivePage<'_>, timeout_ms: u64) -> Result<(), ClientError> {
    page.wait_for_button(INTRO_START_LABEL, MatchMode::Exact, timeout_ms)
        .await?;
    if !page
        .click_button(INTRO_START_LABEL, MatchMode::Exact)
        .await?
    {
        return Err(ClientError::Unsupported(
            "intro start button vanished before it could be clicked",
        ));
    }
    Ok(())
}

/// Judge the directional-control observation: at least one arrow button must
/// be visible at the mobile viewport.
pub(crate) fn assess_directional_controls(arrow_count: u64, button_labels: &[String]) -> Check {
    if arrow_count > 0 {
        Check::passed(
            "directional-controls",
            format!("{arrow_count} directional button(s) visible"),
        )
    } else {
        Check::warned(
            "directional-controls",
            format!("no arrow buttons found; page buttons: {button_labels:?}"),
        )
    }
}

/// Judge the size-control observation: the label must be gone on mobile.
pub(crate) fn assess_size_control(occurrences: u64) -> Check {
    if occurrences == 0 {
        Check::passed("size-control-absent", "size control correctly removed")
    } else {
        Check::failed(
            "size-control-absent",
            format!("size control still visible ({occurrences} occurrence(s))"),
        )
    }
}
