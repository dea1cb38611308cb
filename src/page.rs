//! High-level wrapper around a harness-managed page.
//!
//! The generic handle only knows its id; the interaction surface (navigation,
//! JS evaluation, input dispatch, screenshots, readiness polls) is implemented
//! for the chromiumoxide runtime, which is the only one that can reach a real
//! CDP page.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as ChromiumPage;
use serde_json::Value as JsonValue;
use tokio::fs;
use tokio::time::{Duration, sleep};

use crate::browser::BrowserRuntime;
use crate::client::{ClientError, HarnessClient};
use crate::runtime::ChromiumoxideRuntime;
use crate::types::BoundingBox;

mod dom;

pub use dom::MatchMode;

/// Interval between readiness poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Page handle tied to the client that opened it.
pub struct VerifierPage<'client, R: BrowserRuntime> {
    client: &'client HarnessClient<R>,
    page_id: String,
}

impl<'client, R> VerifierPage<'client, R>
where
    R: BrowserRuntime,
{
    pub fn new(client: &'client HarnessClient<R>, page_id: impl Into<String>) -> Self {
        Self {
            client,
            page_id: page_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.page_id
    }
}

fn cdp_error(err: impl std::fmt::Display) -> ClientError {
    ClientError::Cdp(err.to_string())
}

impl VerifierPage<'_, Arc<ChromiumoxideRuntime>> {
    async fn chromium_page(&self) -> Result<ChromiumPage, ClientError> {
        self.client
            .browser()
            .runtime()
            .page(&self.page_id)
            .await
            .map_err(ClientError::Browser)?
            .ok_or(ClientError::Unsupported("page handle unavailable"))
    }

    /// Navigate and wait for the load to finish.
    pub async fn goto(&self, url: &str) -> Result<(), ClientError> {
        let page = self.chromium_page().await?;
        page.goto(url).await.map_err(cdp_error)?;
        page.wait_for_navigation().await.map_err(cdp_error)?;
        Ok(())
    }

    pub async fn evaluate_expression(&self, expression: &str) -> Result<JsonValue, ClientError> {
        let page = self.chromium_page().await?;
        let result = page.evaluate(expression).await.map_err(cdp_error)?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    /// Dispatch a trusted left click at page coordinates (move, press,
    /// release), the way a pointer would deliver it.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<(), ClientError> {
        let page = self.chromium_page().await?;

        let moved = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y)
            .build()
            .map_err(ClientError::Cdp)?;
        page.execute(moved).await.map_err(cdp_error)?;

        let pressed = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(ClientError::Cdp)?;
        page.execute(pressed).await.map_err(cdp_error)?;

        let released = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(ClientError::Cdp)?;
        page.execute(released).await.map_err(cdp_error)?;

        Ok(())
    }

    /// Capture a PNG screenshot, creating parent directories as needed.
    pub async fn screenshot(&self, path: &Path) -> Result<(), ClientError> {
        let page = self.chromium_page().await?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let bytes = page.screenshot(params).await.map_err(cdp_error)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ClientError::Screenshot { source })?;
            }
        }
        fs::write(path, &bytes)
            .await
            .map_err(|source| ClientError::Screenshot { source })?;

        self.client.logger().debug(
            format!("Screenshot written to {}", path.display()),
            Some("shot"),
            None,
        );
        Ok(())
    }

    async fn wait_until(
        &self,
        condition: &str,
        script: &str,
        timeout_ms: u64,
    ) -> Result<(), ClientError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let value = self.evaluate_expression(script).await?;
            if value.as_bool().unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ClientError::Timeout {
                    condition: condition.to_string(),
                    timeout_ms,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for the first element matching `selector` to become visible.
    pub async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<(), ClientError> {
        let script = dom::is_visible_script(selector)?;
        self.wait_until(&format!("'{selector}' to be visible"), &script, timeout_ms)
            .await
    }

    /// Wait until no visible element contains `text` any more.
    pub async fn wait_for_text_hidden(&self, text: &str, timeout_ms: u64) -> Result<(), ClientError> {
        let script = dom::text_hidden_script(text)?;
        self.wait_until(&format!("'{text}' to be hidden"), &script, timeout_ms)
            .await
    }

    /// Wait for a button with the given label to become visible.
    pub async fn wait_for_button(
        &self,
        label: &str,
        mode: MatchMode,
        timeout_ms: u64,
    ) -> Result<(), ClientError> {
        let script = dom::button_count_script(label, mode)?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let value = self.evaluate_expression(&script).await?;
            if value.as_u64().unwrap_or(0) > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ClientError::Timeout {
                    condition: format!("button '{label}' to be visible"),
                    timeout_ms,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// True when a visible button with the given label exists right now.
    pub async fn button_visible(&self, label: &str, mode: MatchMode) -> Result<bool, ClientError> {
        let script = dom::button_count_script(label, mode)?;
        let value = self.evaluate_expression(&script).await?;
        Ok(value.as_u64().unwrap_or(0) > 0)
    }

    /// Count visible buttons with the given label.
    pub async fn count_buttons(&self, label: &str, mode: MatchMode) -> Result<u64, ClientError> {
        let script = dom::button_count_script(label, mode)?;
        let value = self.evaluate_expression(&script).await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    /// Click the first visible button with the given label. Returns whether a
    /// button was found.
    pub async fn click_button(&self, label: &str, mode: MatchMode) -> Result<bool, ClientError> {
        let script = dom::click_button_script(label, mode)?;
        let value = self.evaluate_expression(&script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Trimmed labels of every button on the page, for diagnostics.
    pub async fn button_labels(&self) -> Result<Vec<String>, ClientError> {
        let script = dom::button_labels_script();
        let value = self.evaluate_expression(&script).await?;
        let labels = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(labels)
    }

    /// Count leaf elements whose trimmed text equals `text` exactly.
    pub async fn count_exact_text(&self, text: &str) -> Result<u64, ClientError> {
        let script = dom::exact_text_count_script(text)?;
        let value = self.evaluate_expression(&script).await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    /// Bounding box of the first element matching `selector`, if present.
    pub async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>, ClientError> {
        let script = dom::bounding_box_script(selector)?;
        let value = self.evaluate_expression(&script).await?;
        if value.is_null() {
            return Ok(None);
        }
        let bounds: BoundingBox = serde_json::from_value(value)?;
        Ok(Some(bounds))
    }

    /// Select the option labelled `option_label` in whichever `<select>`
    /// offers it. Returns whether a matching dropdown existed.
    pub async fn select_option_by_label(&self, option_label: &str) -> Result<bool, ClientError> {
        let script = dom::select_option_script(option_label)?;
        let value = self.evaluate_expression(&script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}
