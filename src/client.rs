//! Harness client: owns the planned browser, the logger, and page tracking.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::browser::{BrowserError, BrowserRuntime, BrowserRuntimeError, HarnessBrowser};
use crate::config::HarnessConfig;
use crate::logging::{HarnessLogger, LogCallback, LogConfig};
use crate::page::VerifierPage;

/// Errors surfaced by [`HarnessClient`] and the page wrapper built on it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Browser(#[from] BrowserRuntimeError),
    #[error("CDP command failed: {0}")]
    Cdp(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to write screenshot: {source}")]
    Screenshot {
        #[source]
        source: std::io::Error,
    },
    #[error("timed out after {timeout_ms}ms waiting for {condition}")]
    Timeout { condition: String, timeout_ms: u64 },
    #[error("{0}")]
    Unsupported(&'static str),
    #[error("internal lock poisoned")]
    Poisoned,
}

/// Orchestrates browser launch and page lifecycle for a scenario run.
pub struct HarnessClient<R: BrowserRuntime> {
    browser: HarnessBrowser<R>,
    logger: Arc<HarnessLogger>,
    active_page: Mutex<Option<String>>,
}

impl<R: BrowserRuntime> std::fmt::Debug for HarnessClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.active_page.lock().map(|p| p.clone()).unwrap_or(None);
        f.debug_struct("HarnessClient")
            .field("plan", self.browser.plan())
            .field("active_page", &active)
            .finish()
    }
}

impl<R: BrowserRuntime> HarnessClient<R> {
    pub fn new(config: HarnessConfig, runtime: R) -> Result<Self, BrowserError> {
        let mut log_config = LogConfig::new(config.verbose);
        if let Some(text_logger) = config.logger.clone() {
            let sink: LogCallback = Arc::new(move |record| {
                let line = match &record.category {
                    Some(category) => format!("[{}] {}", category, record.message),
                    None => record.message.clone(),
                };
                text_logger(&line);
            });
            log_config.external_logger = Some(sink);
        }

        let browser = HarnessBrowser::new(config, runtime)?;
        Ok(Self {
            browser,
            logger: Arc::new(HarnessLogger::with_config(log_config)),
            active_page: Mutex::new(None),
        })
    }

    pub fn browser(&self) -> &HarnessBrowser<R> {
        &self.browser
    }

    pub fn config(&self) -> &HarnessConfig {
        self.browser.config()
    }

    pub fn logger(&self) -> Arc<HarnessLogger> {
        Arc::clone(&self.logger)
    }

    /// Execute the launch plan. Safe to call repeatedly; the runtime treats a
    /// second launch as a no-op.
    pub async fn ensure_initialized(&self) -> Result<(), ClientError> {
        self.browser.execute().await?;
        Ok(())
    }

    /// Open a page, mark it active, and return its id.
    pub async fn open_page(&self, url: &str) -> Result<String, ClientError> {
        self.ensure_initialized().await?;
        let page_id = self.browser.runtime().new_page(url).await?;
        self.set_active_page(&page_id)?;
        self.logger
            .debug(format!("Opened page {page_id} at {url}"), Some("nav"), None);
        Ok(page_id)
    }

    /// Wrap a page id in a [`VerifierPage`] handle.
    pub fn page(&self, page_id: impl Into<String>) -> VerifierPage<'_, R> {
        VerifierPage::new(self, page_id)
    }

    pub fn active_page_id(&self) -> Result<Option<String>, ClientError> {
        Ok(self
            .active_page
            .lock()
            .map_err(|_| ClientError::Poisoned)?
            .clone())
    }

    pub fn set_active_page(&self, page_id: &str) -> Result<(), ClientError> {
        *self
            .active_page
            .lock()
            .map_err(|_| ClientError::Poisoned)? = Some(page_id.to_string());
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.browser.shutdown().await?;
        Ok(())
    }
}
