//! Chromiumoxide-based browser runtime.
//!
//! Implements [`BrowserRuntime`](crate::browser::BrowserRuntime) on top of the
//! `chromiumoxide` crate: launch a local Chromium (or attach to an existing
//! CDP endpoint), keep the handler loop polled on a background task, and track
//! pages by target id so the page wrapper can reach its CDP handle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    page::Page as ChromiumPage,
};
use futures_util::StreamExt;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::browser::{BrowserRuntime, BrowserRuntimeError, LaunchPlan, LaunchStrategy};

pub struct ChromiumoxideRuntime {
    state: Arc<Mutex<Option<RuntimeState>>>,
}

struct RuntimeState {
    browser: Arc<Browser>,
    _handler: JoinHandle<()>,
    pages: HashMap<String, ChromiumPage>,
}

impl ChromiumoxideRuntime {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// Fetch the CDP page handle for a previously opened page.
    pub async fn page(&self, page_id: &str) -> Result<Option<ChromiumPage>, BrowserRuntimeError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or(BrowserRuntimeError::NotInitialized)?;
        Ok(state.pages.get(page_id).cloned())
    }

    async fn install(&self, browser: Browser, handler_task: JoinHandle<()>) {
        let new_state = RuntimeState {
            browser: Arc::new(browser),
            _handler: handler_task,
            pages: HashMap::new(),
        };

        let old_state = {
            let mut guard = self.state.lock().await;
            guard.replace(new_state)
        };

        if let Some(state) = old_state {
            cleanup_state(state);
        }
    }

    /// Register pages the browser already had open (e.g. the initial blank
    /// tab) so they are reachable by target id.
    async fn populate_initial_pages(&self) -> Result<(), BrowserRuntimeError> {
        let browser = {
            let guard = self.state.lock().await;
            let state = guard.as_ref().ok_or(BrowserRuntimeError::NotInitialized)?;
            state.browser.clone()
        };

        let pages = browser.pages().await.map_err(map_chromiumoxide_error)?;
        if pages.is_empty() {
            return Ok(());
        }

        let mut guard = self.state.lock().await;
        if let Some(state) = guard.as_mut() {
            for page in pages {
                let id = page.target_id().as_ref().to_string();
                state.pages.entry(id).or_insert(page);
            }
        }

        Ok(())
    }
}

impl Default for ChromiumoxideRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserRuntime for ChromiumoxideRuntime {
    async fn launch(&self, plan: &LaunchPlan) -> Result<(), BrowserRuntimeError> {
        if self.state.lock().await.is_some() {
            return Ok(());
        }

        let (browser, handler_task) = match &plan.strategy {
            LaunchStrategy::AttachCdp { url } => {
                let (browser, handler) = Browser::connect(url.as_str())
                    .await
                    .map_err(map_chromiumoxide_error)?;
                (browser, spawn_handler(handler))
            }
            LaunchStrategy::Launch { .. } => {
                let config = build_config(plan)?;
                let (browser, handler) = Browser::launch(config)
                    .await
                    .map_err(map_chromiumoxide_error)?;
                (browser, spawn_handler(handler))
            }
        };

        self.install(browser, handler_task).await;
        self.populate_initial_pages().await?;

        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BrowserRuntimeError> {
        let state = {
            let mut guard = self.state.lock().await;
            guard.take()
        };

        if let Some(state) = state {
            cleanup_state(state);
        }

        Ok(())
    }

    async fn new_page(&self, url: &str) -> Result<String, BrowserRuntimeError> {
        let browser = {
            let guard = self.state.lock().await;
            let state = guard.as_ref().ok_or(BrowserRuntimeError::NotInitialized)?;
            state.browser.clone()
        };

        let page = browser
            .new_page(url)
            .await
            .map_err(map_chromiumoxide_error)?;
        let page_id = page.target_id().as_ref().to_string();

        let mut guard = self.state.lock().await;
        if let Some(state) = guard.as_mut() {
            state.pages.insert(page_id.clone(), page);
        }

        Ok(page_id)
    }

    async fn page_content(&self, page_id: &str) -> Result<Option<String>, BrowserRuntimeError> {
        let page = self.page(page_id).await?;
        if let Some(page) = page {
            let content = page.content().await.map_err(map_chromiumoxide_error)?;
            Ok(Some(content))
        } else {
            Ok(None)
        }
    }

    async fn list_pages(&self) -> Result<Vec<String>, BrowserRuntimeError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or(BrowserRuntimeError::NotInitialized)?;
        Ok(state.pages.keys().cloned().collect())
    }
}

#[async_trait]
impl BrowserRuntime for Arc<ChromiumoxideRuntime> {
    async fn launch(&self, plan: &LaunchPlan) -> Result<(), BrowserRuntimeError> {
        (**self).launch(plan).await
    }

    async fn shutdown(&self) -> Result<(), BrowserRuntimeError> {
        (**self).shutdown().await
    }

    async fn new_page(&self, url: &str) -> Result<String, BrowserRuntimeError> {
        (**self).new_page(url).await
    }

    async fn page_content(&self, page_id: &str) -> Result<Option<String>, BrowserRuntimeError> {
        (**self).page_content(page_id).await
    }

    async fn list_pages(&self) -> Result<Vec<String>, BrowserRuntimeError> {
        (**self).list_pages().await
    }
}

fn build_config(plan: &LaunchPlan) -> Result<BrowserConfig, BrowserRuntimeError> {
    let options = &plan.options;

    let viewport = chromiumoxide::handler::viewport::Viewport {
        width: options.viewport.width,
        height: options.viewport.height,
        device_scale_factor: None,
        emulating_mobile: false,
        is_landscape: options.viewport.width >= options.viewport.height,
        has_touch: false,
    };

    let mut builder = BrowserConfig::builder();

    if let Some(path) = &plan.chrome_executable {
        builder = builder.chrome_executable(path);
    }

    let builder = builder.viewport(viewport).args(options.args.clone());

    let builder = if options.headless {
        builder
    } else {
        builder.with_head()
    };

    let builder = match &plan.strategy {
        LaunchStrategy::AttachCdp { .. } => builder,
        LaunchStrategy::Launch { user_data_dir } => match user_data_dir {
            Some(dir) => builder.user_data_dir(dir),
            None => builder,
        },
    };

    builder.build().map_err(BrowserRuntimeError::Message)
}

fn map_chromiumoxide_error<E: std::fmt::Display>(err: E) -> BrowserRuntimeError {
    BrowserRuntimeError::Message(err.to_string())
}

fn spawn_handler(mut handler: chromiumoxide::handler::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = handler.next().await {
            if let Err(err) = result {
                eprintln!("chromiumoxide handler error: {err}");
            }
        }
    })
}

fn cleanup_state(mut state: RuntimeState) {
    // Aborting the handler tears the websocket down; the launched Chromium
    // process is reaped when the Browser handle drops.
    state._handler.abort();
    state.pages.clear();
}
