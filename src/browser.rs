//! Browser launch planning.
//!
//! This module turns the harness configuration into a strongly-typed launch
//! plan: either attach to an already-running Chromium over CDP or launch a
//! fresh local instance. The [`BrowserRuntime`] trait is the seam between the
//! plan and the actual CDP runtime so tests can substitute a mock.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::config::HarnessConfig;

/// Error surfaced while deriving a launch plan from the configuration.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to parse browser launch overrides: {source}")]
    InvalidLaunchOptions {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors reported by a [`BrowserRuntime`] implementation.
#[derive(Debug, Error)]
pub enum BrowserRuntimeError {
    #[error("browser runtime error: {0}")]
    Message(String),
    #[error("browser runtime not initialized")]
    NotInitialized,
    #[error("browser runtime feature unsupported: {0}")]
    Unsupported(String),
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Viewport { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(1280, 720)
    }
}

/// Options applied when launching a local Chromium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchOptions {
    pub headless: bool,
    pub args: Vec<String>,
    pub viewport: Viewport,
}

/// Free-form overrides parsed out of `HarnessConfig::browser_launch_options`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchOverrides {
    #[serde(alias = "cdp_url")]
    pub cdp_url: Option<String>,
    #[serde(alias = "user_data_dir")]
    pub user_data_dir: Option<String>,
    pub headless: Option<bool>,
    pub args: Option<Vec<String>>,
    pub viewport: Option<Viewport>,
    #[serde(alias = "chrome_executable")]
    pub chrome_executable: Option<String>,
}

/// How the runtime should obtain a browser.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchStrategy {
    /// Attach to an existing browser via its CDP websocket endpoint.
    AttachCdp { url: String },
    /// Launch a Chromium process, optionally with a persistent profile.
    Launch { user_data_dir: Option<PathBuf> },
}

/// Normalised execution plan handed to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchPlan {
    pub strategy: LaunchStrategy,
    pub options: LaunchOptions,
    pub chrome_executable: Option<PathBuf>,
}

impl LaunchPlan {
    /// Derive the launch plan from the harness configuration.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, BrowserError> {
        let overrides: LaunchOverrides =
            serde_json::from_value(JsonValue::Object(config.browser_launch_options.clone()))
                .map_err(|source| BrowserError::InvalidLaunchOptions { source })?;

        let strategy = match overrides.cdp_url {
            Some(url) => LaunchStrategy::AttachCdp { url },
            None => LaunchStrategy::Launch {
                user_data_dir: overrides.user_data_dir.map(PathBuf::from),
            },
        };

        let options = LaunchOptions {
            headless: overrides.headless.unwrap_or(config.headless),
            args: overrides
                .args
                .unwrap_or_else(|| vec!["--disable-blink-features=AutomationControlled".into()]),
            viewport: overrides.viewport.unwrap_or(config.viewport),
        };

        let chrome_executable = overrides
            .chrome_executable
            .map(PathBuf::from)
            .or_else(|| config.chrome_executable.clone());

        Ok(LaunchPlan {
            strategy,
            options,
            chrome_executable,
        })
    }
}

/// Adapter that bridges a [`LaunchPlan`] to an actual browser runtime.
#[async_trait]
pub trait BrowserRuntime: Send + Sync {
    async fn launch(&self, plan: &LaunchPlan) -> Result<(), BrowserRuntimeError>;

    async fn shutdown(&self) -> Result<(), BrowserRuntimeError> {
        Err(BrowserRuntimeError::Unsupported(
            "runtime shutdown not implemented".to_string(),
        ))
    }

    async fn new_page(&self, url: &str) -> Result<String, BrowserRuntimeError>;

    async fn page_content(&self, page_id: &str) -> Result<Option<String>, BrowserRuntimeError>;

    async fn list_pages(&self) -> Result<Vec<String>, BrowserRuntimeError>;
}

/// Browser handle owning the plan and the runtime that executes it.
pub struct HarnessBrowser<R: BrowserRuntime> {
    config: HarnessConfig,
    plan: LaunchPlan,
    runtime: R,
}

impl<R: BrowserRuntime> HarnessBrowser<R> {
    pub fn new(config: HarnessConfig, runtime: R) -> Result<Self, BrowserError> {
        let plan = LaunchPlan::from_config(&config)?;
        Ok(Self {
            config,
            plan,
            runtime,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub async fn execute(&self) -> Result<(), BrowserRuntimeError> {
        self.runtime.launch(&self.plan).await
    }

    pub async fn shutdown(&self) -> Result<(), BrowserRuntimeError> {
        self.runtime.shutdown().await
    }
}

impl<R: BrowserRuntime> fmt::Debug for HarnessBrowser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessBrowser")
            .field("plan", &self.plan)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn plan_defaults_to_launching_headless() {
        let config = HarnessConfig::default();
        let plan = LaunchPlan::from_config(&config).unwrap();
        match plan.strategy {
            LaunchStrategy::Launch { user_data_dir } => assert!(user_data_dir.is_none()),
            other => panic!("expected launch strategy, got {other:?}"),
        }
        assert!(plan.options.headless);
        assert_eq!(plan.options.viewport, Viewport::new(1280, 720));
        assert_eq!(
            plan.options.args,
            vec!["--disable-blink-features=AutomationControlled".to_string()]
        );
    }

    #[test]
    fn cdp_url_override_switches_to_attach() {
        let mut config = HarnessConfig::default();
        config
            .browser_launch_options
            .insert("cdpUrl".into(), json!("ws://127.0.0.1:9222/devtools"));

        let plan = LaunchPlan::from_config(&config).unwrap();
        assert_eq!(
            plan.strategy,
            LaunchStrategy::AttachCdp {
                url: "ws://127.0.0.1:9222/devtools".into()
            }
        );
    }

    #[test]
    fn overrides_beat_config_values() {
        let mut config = HarnessConfig::default();
        config.headless = true;
        config.chrome_executable = Some("/from/config".into());
        config
            .browser_launch_options
            .insert("headless".into(), json!(false));
        config
            .browser_launch_options
            .insert("args".into(), json!(["--foo"]));
        config
            .browser_launch_options
            .insert("viewport".into(), json!({"width": 400, "height": 800}));
        config
            .browser_launch_options
            .insert("chromeExecutable".into(), json!("/from/overrides"));

        let plan = LaunchPlan::from_config(&config).unwrap();
        assert!(!plan.options.headless);
        assert_eq!(plan.options.args, vec!["--foo".to_string()]);
        assert_eq!(plan.options.viewport, Viewport::new(400, 800));
        assert_eq!(plan.chrome_executable, Some(PathBuf::from("/from/overrides")));
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let mut config = HarnessConfig::default();
        config
            .browser_launch_options
            .insert("viewport".into(), json!("not-a-viewport"));
        let err = LaunchPlan::from_config(&config).expect_err("should reject");
        assert!(err.to_string().contains("launch overrides"));
    }

    #[derive(Default)]
    struct RecordingRuntime {
        launches: Mutex<Vec<LaunchPlan>>,
        shutdowns: Mutex<usize>,
    }

    #[async_trait]
    impl BrowserRuntime for RecordingRuntime {
        async fn launch(&self, plan: &LaunchPlan) -> Result<(), BrowserRuntimeError> {
            self.launches.lock().unwrap().push(plan.clone());
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), BrowserRuntimeError> {
            *self.shutdowns.lock().unwrap() += 1;
            Ok(())
        }

        async fn new_page(&self, _url: &str) -> Result<String, BrowserRuntimeError> {
            Ok("page-0".into())
        }

        async fn page_content(
            &self,
            _page_id: &str,
        ) -> Result<Option<String>, BrowserRuntimeError> {
            Ok(None)
        }

        async fn list_pages(&self) -> Result<Vec<String>, BrowserRuntimeError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn browser_executes_and_shuts_down_via_runtime() {
        let browser = HarnessBrowser::new(HarnessConfig::default(), RecordingRuntime::default())
            .expect("browser");
        browser.execute().await.expect("execute");
        browser.shutdown().await.expect("shutdown");

        assert_eq!(browser.runtime().launches.lock().unwrap().len(), 1);
        assert_eq!(*browser.runtime().shutdowns.lock().unwrap(), 1);
    }
}
