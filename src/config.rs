//! Strongly-typed configuration for the verification harness.
//!
//! Values can be constructed from defaults, loaded from environment variables
//! (with optional `.env` support), or adjusted programmatically before a
//! scenario run. Free-form browser launch overrides travel as a JSON object so
//! callers can tweak Chromium flags without the config chasing every option.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};
use serde::{Deserialize as DeriveDeserialize, Serialize as DeriveSerialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

use crate::browser::Viewport;

type JsonObject = JsonMap<String, JsonValue>;

/// Default address of the dev server under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

/// Default directory screenshots are written to.
pub const DEFAULT_SCREENSHOT_DIR: &str = "verification";

/// Shared plain-text logger callback accepted by the configuration.
pub type LoggerCallback = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Errors surfaced while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid boolean '{value}' for {var}; expected 0/1/true/false")]
    InvalidBool { var: String, value: String },
    #[error("invalid verbosity '{value}' for {var}; expected 0, 1, or 2")]
    InvalidVerbosity { var: String, value: String },
}

/// Verbosity level for harness logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Minimal,
    Medium,
    Detailed,
}

impl Verbosity {
    fn as_u8(self) -> u8 {
        match self {
            Verbosity::Minimal => 0,
            Verbosity::Medium => 1,
            Verbosity::Detailed => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Verbosity::Minimal),
            1 => Some(Verbosity::Medium),
            2 => Some(Verbosity::Detailed),
            _ => None,
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Medium
    }
}

impl Serialize for Verbosity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Verbosity::from_u8(value).ok_or_else(|| {
            DeError::custom(format!(
                "invalid verbosity value {value}; expected 0, 1, or 2"
            ))
        })
    }
}

/// Configuration values for a scenario run.
#[derive(DeriveSerialize, DeriveDeserialize, Clone)]
#[serde(default)]
pub struct HarnessConfig {
    #[serde(alias = "baseUrl")]
    pub base_url: String,
    pub headless: bool,
    pub viewport: Viewport,
    #[serde(alias = "chromeExecutable")]
    pub chrome_executable: Option<PathBuf>,
    #[serde(alias = "screenshotDir")]
    pub screenshot_dir: PathBuf,
    /// Budget for element visibility/hide polls.
    #[serde(alias = "elementTimeoutMs")]
    pub element_timeout_ms: u64,
    /// Free-form launch overrides merged into the plan (cdpUrl, args, ...).
    #[serde(alias = "browserLaunchOptions")]
    pub browser_launch_options: JsonObject,
    pub verbose: Verbosity,
    #[serde(skip_serializing, skip_deserializing)]
    pub logger: Option<LoggerCallback>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            viewport: Viewport::default(),
            chrome_executable: None,
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
            element_timeout_ms: 5_000,
            browser_launch_options: JsonObject::new(),
            verbose: Verbosity::default(),
            logger: None,
        }
    }
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("base_url", &self.base_url)
            .field("headless", &self.headless)
            .field("viewport", &self.viewport)
            .field("chrome_executable", &self.chrome_executable)
            .field("screenshot_dir", &self.screenshot_dir)
            .field("element_timeout_ms", &self.element_timeout_ms)
            .field("verbose", &self.verbose)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl HarnessConfig {
    /// Build a configuration from defaults plus `GOLCHECK_*` environment
    /// variables. A `.env` file in the working directory is honoured first.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        let vars: Vec<(String, String)> = std::env::vars()
            .filter(|(name, _)| name.starts_with("GOLCHECK_"))
            .collect();
        Self::default().apply_env_pairs(&vars)
    }

    /// Apply environment-style overrides onto this configuration.
    ///
    /// Split out of [`from_env`](Self::from_env) so override parsing stays
    /// testable without mutating process state.
    pub fn apply_env_pairs(mut self, vars: &[(String, String)]) -> Result<Self, ConfigError> {
        for (name, value) in vars {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.as_str() {
                "GOLCHECK_BASE_URL" => self.base_url = value.to_string(),
                "GOLCHECK_CHROME_BIN" => self.chrome_executable = Some(PathBuf::from(value)),
                "GOLCHECK_SHOT_DIR" => self.screenshot_dir = PathBuf::from(value),
                "GOLCHECK_HEADLESS" => self.headless = parse_bool(name, value)?,
                "GOLCHECK_VERBOSE" => {
                    let parsed = value
                        .parse::<u8>()
                        .ok()
                        .and_then(Verbosity::from_u8)
                        .ok_or_else(|| ConfigError::InvalidVerbosity {
                            var: name.clone(),
                            value: value.to_string(),
                        })?;
                    self.verbose = parsed;
                }
                _ => {}
            }
        }
        Ok(self)
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_the_dev_setup() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, "http://localhost:5173");
        assert!(config.headless);
        assert_eq!(config.screenshot_dir, PathBuf::from("verification"));
        assert_eq!(config.element_timeout_ms, 5_000);
        assert_eq!(config.verbose, Verbosity::Medium);
    }

    #[test]
    fn env_pairs_override_defaults() {
        let config = HarnessConfig::default()
            .apply_env_pairs(&pairs(&[
                ("GOLCHECK_BASE_URL", "http://localhost:5174"),
                ("GOLCHECK_CHROME_BIN", "/usr/bin/chromium"),
                ("GOLCHECK_HEADLESS", "false"),
                ("GOLCHECK_SHOT_DIR", "/tmp/shots"),
                ("GOLCHECK_VERBOSE", "2"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:5174");
        assert_eq!(
            config.chrome_executable,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
        assert!(!config.headless);
        assert_eq!(config.screenshot_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(config.verbose, Verbosity::Detailed);
    }

    #[test]
    fn blank_and_unknown_vars_are_ignored() {
        let config = HarnessConfig::default()
            .apply_env_pairs(&pairs(&[
                ("GOLCHECK_BASE_URL", "   "),
                ("GOLCHECK_SOMETHING_ELSE", "value"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let err = HarnessConfig::default()
            .apply_env_pairs(&pairs(&[("GOLCHECK_HEADLESS", "maybe")]))
            .expect_err("should reject");
        assert!(err.to_string().contains("GOLCHECK_HEADLESS"));
    }

    #[test]
    fn invalid_verbosity_is_rejected() {
        let err = HarnessConfig::default()
            .apply_env_pairs(&pairs(&[("GOLCHECK_VERBOSE", "9")]))
            .expect_err("should reject");
        assert!(err.to_string().contains("expected 0, 1, or 2"));
    }

    #[test]
    fn config_round_trips_with_camel_case_aliases() {
        let json = serde_json::json!({
            "baseUrl": "http://localhost:9999",
            "headless": false,
            "screenshotDir": "artifacts",
            "elementTimeoutMs": 1234,
            "verbose": 0
        });
        let config: HarnessConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.base_url, "http://localhost:9999");
        assert!(!config.headless);
        assert_eq!(config.screenshot_dir, PathBuf::from("artifacts"));
        assert_eq!(config.element_timeout_ms, 1234);
        assert_eq!(config.verbose, Verbosity::Minimal);
    }
}
