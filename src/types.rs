//! Report types shared between scenarios and the CLI.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The three verification scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    Controls,
    GameOfLife,
    Sphere,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioKind::Controls => "controls",
            ScenarioKind::GameOfLife => "game-of-life",
            ScenarioKind::Sphere => "sphere",
        };
        f.write_str(name)
    }
}

/// Outcome of a single observation inside a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warned,
    Failed,
}

impl CheckStatus {
    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Passed => "PASS",
            CheckStatus::Warned => "WARN",
            CheckStatus::Failed => "FAIL",
        }
    }
}

/// A named pass/warn/fail observation with human-readable detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl Check {
    pub fn passed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Passed,
            detail: detail.into(),
        }
    }

    pub fn warned(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warned,
            detail: detail.into(),
        }
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Failed,
            detail: detail.into(),
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioKind,
    pub checks: Vec<Check>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl ScenarioReport {
    pub fn new(scenario: ScenarioKind) -> Self {
        Self {
            scenario,
            checks: Vec::new(),
            screenshot: None,
        }
    }

    pub fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.status == CheckStatus::Failed)
    }

    pub fn has_warnings(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.status == CheckStatus::Warned)
    }
}

/// Element geometry as reported by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Page coordinates of the box center.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tracks_failures_and_warnings() {
        let mut report = ScenarioReport::new(ScenarioKind::Controls);
        assert!(!report.has_failures());

        report.push(Check::passed("arrows", "found 4"));
        report.push(Check::warned("extra", "unexpected button"));
        assert!(!report.has_failures());
        assert!(report.has_warnings());

        report.push(Check::failed("size-control", "still visible"));
        assert!(report.has_failures());
    }

    #[test]
    fn bounding_box_center_is_midpoint() {
        let bounds = BoundingBox {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(bounds.center(), (200.0, 100.0));
    }

    #[test]
    fn bounding_box_parses_rect_json() {
        let value = serde_json::json!({"x": 1.5, "y": 2.0, "width": 3.0, "height": 4.0});
        let bounds: BoundingBox = serde_json::from_value(value).unwrap();
        assert_eq!(bounds.x, 1.5);
        assert_eq!(bounds.height, 4.0);
    }

    #[test]
    fn report_serializes_kebab_case_scenario() {
        let report = ScenarioReport::new(ScenarioKind::GameOfLife);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenario"], "game-of-life");
    }
}
