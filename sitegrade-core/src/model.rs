//! Declarative inputs of the pipeline: the check-definitions document and
//! the scoring-model document. Both are loaded once per run; anything
//! malformed here is a [`crate::error::AuditError::Config`] — the only
//! error class that aborts an audit.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    /// Rank used for recommendation ordering: critical=4 .. info=0.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Partial,
    Fail,
    Na,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Partial => "partial",
            CheckStatus::Fail => "fail",
            CheckStatus::Na => "na",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "OK",
            CheckStatus::Partial => "Partially OK",
            CheckStatus::Fail => "Failed",
            CheckStatus::Na => "Not applicable / not executed",
        }
    }
}

/// Which subset of crawled pages a check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Homepage,
    SampleSet,
    Site,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Homepage => "homepage",
            Scope::SampleSet => "sample_set",
            Scope::Site => "site",
        }
    }
}

fn default_scope() -> Scope {
    Scope::SampleSet
}

fn default_fix_who() -> String {
    "developer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub id: String,
    pub category: String,
    pub name: String,
    pub severity: Severity,
    #[serde(default)]
    pub is_best_practice: bool,
    #[serde(default)]
    pub affects_indexing: bool,
    #[serde(default = "default_scope")]
    pub applies_to: Scope,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub fix_action: String,
    #[serde(default = "default_fix_who")]
    pub fix_who: String,
    #[serde(default)]
    pub fix_effort: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksDocument {
    #[serde(default)]
    pub schema_version: String,
    pub checks: Vec<CheckDefinition>,
}

impl ChecksDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AuditError::Config(format!("invalid checks document: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!("cannot read checks document {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBand {
    pub min: f64,
    pub grade: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreCap {
    pub id: String,
    pub name: String,
    pub if_failed_any: Vec<String>,
    pub max_overall_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationPriority {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    10
}

impl Default for RecommendationPriority {
    fn default() -> Self {
        Self { top_n: default_top_n() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringModel {
    pub category_weights: HashMap<String, f64>,
    pub severity_weights: HashMap<String, f64>,
    /// status -> score value; `na` maps to null and contributes nothing.
    pub result_values: HashMap<String, Option<f64>>,
    pub grading: Vec<GradeBand>,
    #[serde(default)]
    pub caps: Vec<ScoreCap>,
    #[serde(default)]
    pub recommendation_priority: RecommendationPriority,
}

impl ScoringModel {
    pub fn status_value(&self, status: CheckStatus) -> Option<f64> {
        self.result_values.get(status.as_str()).copied().flatten()
    }

    pub fn severity_weight(&self, severity: Severity) -> f64 {
        self.severity_weights.get(severity.as_str()).copied().unwrap_or(0.0)
    }

    pub fn category_weight(&self, category: &str) -> f64 {
        self.category_weights.get(category).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringDocument {
    #[serde(default)]
    pub schema_version: String,
    pub scoring: ScoringModel,
}

impl ScoringDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AuditError::Config(format!("invalid scoring document: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!("cannot read scoring document {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_round_trip() {
        let parsed: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
        assert!(Severity::Critical.rank() > Severity::High.rank());
    }

    #[test]
    fn scope_uses_snake_case() {
        let parsed: Scope = serde_json::from_str("\"sample_set\"").unwrap();
        assert_eq!(parsed, Scope::SampleSet);
    }

    #[test]
    fn malformed_checks_document_is_a_config_error() {
        let err = ChecksDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn check_definition_defaults() {
        let raw = r#"{
            "id": "x", "category": "on_page", "name": "X",
            "severity": "medium", "method": "title_present_ratio"
        }"#;
        let def: CheckDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(def.applies_to, Scope::SampleSet);
        assert!(!def.is_best_practice);
        assert_eq!(def.fix_who, "developer");
    }

    #[test]
    fn result_values_na_is_null() {
        let raw = r#"{
            "category_weights": {"on_page": 1.0},
            "severity_weights": {"high": 3.0},
            "result_values": {"pass": 1.0, "partial": 0.5, "fail": 0.0, "na": null},
            "grading": [{"min": 90, "grade": "A"}]
        }"#;
        let model: ScoringModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.status_value(CheckStatus::Pass), Some(1.0));
        assert_eq!(model.status_value(CheckStatus::Na), None);
    }
}
