//! Scoring & aggregation: verdict values -> category scores -> capped
//! overall score, grade, and ranked recommendations. All weights, value
//! mappings, grade bands and caps come from the scoring document.

use crate::checks::CheckVerdict;
use crate::model::{CheckStatus, ScoringModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedCap {
    pub id: String,
    pub name: String,
    pub max_overall_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Weighted average before caps.
    pub overall_raw: f64,
    /// Final, capped score 0..100.
    pub overall_score: f64,
    pub grade: String,
    pub caps_applied: Vec<AppliedCap>,
    pub category_scores: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub check_id: String,
    pub reason: String,
    pub suggested_fix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationBuckets {
    pub critical: Vec<Recommendation>,
    pub important: Vec<Recommendation>,
    pub best_practice: Vec<Recommendation>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Category score: severity-weighted average of the contributing verdict
/// values, scaled to 0..100. A category with no contributing weight
/// (all-na, or only zero-weight severities) scores as `None`, not zero.
fn category_score(category: &str, verdicts: &[CheckVerdict], model: &ScoringModel) -> Option<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for verdict in verdicts.iter().filter(|v| v.category == category) {
        if verdict.status == CheckStatus::Na {
            continue;
        }
        let Some(value) = model.status_value(verdict.status) else {
            continue;
        };
        let weight = model.severity_weight(verdict.severity);
        numerator += value * weight;
        denominator += weight;
    }
    if denominator == 0.0 {
        None
    } else {
        Some(round2(numerator / denominator * 100.0))
    }
}

pub fn compute_scores(verdicts: &[CheckVerdict], model: &ScoringModel) -> ScoreSummary {
    let mut category_scores: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for category in model.category_weights.keys() {
        category_scores.insert(category.clone(), category_score(category, verdicts, model));
    }

    // overall: category-weighted average over the non-null categories
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (category, score) in &category_scores {
        let Some(score) = score else { continue };
        let weight = model.category_weight(category);
        numerator += score * weight;
        denominator += weight;
    }
    let overall_raw = if denominator == 0.0 {
        0.0
    } else {
        round2(numerator / denominator)
    };

    // caps clamp the achievable score, never raise it; every triggered cap
    // is recorded even when a tighter one already lowered the number
    let failed_ids: HashSet<&str> = verdicts
        .iter()
        .filter(|v| v.status == CheckStatus::Fail)
        .map(|v| v.check_id.as_str())
        .collect();
    let mut overall_score = overall_raw;
    let mut caps_applied = Vec::new();
    for cap in &model.caps {
        if cap
            .if_failed_any
            .iter()
            .any(|id| failed_ids.contains(id.as_str()))
        {
            overall_score = overall_score.min(cap.max_overall_score);
            caps_applied.push(AppliedCap {
                id: cap.id.clone(),
                name: cap.name.clone(),
                max_overall_score: cap.max_overall_score,
            });
        }
    }
    overall_score = round2(overall_score);

    ScoreSummary {
        overall_raw,
        overall_score,
        grade: grade_for(overall_score, model),
        caps_applied,
        category_scores,
    }
}

/// Highest-minimum band whose minimum is at or below the score; the
/// lowest band is the fallback.
pub fn grade_for(score: f64, model: &ScoringModel) -> String {
    let mut bands: Vec<_> = model.grading.iter().collect();
    bands.sort_by(|a, b| b.min.partial_cmp(&a.min).unwrap_or(std::cmp::Ordering::Equal));
    for band in &bands {
        if score >= band.min {
            return band.grade.clone();
        }
    }
    bands
        .last()
        .map(|band| band.grade.clone())
        .unwrap_or_else(|| "F".to_string())
}

/// Rank failing and partial verdicts by (severity rank, affects-indexing,
/// category weight) descending, take the configured top N, and bucket
/// them: best-practice checks first, then critical, then everything else.
pub fn build_recommendations(
    verdicts: &[CheckVerdict],
    model: &ScoringModel,
) -> RecommendationBuckets {
    let mut failing: Vec<&CheckVerdict> = verdicts
        .iter()
        .filter(|v| matches!(v.status, CheckStatus::Fail | CheckStatus::Partial))
        .collect();

    failing.sort_by(|a, b| {
        let key = |v: &CheckVerdict| {
            (
                v.severity.rank(),
                v.affects_indexing as u8,
                model.category_weight(&v.category),
            )
        };
        let (rank_a, idx_a, weight_a) = key(a);
        let (rank_b, idx_b, weight_b) = key(b);
        rank_b
            .cmp(&rank_a)
            .then(idx_b.cmp(&idx_a))
            .then(weight_b.partial_cmp(&weight_a).unwrap_or(std::cmp::Ordering::Equal))
    });

    let top_n = model.recommendation_priority.top_n;
    let mut buckets = RecommendationBuckets::default();
    for verdict in failing.into_iter().take(top_n) {
        let item = Recommendation {
            check_id: verdict.check_id.clone(),
            reason: verdict.explanation.short.clone(),
            suggested_fix: verdict.fix_hint.action.clone(),
        };
        if verdict.is_best_practice {
            buckets.best_practice.push(item);
        } else if verdict.severity == crate::model::Severity::Critical {
            buckets.critical.push(item);
        } else {
            buckets.important.push(item);
        }
    }
    buckets
}
