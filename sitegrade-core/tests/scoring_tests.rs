// Tests for the scoring & aggregation engine

use sitegrade_core::checks::{CheckVerdict, Explanation, FixHint};
use sitegrade_core::model::{CheckStatus, ScoringModel, Scope, Severity};
use sitegrade_core::scoring::{build_recommendations, compute_scores, grade_for};
use std::collections::HashMap;

fn model() -> ScoringModel {
    serde_json::from_value(serde_json::json!({
        "category_weights": { "indexability": 0.6, "on_page": 0.3, "brand": 0.1 },
        "severity_weights": { "critical": 4.0, "high": 3.0, "medium": 2.0, "low": 1.0, "info": 0.5 },
        "result_values": { "pass": 1.0, "partial": 0.5, "fail": 0.0, "na": null },
        "grading": [
            { "min": 90, "grade": "A" },
            { "min": 75, "grade": "B" },
            { "min": 60, "grade": "C" },
            { "min": 0, "grade": "D" }
        ],
        "caps": [
            { "id": "cap_https", "name": "HTTPS not enabled", "if_failed_any": ["https_enabled"], "max_overall_score": 50.0 },
            { "id": "cap_status", "name": "Homepage unreachable", "if_failed_any": ["http_status_200"], "max_overall_score": 40.0 }
        ],
        "recommendation_priority": { "top_n": 3 }
    }))
    .unwrap()
}

fn verdict(
    id: &str,
    category: &str,
    severity: Severity,
    status: CheckStatus,
    value: Option<f64>,
) -> CheckVerdict {
    CheckVerdict {
        check_id: id.to_string(),
        category: category.to_string(),
        severity,
        is_best_practice: false,
        affects_indexing: false,
        status,
        score_value: value,
        applies_to: Scope::SampleSet,
        page_sample: vec![],
        observed: serde_json::Value::Null,
        explanation: Explanation {
            short: format!("{id}: {}", status.label()),
            details: String::new(),
        },
        fix_hint: FixHint {
            priority: "normal".to_string(),
            action: format!("fix {id}"),
            who: "developer".to_string(),
            effort: "low".to_string(),
        },
    }
}

// ============================================================================
// Category scoring
// ============================================================================

#[test]
fn category_score_is_severity_weighted_average() {
    let verdicts = vec![
        verdict("a", "indexability", Severity::Critical, CheckStatus::Pass, Some(1.0)),
        verdict("b", "indexability", Severity::Low, CheckStatus::Fail, Some(0.0)),
    ];
    let summary = compute_scores(&verdicts, &model());
    // (1.0*4 + 0.0*1) / 5 = 0.8 -> 80
    assert_eq!(summary.category_scores["indexability"], Some(80.0));
}

#[test]
fn category_with_only_na_checks_scores_null() {
    let verdicts = vec![
        verdict("a", "indexability", Severity::High, CheckStatus::Na, None),
        verdict("b", "on_page", Severity::High, CheckStatus::Pass, Some(1.0)),
    ];
    let summary = compute_scores(&verdicts, &model());
    assert_eq!(summary.category_scores["indexability"], None);
    assert_eq!(summary.category_scores["on_page"], Some(100.0));
}

#[test]
fn category_with_no_checks_scores_null() {
    let verdicts = vec![verdict("a", "on_page", Severity::High, CheckStatus::Pass, Some(1.0))];
    let summary = compute_scores(&verdicts, &model());
    assert_eq!(summary.category_scores["brand"], None);
}

// ============================================================================
// Overall scoring & caps
// ============================================================================

#[test]
fn overall_is_weighted_average_over_available_categories() {
    // indexability 80, on_page 100, brand null
    let verdicts = vec![
        verdict("a", "indexability", Severity::Critical, CheckStatus::Pass, Some(1.0)),
        verdict("b", "indexability", Severity::Low, CheckStatus::Fail, Some(0.0)),
        verdict("c", "on_page", Severity::High, CheckStatus::Pass, Some(1.0)),
    ];
    let summary = compute_scores(&verdicts, &model());
    // (80*0.6 + 100*0.3) / 0.9 = 86.67
    assert!((summary.overall_score - 86.67).abs() < 0.01);
}

#[test]
fn all_null_categories_mean_overall_zero() {
    let verdicts = vec![verdict("a", "indexability", Severity::High, CheckStatus::Na, None)];
    let summary = compute_scores(&verdicts, &model());
    assert_eq!(summary.overall_score, 0.0);
    assert_eq!(summary.grade, "D");
}

#[test]
fn triggered_cap_clamps_the_score_and_is_recorded() {
    // uncapped score: 80
    let verdicts = vec![
        verdict("a", "indexability", Severity::Critical, CheckStatus::Pass, Some(1.0)),
        verdict("https_enabled", "indexability", Severity::Low, CheckStatus::Fail, Some(0.0)),
    ];
    let summary = compute_scores(&verdicts, &model());
    assert_eq!(summary.overall_raw, 80.0);
    assert_eq!(summary.overall_score, 50.0);
    assert_eq!(summary.caps_applied.len(), 1);
    assert_eq!(summary.caps_applied[0].id, "cap_https");
}

#[test]
fn caps_never_raise_the_score() {
    // uncapped score well below the cap
    let verdicts = vec![
        verdict("https_enabled", "indexability", Severity::Critical, CheckStatus::Fail, Some(0.0)),
    ];
    let summary = compute_scores(&verdicts, &model());
    assert_eq!(summary.overall_raw, 0.0);
    assert_eq!(summary.overall_score, 0.0);
    // the cap still shows up as triggered
    assert_eq!(summary.caps_applied.len(), 1);
}

#[test]
fn every_triggered_cap_is_recorded_even_after_clamping() {
    let verdicts = vec![
        verdict("a", "indexability", Severity::Critical, CheckStatus::Pass, Some(1.0)),
        verdict("https_enabled", "indexability", Severity::Low, CheckStatus::Fail, Some(0.0)),
        verdict("http_status_200", "indexability", Severity::Low, CheckStatus::Fail, Some(0.0)),
        verdict("b", "on_page", Severity::High, CheckStatus::Pass, Some(1.0)),
    ];
    let summary = compute_scores(&verdicts, &model());
    // uncapped ~77.8; the tightest cap wins the number, both are listed
    assert_eq!(summary.overall_score, 40.0);
    let ids: Vec<&str> = summary.caps_applied.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["cap_https", "cap_status"]);
}

#[test]
fn partial_failures_do_not_trigger_caps() {
    let verdicts = vec![
        verdict("https_enabled", "indexability", Severity::High, CheckStatus::Partial, Some(0.5)),
    ];
    let summary = compute_scores(&verdicts, &model());
    assert!(summary.caps_applied.is_empty());
}

// ============================================================================
// Grading
// ============================================================================

#[test]
fn grade_bands_pick_highest_matching_minimum() {
    let m = model();
    assert_eq!(grade_for(95.0, &m), "A");
    assert_eq!(grade_for(90.0, &m), "A");
    assert_eq!(grade_for(89.9, &m), "B");
    assert_eq!(grade_for(60.0, &m), "C");
    assert_eq!(grade_for(1.0, &m), "D");
}

#[test]
fn grading_is_monotonic_in_the_score() {
    let m = model();
    let order = ["D", "C", "B", "A"];
    let rank = |g: &str| order.iter().position(|x| *x == g).unwrap();
    let mut previous = rank(&grade_for(0.0, &m));
    for score in 1..=100 {
        let current = rank(&grade_for(score as f64, &m));
        assert!(current >= previous, "grade dropped at score {score}");
        previous = current;
    }
}

// ============================================================================
// Recommendations
// ============================================================================

#[test]
fn higher_severity_ranks_first_regardless_of_category_weight() {
    // critical failure in the lightest category vs medium failure in the
    // heaviest one
    let a = verdict("crit_brand", "brand", Severity::Critical, CheckStatus::Fail, Some(0.0));
    let b = verdict("med_index", "indexability", Severity::Medium, CheckStatus::Fail, Some(0.0));
    let buckets = build_recommendations(&[b, a], &model());
    assert_eq!(buckets.critical.len(), 1);
    assert_eq!(buckets.critical[0].check_id, "crit_brand");
    assert_eq!(buckets.important[0].check_id, "med_index");
}

#[test]
fn affects_indexing_breaks_severity_ties() {
    let mut a = verdict("plain", "on_page", Severity::High, CheckStatus::Fail, Some(0.0));
    a.affects_indexing = false;
    let mut b = verdict("indexing", "on_page", Severity::High, CheckStatus::Fail, Some(0.0));
    b.affects_indexing = true;
    let buckets = build_recommendations(&[a, b], &model());
    assert_eq!(buckets.important[0].check_id, "indexing");
    assert_eq!(buckets.important[1].check_id, "plain");
}

#[test]
fn top_n_limits_the_total_recommendation_count() {
    let verdicts: Vec<CheckVerdict> = (0..10)
        .map(|i| verdict(&format!("c{i}"), "on_page", Severity::Medium, CheckStatus::Fail, Some(0.0)))
        .collect();
    let buckets = build_recommendations(&verdicts, &model());
    let total = buckets.critical.len() + buckets.important.len() + buckets.best_practice.len();
    assert_eq!(total, 3); // top_n in the test model
}

#[test]
fn best_practice_failures_go_to_their_own_bucket() {
    let mut v = verdict("bp", "brand", Severity::Critical, CheckStatus::Fail, Some(0.0));
    v.is_best_practice = true;
    let buckets = build_recommendations(&[v], &model());
    assert!(buckets.critical.is_empty());
    assert_eq!(buckets.best_practice[0].check_id, "bp");
}

#[test]
fn passing_and_na_checks_are_never_recommended() {
    let verdicts = vec![
        verdict("ok", "on_page", Severity::Critical, CheckStatus::Pass, Some(1.0)),
        verdict("skipped", "on_page", Severity::Critical, CheckStatus::Na, None),
        verdict("partial", "on_page", Severity::Low, CheckStatus::Partial, Some(0.5)),
    ];
    let buckets = build_recommendations(&verdicts, &model());
    let total = buckets.critical.len() + buckets.important.len() + buckets.best_practice.len();
    assert_eq!(total, 1);
    assert_eq!(buckets.important[0].check_id, "partial");
}
