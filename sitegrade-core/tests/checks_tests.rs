// Tests for the check registry and the individual check methods

use reqwest::Client;
use sitegrade_core::checks::run_check;
use sitegrade_core::config::AuditConfig;
use sitegrade_core::model::{CheckDefinition, CheckStatus, ScoringModel};
use sitegrade_scanner::snapshot::RedirectHop;
use sitegrade_scanner::{CrawlSnapshot, PageRecord};

fn model() -> ScoringModel {
    serde_json::from_value(serde_json::json!({
        "category_weights": { "x": 1.0 },
        "severity_weights": { "critical": 5.0, "high": 3.0, "medium": 2.0, "low": 1.0, "info": 0.5 },
        "result_values": { "pass": 1.0, "partial": 0.5, "fail": 0.0, "na": null },
        "grading": [{ "min": 0, "grade": "D" }]
    }))
    .unwrap()
}

fn definition(method: &str, scope: &str, params: serde_json::Value) -> CheckDefinition {
    serde_json::from_value(serde_json::json!({
        "id": method,
        "category": "x",
        "name": method,
        "severity": "medium",
        "applies_to": scope,
        "method": method,
        "params": params
    }))
    .unwrap()
}

fn empty_snapshot() -> CrawlSnapshot {
    CrawlSnapshot::new(
        "example.com".to_string(),
        "https://example.com/".to_string(),
        "example.com".to_string(),
    )
}

fn page(url: &str) -> PageRecord {
    let mut page = PageRecord::new(url.to_string());
    page.status_code = 200;
    page
}

async fn run(
    method: &str,
    scope: &str,
    params: serde_json::Value,
    snapshot: &CrawlSnapshot,
) -> sitegrade_core::checks::CheckVerdict {
    let def = definition(method, scope, params);
    run_check(&def, snapshot, &model(), &Client::new(), &AuditConfig::default()).await
}

// ============================================================================
// Dispatcher behavior
// ============================================================================

#[tokio::test]
async fn unknown_method_resolves_to_na_with_a_note() {
    let mut snapshot = empty_snapshot();
    snapshot.insert_page(page("https://example.com/"));
    let verdict = run("no_such_method", "homepage", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Na);
    assert!(verdict.explanation.details.contains("no_such_method"));
    assert_eq!(verdict.score_value, None);
}

#[tokio::test]
async fn page_checks_resolve_na_when_nothing_was_crawled() {
    let snapshot = empty_snapshot();
    let verdict = run("title_present_ratio", "sample_set", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Na);
    assert!(verdict.explanation.details.contains("0 pages"));
}

#[tokio::test]
async fn site_checks_still_run_with_zero_pages() {
    let mut snapshot = empty_snapshot();
    snapshot.robots_txt = Some("User-agent: *\nDisallow:\n".to_string());
    snapshot.robots_status = Some(200);
    let verdict = run("robots_exists", "site", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Pass);
}

#[tokio::test]
async fn page_sample_carries_at_most_five_urls() {
    let mut snapshot = empty_snapshot();
    for i in 0..8 {
        snapshot.insert_page(page(&format!("https://example.com/p{i}")));
    }
    let verdict = run("title_present_ratio", "sample_set", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.page_sample.len(), 5);
}

// ============================================================================
// Status & redirects
// ============================================================================

#[tokio::test]
async fn homepage_status_check_passes_on_2xx() {
    let mut snapshot = empty_snapshot();
    snapshot.insert_page(page("https://example.com/"));
    let verdict = run("http_status_200", "homepage", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Pass);
}

#[tokio::test]
async fn homepage_status_check_fails_on_500() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.status_code = 500;
    snapshot.insert_page(p);
    let verdict = run("http_status_200", "homepage", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn redirect_loop_is_detected() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/a");
    p.redirect_chain = vec![
        RedirectHop { url: "https://example.com/a".into(), status: 302 },
        RedirectHop { url: "https://example.com/b".into(), status: 302 },
        RedirectHop { url: "https://example.com/a".into(), status: 302 },
    ];
    snapshot.insert_page(p);
    let verdict = run("redirect_loop_absent", "sample_set", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn one_hop_over_the_limit_is_partial_more_is_fail() {
    let chain = |n: usize| -> Vec<RedirectHop> {
        (0..n)
            .map(|i| RedirectHop { url: format!("https://example.com/hop{i}"), status: 302 })
            .collect()
    };

    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.redirect_chain = chain(3);
    snapshot.insert_page(p);
    let verdict = run(
        "redirect_hops_max",
        "sample_set",
        serde_json::json!({ "max_hops": 2 }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Partial);

    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.redirect_chain = chain(5);
    snapshot.insert_page(p);
    let verdict = run(
        "redirect_hops_max",
        "sample_set",
        serde_json::json!({ "max_hops": 2 }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn temporary_redirects_are_flagged_partial() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/a");
    p.redirect_chain = vec![RedirectHop { url: "https://example.com/old".into(), status: 302 }];
    snapshot.insert_page(p);
    let verdict = run(
        "redirect_permanent_preferred",
        "sample_set",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Partial);
}

// ============================================================================
// Indexability
// ============================================================================

#[tokio::test]
async fn https_check_fails_for_http_final_url() {
    let mut snapshot = empty_snapshot();
    let mut p = page("http://example.com/");
    p.final_url = "http://example.com/".to_string();
    snapshot.insert_page(p);
    let verdict = run("https_enabled", "homepage", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Fail);
    assert_eq!(verdict.observed["scheme"], "http");
}

#[tokio::test]
async fn noindex_in_response_header_fails_the_check() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.headers.insert("x-robots-tag".into(), "NOINDEX, nofollow".into());
    snapshot.insert_page(p);
    let verdict = run("noindex_absent", "homepage", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn soft404_pages_above_double_the_budget_fail() {
    let mut snapshot = empty_snapshot();
    for i in 0..4 {
        let mut p = page(&format!("https://example.com/p{i}"));
        p.body.soft404_signal = i < 2; // half the sample smells like 404s
        snapshot.insert_page(p);
    }
    let verdict = run(
        "soft404_ratio",
        "sample_set",
        serde_json::json!({ "max_ratio": 0.1 }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

// ============================================================================
// Robots & sitemap
// ============================================================================

#[tokio::test]
async fn robots_disallow_blocks_a_crawled_page() {
    let mut snapshot = empty_snapshot();
    snapshot.robots_txt = Some("User-agent: *\nDisallow: /private/\n".to_string());
    snapshot.robots_status = Some(200);
    snapshot.insert_page(page("https://example.com/"));
    snapshot.insert_page(page("https://example.com/private/page"));

    let verdict = run(
        "robots_allows_pages_ratio",
        "sample_set",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_ne!(verdict.status, CheckStatus::Pass);
    let blocked = verdict.observed["blocked"].as_array().unwrap();
    assert_eq!(blocked.len(), 1);
    assert!(blocked[0].as_str().unwrap().contains("/private/page"));
}

#[tokio::test]
async fn sitemap_with_three_locs_parses() {
    let mut snapshot = empty_snapshot();
    snapshot.sitemap_xml = Some(
        r#"<?xml version="1.0"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about</loc></url>
  <url><loc>https://example.com/blog</loc></url>
</urlset>"#
            .to_string(),
    );
    snapshot.sitemap_status = Some(200);

    let verdict = run("sitemap_parses", "site", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Pass);
    assert_eq!(verdict.observed["parsed_locs"], 3);

    let verdict = run(
        "sitemap_host_protocol_ratio",
        "site",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Pass);
}

#[tokio::test]
async fn sitemap_on_the_wrong_host_fails_the_ratio() {
    let mut snapshot = empty_snapshot();
    snapshot.sitemap_xml = Some(
        "<urlset><url><loc>http://other.example/</loc></url></urlset>".to_string(),
    );
    let verdict = run(
        "sitemap_host_protocol_ratio",
        "site",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn assets_warning_stays_not_implemented() {
    let snapshot = empty_snapshot();
    let verdict = run(
        "robots_blocks_assets_warning",
        "site",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Na);
    assert!(verdict.explanation.details.contains("Not implemented"));
}

// ============================================================================
// On-page & hygiene
// ============================================================================

#[tokio::test]
async fn missing_titles_fail_the_presence_ratio() {
    let mut snapshot = empty_snapshot();
    snapshot.insert_page(page("https://example.com/"));
    let verdict = run("title_present_ratio", "sample_set", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn duplicate_titles_are_counted_as_total_minus_distinct() {
    let mut snapshot = empty_snapshot();
    for (i, title) in ["Same", "Same", "Same", "Unique"].iter().enumerate() {
        let mut p = page(&format!("https://example.com/p{i}"));
        p.head.title = title.to_string();
        snapshot.insert_page(p);
    }
    let verdict = run(
        "duplicate_title_ratio",
        "sample_set",
        serde_json::json!({ "max_ratio": 0.2 }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.observed["duplicates"], 2);
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn a_single_multi_h1_page_is_partial() {
    let mut snapshot = empty_snapshot();
    for i in 0..5 {
        let mut p = page(&format!("https://example.com/p{i}"));
        p.body.h1_count = if i == 0 { 3 } else { 1 };
        snapshot.insert_page(p);
    }
    let verdict = run("multiple_h1_warning", "sample_set", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Partial);
}

#[tokio::test]
async fn short_titles_fall_out_of_the_length_band() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.head.title = "Too short".to_string();
    snapshot.insert_page(p);
    let verdict = run(
        "title_length_ratio",
        "sample_set",
        serde_json::json!({ "min_length": 30, "max_length": 65 }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Fail);
    assert_eq!(verdict.observed["offenders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mixed_trailing_slash_styles_are_partial() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.body.all_links = vec!["/about/".to_string(), "/blog".to_string()];
    snapshot.insert_page(p);
    let verdict = run(
        "trailing_slash_consistency",
        "sample_set",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Partial);
}

#[tokio::test]
async fn mixed_www_and_bare_hosts_fail() {
    let mut snapshot = empty_snapshot();
    let mut a = page("https://example.com/");
    a.final_url = "https://example.com/".to_string();
    let mut b = page("https://example.com/about");
    b.final_url = "https://www.example.com/about".to_string();
    snapshot.insert_page(a);
    snapshot.insert_page(b);
    let verdict = run("www_consistency", "site", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn multiple_canonicals_hurt_the_single_ratio() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.head.canonicals = vec![
        "https://example.com/".to_string(),
        "https://example.com/dup".to_string(),
    ];
    snapshot.insert_page(p);
    let verdict = run(
        "canonical_single_ratio",
        "sample_set",
        serde_json::json!({}),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

// ============================================================================
// Trust & brand
// ============================================================================

#[tokio::test]
async fn trust_page_is_found_by_keyword_substring() {
    let mut snapshot = empty_snapshot();
    snapshot.insert_page(page("https://example.com/"));
    snapshot.insert_page(page("https://example.com/contact-us"));
    let verdict = run(
        "trust_page_exists",
        "site",
        serde_json::json!({ "kind": "contact", "keywords": ["contact", "kontakt"] }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Pass);

    let verdict = run(
        "trust_page_exists",
        "site",
        serde_json::json!({ "kind": "privacy", "keywords": ["privacy"] }),
        &snapshot,
    )
    .await;
    assert_eq!(verdict.status, CheckStatus::Fail);
}

#[tokio::test]
async fn favicon_check_reads_the_homepage_head() {
    let mut snapshot = empty_snapshot();
    let mut p = page("https://example.com/");
    p.head.favicon = Some("/favicon.ico".to_string());
    snapshot.insert_page(p);
    let verdict = run("favicon_present", "homepage", serde_json::json!({}), &snapshot).await;
    assert_eq!(verdict.status, CheckStatus::Pass);
}
