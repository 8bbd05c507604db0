//! Pipeline entry point: crawl -> check -> score -> assembled report.
//!
//! The only side effects are outbound network requests; persistence is the
//! caller's concern. A run either completes with a full report (possibly a
//! low-signal one when the crawl found nothing) or fails with a
//! configuration-level error before any partial report exists.

use crate::checks::{CheckVerdict, run_check};
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::model::{ChecksDocument, ScoringDocument};
use crate::report::{AuditMeta, AuditReport, CrawlMeta, Summary, TargetInfo};
use crate::scoring::{build_recommendations, compute_scores};
use reqwest::Client;
use sitegrade_scanner::Crawler;
use sitegrade_scanner::crawler::ProgressCallback;
use tracing::info;

pub struct AuditOptions {
    pub target_url: String,
    pub plan: String,
    pub max_pages: usize,
    pub max_depth: usize,
}

pub async fn run_audit(
    options: &AuditOptions,
    checks_doc: &ChecksDocument,
    scoring_doc: &ScoringDocument,
    config: &AuditConfig,
) -> Result<AuditReport> {
    run_audit_with_progress(options, checks_doc, scoring_doc, config, None).await
}

pub async fn run_audit_with_progress(
    options: &AuditOptions,
    checks_doc: &ChecksDocument,
    scoring_doc: &ScoringDocument,
    config: &AuditConfig,
    progress: Option<ProgressCallback>,
) -> Result<AuditReport> {
    if options.max_pages < 1 {
        return Err(AuditError::Config("max_pages must be at least 1".to_string()));
    }

    let mut crawler = Crawler::with_config(&config.user_agent, config.request_timeout())
        .with_max_pages(options.max_pages)
        .with_max_depth(options.max_depth)
        .with_max_fetch_bytes(config.max_fetch_bytes);
    if let Some(callback) = progress {
        crawler = crawler.with_progress_callback(callback);
    }

    let snapshot = crawler.crawl(&options.target_url).await?;
    info!(
        "crawl of {} finished with {} pages; running {} checks",
        options.target_url,
        snapshot.page_count(),
        checks_doc.checks.len()
    );

    // live checks follow redirects on their own, unlike the crawler
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.request_timeout())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| AuditError::Config(format!("cannot build HTTP client: {e}")))?;

    let model = &scoring_doc.scoring;
    let mut verdicts: Vec<CheckVerdict> = Vec::with_capacity(checks_doc.checks.len());
    for definition in &checks_doc.checks {
        verdicts.push(run_check(definition, &snapshot, model, &client, config).await);
    }

    let scores = compute_scores(&verdicts, model);
    let recommendations = build_recommendations(&verdicts, model);

    let version_or = |v: &str| {
        if v.is_empty() { "mvp-0.1".to_string() } else { v.to_string() }
    };

    Ok(AuditReport {
        audit_meta: AuditMeta {
            audit_id: uuid::Uuid::new_v4().to_string(),
            schema_version: version_or(&checks_doc.schema_version),
            scoring_version: version_or(&scoring_doc.schema_version),
            target: TargetInfo {
                url: options.target_url.clone(),
                normalized_url: snapshot.normalized_url.clone(),
                host: snapshot.host.clone(),
            },
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            plan: options.plan.clone(),
            crawl: CrawlMeta {
                pages_requested: options.max_pages,
                pages_crawled: snapshot.page_count(),
                crawl_depth: options.max_depth,
                errors: snapshot.errors.clone(),
            },
        },
        summary: Summary {
            overall_score: scores.overall_score,
            grade: scores.grade,
            caps_applied: scores.caps_applied,
        },
        category_scores: scores.category_scores,
        checks: verdicts,
        recommendations,
    })
}
