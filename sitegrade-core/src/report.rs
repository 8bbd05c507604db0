// Report assembly and rendering

use crate::checks::CheckVerdict;
use crate::model::CheckStatus;
use crate::scoring::{AppliedCap, RecommendationBuckets, Recommendation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetInfo {
    pub url: String,
    pub normalized_url: String,
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlMeta {
    pub pages_requested: usize,
    pub pages_crawled: usize,
    pub crawl_depth: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditMeta {
    pub audit_id: String,
    pub schema_version: String,
    pub scoring_version: String,
    pub target: TargetInfo,
    pub timestamp: String,
    pub plan: String,
    pub crawl: CrawlMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub overall_score: f64,
    pub grade: String,
    pub caps_applied: Vec<AppliedCap>,
}

/// The finished audit artifact handed to the persistence/rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub audit_meta: AuditMeta,
    pub summary: Summary,
    pub category_scores: BTreeMap<String, Option<f64>>,
    pub checks: Vec<CheckVerdict>,
    pub recommendations: RecommendationBuckets,
}

pub fn generate_json_report(report: &AuditReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn generate_text_report(report: &AuditReport) -> String {
    let mut out = String::new();

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("                          SITEGRADE SEO AUDIT REPORT\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    out.push_str(&format!("Audit ID:     {}\n", report.audit_meta.audit_id));
    out.push_str(&format!("Target:       {}\n", report.audit_meta.target.url));
    out.push_str(&format!("Host:         {}\n", report.audit_meta.target.host));
    out.push_str(&format!("Date:         {}\n", report.audit_meta.timestamp));
    out.push_str(&format!("Plan:         {}\n", report.audit_meta.plan));
    out.push_str(&format!(
        "Pages:        {} crawled of {} requested (depth {})\n",
        report.audit_meta.crawl.pages_crawled,
        report.audit_meta.crawl.pages_requested,
        report.audit_meta.crawl.crawl_depth
    ));
    if !report.audit_meta.crawl.errors.is_empty() {
        out.push_str(&format!(
            "Fetch errors: {}\n",
            report.audit_meta.crawl.errors.len()
        ));
    }
    out.push('\n');

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("SUMMARY\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str(&format!(
        "Overall score: {:.0} / 100   Grade: {}\n",
        report.summary.overall_score, report.summary.grade
    ));
    for cap in &report.summary.caps_applied {
        out.push_str(&format!(
            "  [CAP] {} limits the overall score to {:.0}\n",
            cap.name, cap.max_overall_score
        ));
    }
    out.push('\n');

    out.push_str("Category scores:\n");
    for (category, score) in &report.category_scores {
        match score {
            Some(score) => out.push_str(&format!("  {category:<20} {score:>5.1}\n")),
            None => out.push_str(&format!("  {category:<20}   n/a\n")),
        }
    }
    out.push('\n');

    let buckets = [
        ("CRITICAL", &report.recommendations.critical),
        ("IMPORTANT", &report.recommendations.important),
        ("BEST PRACTICE", &report.recommendations.best_practice),
    ];
    if buckets.iter().any(|(_, items)| !items.is_empty()) {
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        out.push_str("RECOMMENDATIONS\n");
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        for (label, items) in buckets {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("[{label}]\n"));
            for item in items {
                out.push_str(&format!("  - {} ({})\n", item.reason, item.check_id));
                if !item.suggested_fix.is_empty() {
                    out.push_str(&format!("    Fix: {}\n", item.suggested_fix));
                }
            }
            out.push('\n');
        }
    }

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("CHECK RESULTS\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    for verdict in &report.checks {
        let marker = match verdict.status {
            CheckStatus::Pass => "✓",
            CheckStatus::Partial => "~",
            CheckStatus::Fail => "✗",
            CheckStatus::Na => "-",
        };
        out.push_str(&format!(
            "  {} [{:<8}] {}\n",
            marker,
            verdict.severity.as_str(),
            verdict.explanation.short
        ));
        if !verdict.explanation.details.is_empty() {
            out.push_str(&format!("      {}\n", verdict.explanation.details));
        }
    }
    out.push('\n');

    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("                              End of Report\n");
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    out.push_str("\nGenerated by sitegrade\n");

    out
}

pub fn generate_markdown_report(report: &AuditReport) -> String {
    let mut out = String::new();

    out.push_str("# sitegrade SEO audit\n\n");
    out.push_str(&format!("**Target:** {}  \n", report.audit_meta.target.url));
    out.push_str(&format!("**Date:** {}  \n", report.audit_meta.timestamp));
    out.push_str(&format!(
        "**Score:** {:.0} / 100 — grade **{}**\n\n",
        report.summary.overall_score, report.summary.grade
    ));
    for cap in &report.summary.caps_applied {
        out.push_str(&format!(
            "> Score capped at {:.0}: {}\n",
            cap.max_overall_score, cap.name
        ));
    }
    out.push('\n');

    out.push_str("## Category scores\n\n| Category | Score |\n|---|---|\n");
    for (category, score) in &report.category_scores {
        match score {
            Some(score) => out.push_str(&format!("| {category} | {score:.1} |\n")),
            None => out.push_str(&format!("| {category} | n/a |\n")),
        }
    }
    out.push('\n');

    let render_bucket = |out: &mut String, title: &str, items: &[Recommendation]| {
        if items.is_empty() {
            return;
        }
        out.push_str(&format!("## {title}\n\n"));
        for item in items {
            out.push_str(&format!("- **{}** — {}\n", item.check_id, item.reason));
            if !item.suggested_fix.is_empty() {
                out.push_str(&format!("  - Fix: {}\n", item.suggested_fix));
            }
        }
        out.push('\n');
    };
    render_bucket(&mut out, "Critical issues", &report.recommendations.critical);
    render_bucket(&mut out, "Important issues", &report.recommendations.important);
    render_bucket(
        &mut out,
        "Best-practice improvements",
        &report.recommendations.best_practice,
    );

    out.push_str("## All checks\n\n| Status | Severity | Check |\n|---|---|---|\n");
    for verdict in &report.checks {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            verdict.status.as_str(),
            verdict.severity.as_str(),
            verdict.explanation.short
        ));
    }

    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
