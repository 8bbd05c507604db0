//! Check registry and dispatcher.
//!
//! A check method is a function of (selected pages, params, snapshot); it
//! returns a status, an observed-data payload and an optional note. Methods
//! are dispatched by name through a static registry, so the declarative
//! checks document can reference new methods without dispatcher changes.
//! An unknown method resolves the check to `na` rather than failing the run.

mod live;
mod page;
mod site;

use crate::config::AuditConfig;
use crate::model::{CheckDefinition, CheckStatus, ScoringModel, Scope, Severity};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sitegrade_scanner::{CrawlSnapshot, PageRecord};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

/// Evidence shown to the reader: at most this many page URLs per verdict.
const PAGE_SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub short: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixHint {
    pub priority: String,
    pub action: String,
    pub who: String,
    pub effort: String,
}

/// The outcome of evaluating one check definition against a snapshot.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckVerdict {
    pub check_id: String,
    pub category: String,
    pub severity: Severity,
    pub is_best_practice: bool,
    pub affects_indexing: bool,
    pub status: CheckStatus,
    pub score_value: Option<f64>,
    pub applies_to: Scope,
    pub page_sample: Vec<String>,
    pub observed: Value,
    pub explanation: Explanation,
    pub fix_hint: FixHint,
}

/// What a method itself produces; the dispatcher wraps it into a verdict.
#[derive(Debug, Clone)]
pub struct MethodOutcome {
    pub status: CheckStatus,
    pub observed: Value,
    pub note: Option<String>,
}

impl MethodOutcome {
    pub fn new(status: CheckStatus, observed: Value) -> Self {
        Self {
            status,
            observed,
            note: None,
        }
    }

    pub fn na(note: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Na,
            observed: Value::Null,
            note: Some(note.into()),
        }
    }
}

/// Everything a method may look at.
pub struct CheckContext<'a> {
    pub pages: Vec<&'a PageRecord>,
    pub params: &'a Map<String, Value>,
    pub snapshot: &'a CrawlSnapshot,
}

type PureCheckFn = fn(&CheckContext) -> MethodOutcome;
type LiveCheckFn = for<'a> fn(&'a CheckContext<'a>, &'a Client) -> BoxFuture<'a, MethodOutcome>;

enum MethodKind {
    Pure(PureCheckFn),
    Live(LiveCheckFn),
}

struct CheckMethod {
    kind: MethodKind,
    /// Site-level methods (robots, sitemap, probes) still run when the
    /// crawl recorded zero pages.
    needs_pages: bool,
}

impl CheckMethod {
    fn pure(f: PureCheckFn) -> Self {
        Self {
            kind: MethodKind::Pure(f),
            needs_pages: true,
        }
    }

    fn site(f: PureCheckFn) -> Self {
        Self {
            kind: MethodKind::Pure(f),
            needs_pages: false,
        }
    }

    fn live_site(f: LiveCheckFn) -> Self {
        Self {
            kind: MethodKind::Live(f),
            needs_pages: false,
        }
    }

    fn live(f: LiveCheckFn) -> Self {
        Self {
            kind: MethodKind::Live(f),
            needs_pages: true,
        }
    }
}

static REGISTRY: LazyLock<HashMap<&'static str, CheckMethod>> = LazyLock::new(|| {
    let mut methods = HashMap::new();

    // status & redirects
    methods.insert("http_status_200", CheckMethod::pure(page::http_status_200));
    methods.insert("sample_http_status_200", CheckMethod::pure(page::sample_http_status_200));
    methods.insert("redirect_loop_absent", CheckMethod::pure(page::redirect_loop_absent));
    methods.insert("redirect_hops_max", CheckMethod::pure(page::redirect_hops_max));
    methods.insert(
        "redirect_permanent_preferred",
        CheckMethod::pure(page::redirect_permanent_preferred),
    );

    // indexability
    methods.insert("https_enabled", CheckMethod::pure(page::https_enabled));
    methods.insert("noindex_absent", CheckMethod::pure(page::noindex_absent));
    methods.insert("noindex_absent_ratio", CheckMethod::pure(page::noindex_absent_ratio));
    methods.insert("auth_wall_ratio", CheckMethod::pure(page::auth_wall_ratio));
    methods.insert("soft404_ratio", CheckMethod::pure(page::soft404_ratio));
    methods.insert("not_found_probe", CheckMethod::live_site(live::not_found_probe));

    // robots & sitemap
    methods.insert("robots_exists", CheckMethod::site(site::robots_exists));
    methods.insert("sitemap_exists", CheckMethod::site(site::sitemap_exists));
    methods.insert(
        "robots_mentions_sitemap",
        CheckMethod::site(site::robots_mentions_sitemap),
    );
    methods.insert("sitemap_parses", CheckMethod::site(site::sitemap_parses));
    methods.insert(
        "robots_allows_pages_ratio",
        CheckMethod::pure(site::robots_allows_pages_ratio),
    );
    methods.insert(
        "sitemap_host_protocol_ratio",
        CheckMethod::site(site::sitemap_host_protocol_ratio),
    );
    methods.insert("sitemap_lastmod_info", CheckMethod::site(site::sitemap_lastmod_info));
    methods.insert(
        "robots_blocks_assets_warning",
        CheckMethod::site(site::robots_blocks_assets_warning),
    );

    // canonical, duplication & URL hygiene
    methods.insert(
        "canonical_present_ratio",
        CheckMethod::pure(page::canonical_present_ratio),
    );
    methods.insert("canonical_single_ratio", CheckMethod::pure(page::canonical_single_ratio));
    methods.insert("canonical_host_ratio", CheckMethod::pure(page::canonical_host_ratio));
    methods.insert(
        "trailing_slash_consistency",
        CheckMethod::pure(page::trailing_slash_consistency),
    );
    methods.insert("www_consistency", CheckMethod::pure(page::www_consistency));
    methods.insert("query_string_warning", CheckMethod::pure(page::query_string_warning));
    methods.insert("duplicate_title_ratio", CheckMethod::pure(page::duplicate_title_ratio));
    methods.insert(
        "duplicate_meta_description_ratio",
        CheckMethod::pure(page::duplicate_meta_description_ratio),
    );

    // on-page basics
    methods.insert("title_present_ratio", CheckMethod::pure(page::title_present_ratio));
    methods.insert("title_length_ratio", CheckMethod::pure(page::title_length_ratio));
    methods.insert(
        "meta_description_present_ratio",
        CheckMethod::pure(page::meta_description_present_ratio),
    );
    methods.insert("h1_present_ratio", CheckMethod::pure(page::h1_present_ratio));
    methods.insert("multiple_h1_warning", CheckMethod::pure(page::multiple_h1_warning));
    methods.insert("html_lang_present", CheckMethod::pure(page::html_lang_present));
    methods.insert("viewport_present", CheckMethod::pure(page::viewport_present));

    // site architecture
    methods.insert(
        "internal_links_present_ratio",
        CheckMethod::pure(page::internal_links_present_ratio),
    );
    methods.insert(
        "broken_internal_links_ratio",
        CheckMethod::live(live::broken_internal_links_ratio),
    );
    methods.insert("click_depth_info", CheckMethod::pure(page::click_depth_info));

    // structured data
    methods.insert("jsonld_present_info", CheckMethod::pure(page::jsonld_present_info));
    methods.insert(
        "jsonld_parse_errors_warning",
        CheckMethod::pure(page::jsonld_parse_errors_warning),
    );

    // trust signals
    methods.insert("trust_page_exists", CheckMethod::pure(site::trust_page_exists));

    // brand info
    methods.insert("og_tags_present", CheckMethod::pure(page::og_tags_present));
    methods.insert("favicon_present", CheckMethod::pure(page::favicon_present));

    methods
});

/// Names of every registered method, mostly useful for diagnostics.
pub fn known_methods() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Resolve a scope to its page selection, in discovery order.
pub fn select_pages<'a>(
    scope: Scope,
    snapshot: &'a CrawlSnapshot,
    sample_limit: usize,
) -> Vec<&'a PageRecord> {
    let pages = snapshot.pages();
    if pages.is_empty() {
        return Vec::new();
    }
    match scope {
        Scope::Homepage => {
            for page in pages {
                if page.final_url == snapshot.normalized_url || page.url == snapshot.normalized_url
                {
                    return vec![page];
                }
            }
            vec![&pages[0]]
        }
        Scope::SampleSet => pages.iter().take(sample_limit).collect(),
        Scope::Site => pages.iter().collect(),
    }
}

/// Evaluate one check definition against the snapshot.
pub async fn run_check(
    definition: &CheckDefinition,
    snapshot: &CrawlSnapshot,
    model: &ScoringModel,
    client: &Client,
    config: &AuditConfig,
) -> CheckVerdict {
    let pages = select_pages(definition.applies_to, snapshot, config.sample_limit);
    let page_sample: Vec<String> = pages
        .iter()
        .take(PAGE_SAMPLE_LIMIT)
        .map(|p| p.final_url.clone())
        .collect();

    let method = REGISTRY.get(definition.method.as_str());
    let outcome = match method {
        None => {
            warn!("unknown check method: {}", definition.method);
            MethodOutcome::na(format!("Unknown/unsupported method: {}", definition.method))
        }
        Some(method) if method.needs_pages && pages.is_empty() => MethodOutcome::na(format!(
            "No pages available for this check (crawl returned {} pages).",
            snapshot.page_count()
        )),
        Some(method) => {
            let ctx = CheckContext {
                pages,
                params: &definition.params,
                snapshot,
            };
            match method.kind {
                MethodKind::Pure(f) => f(&ctx),
                MethodKind::Live(f) => f(&ctx, client).await,
            }
        }
    };

    let score_value = model.status_value(outcome.status);
    let priority = if definition.is_best_practice {
        "best_practice"
    } else if matches!(definition.severity, Severity::Critical | Severity::High) {
        "important"
    } else {
        "normal"
    };

    CheckVerdict {
        check_id: definition.id.clone(),
        category: definition.category.clone(),
        severity: definition.severity,
        is_best_practice: definition.is_best_practice,
        affects_indexing: definition.affects_indexing,
        status: outcome.status,
        score_value,
        applies_to: definition.applies_to,
        page_sample,
        observed: outcome.observed,
        explanation: Explanation {
            short: format!("{}: {}", definition.name, outcome.status.label()),
            details: outcome.note.unwrap_or_default(),
        },
        fix_hint: FixHint {
            priority: priority.to_string(),
            action: definition.fix_action.clone(),
            who: definition.fix_who.clone(),
            effort: definition.fix_effort.clone(),
        },
    }
}

// shared parameter/threshold helpers

pub(crate) fn param_f64(params: &Map<String, Value>, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

pub(crate) fn param_usize(params: &Map<String, Value>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Threshold policy shared by the ratio checks: pass at or above the pass
/// threshold, partial at or above the partial threshold, fail below.
pub(crate) fn ratio_status(ratio: f64, pass_min: f64, partial_min: f64) -> CheckStatus {
    if ratio >= pass_min {
        CheckStatus::Pass
    } else if ratio >= partial_min {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    }
}
