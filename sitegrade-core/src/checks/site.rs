//! Site-level check methods: robots.txt, the sitemap and the crawled URL
//! list. These run even when the crawl recorded zero pages.

use super::{CheckContext, MethodOutcome, param_f64};
use crate::model::CheckStatus;
use crate::robots::RobotsRules;
use crate::sitemap::{SitemapKind, parse_sitemap};
use serde_json::{Value, json};
use sitegrade_scanner::urlnorm;
use url::Url;

fn fetched_ok(body: &Option<String>, status: Option<u16>) -> bool {
    body.as_ref().is_some_and(|b| !b.is_empty())
        && status.is_none_or(|s| (200..300).contains(&s))
}

pub(super) fn robots_exists(ctx: &CheckContext) -> MethodOutcome {
    let snapshot = ctx.snapshot;
    let ok = fetched_ok(&snapshot.robots_txt, snapshot.robots_status);
    MethodOutcome::new(
        if ok { CheckStatus::Pass } else { CheckStatus::Fail },
        json!({
            "robots_status": snapshot.robots_status,
            "has_robots": snapshot.robots_txt.as_ref().is_some_and(|b| !b.is_empty()),
        }),
    )
}

pub(super) fn sitemap_exists(ctx: &CheckContext) -> MethodOutcome {
    let snapshot = ctx.snapshot;
    let ok = fetched_ok(&snapshot.sitemap_xml, snapshot.sitemap_status);
    MethodOutcome::new(
        if ok { CheckStatus::Pass } else { CheckStatus::Fail },
        json!({
            "sitemap_url": snapshot.sitemap_url,
            "sitemap_status": snapshot.sitemap_status,
            "has_sitemap": snapshot.sitemap_xml.as_ref().is_some_and(|b| !b.is_empty()),
        }),
    )
}

pub(super) fn robots_mentions_sitemap(ctx: &CheckContext) -> MethodOutcome {
    let Some(ref robots_txt) = ctx.snapshot.robots_txt else {
        return MethodOutcome::new(
            CheckStatus::Fail,
            json!({ "sitemap_directives": [], "has_robots": false }),
        );
    };
    let rules = RobotsRules::parse(robots_txt);
    let status = if rules.mentions_sitemap() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(
        status,
        json!({ "sitemap_directives": rules.sitemaps, "has_robots": true }),
    )
}

pub(super) fn sitemap_parses(ctx: &CheckContext) -> MethodOutcome {
    let Some(ref xml) = ctx.snapshot.sitemap_xml else {
        return MethodOutcome::new(
            CheckStatus::Fail,
            json!({ "parsed_locs": 0, "root": Value::Null }),
        );
    };
    let parsed = parse_sitemap(xml);
    let status = if parsed.kind.is_some() && !parsed.entries.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(
        status,
        json!({
            "root": parsed.kind.map(|k| k.as_str()),
            "parsed_locs": parsed.entries.len(),
            "is_index": parsed.kind == Some(SitemapKind::SitemapIndex),
        }),
    )
}

pub(super) fn robots_allows_pages_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 1.0);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.8);

    let rules = ctx
        .snapshot
        .robots_txt
        .as_deref()
        .map(RobotsRules::parse)
        .unwrap_or_default();

    let mut blocked: Vec<&str> = Vec::new();
    for page in &ctx.pages {
        let path = Url::parse(&page.final_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string());
        if !rules.is_allowed(&path) {
            blocked.push(page.final_url.as_str());
        }
    }
    let total = ctx.pages.len();
    let ratio = (total - blocked.len()) as f64 / total.max(1) as f64;
    MethodOutcome::new(
        super::ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "blocked": blocked, "checked": total }),
    )
}

pub(super) fn sitemap_host_protocol_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 0.95);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.8);

    let Some(ref xml) = ctx.snapshot.sitemap_xml else {
        return MethodOutcome::na("No sitemap was fetched.");
    };
    let parsed = parse_sitemap(xml);
    if parsed.entries.is_empty() {
        return MethodOutcome::na("The sitemap has no entries to compare.");
    }

    let preferred_scheme = Url::parse(&ctx.snapshot.normalized_url)
        .map(|u| u.scheme().to_string())
        .unwrap_or_else(|_| "https".to_string());
    let preferred_host = &ctx.snapshot.host;

    let mut mismatched: Vec<String> = Vec::new();
    let mut matching = 0usize;
    for loc in parsed.locs() {
        let scheme_ok = Url::parse(loc)
            .map(|u| u.scheme() == preferred_scheme)
            .unwrap_or(false);
        let host_ok = urlnorm::host_of(loc).is_some_and(|host| host == *preferred_host);
        if scheme_ok && host_ok {
            matching += 1;
        } else {
            mismatched.push(loc.to_string());
        }
    }
    let ratio = matching as f64 / parsed.entries.len() as f64;
    MethodOutcome::new(
        super::ratio_status(ratio, pass_min, partial_min),
        json!({
            "ratio": ratio,
            "matching": matching,
            "checked": parsed.entries.len(),
            "mismatched": mismatched,
        }),
    )
}

pub(super) fn sitemap_lastmod_info(ctx: &CheckContext) -> MethodOutcome {
    let parsed = ctx
        .snapshot
        .sitemap_xml
        .as_deref()
        .map(parse_sitemap)
        .unwrap_or_default();
    // informational: reported, never scored against
    MethodOutcome::new(
        CheckStatus::Pass,
        json!({
            "with_lastmod": parsed.lastmod_count(),
            "total": parsed.entries.len(),
        }),
    )
}

pub(super) fn robots_blocks_assets_warning(_ctx: &CheckContext) -> MethodOutcome {
    MethodOutcome::na("Not implemented.")
}

pub(super) fn trust_page_exists(ctx: &CheckContext) -> MethodOutcome {
    let kind = ctx
        .params
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("contact");
    let keywords: Vec<String> = ctx
        .params
        .get("keywords")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_else(|| vec![kind.to_ascii_lowercase()]);

    let matched: Vec<&str> = ctx
        .snapshot
        .crawled_urls
        .iter()
        .filter(|url| {
            let lowered = url.to_ascii_lowercase();
            keywords.iter().any(|kw| lowered.contains(kw.as_str()))
        })
        .map(String::as_str)
        .collect();

    let status = if matched.is_empty() {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    MethodOutcome::new(status, json!({ "kind": kind, "matched": matched }))
}
