//! Pure page-scope check methods: each looks only at the selected pages
//! (plus the snapshot for the preferred host) and returns an outcome.

use super::{CheckContext, MethodOutcome, param_f64, param_usize, ratio_status};
use crate::model::CheckStatus;
use serde_json::{Value, json};
use sitegrade_scanner::urlnorm;
use std::collections::{BTreeMap, HashSet};
use url::Url;

// --- status & redirects ---

pub(super) fn http_status_200(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let status = if page.is_success() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(
        status,
        json!({ "status_code": page.status_code, "final_url": page.final_url }),
    )
}

pub(super) fn sample_http_status_200(ctx: &CheckContext) -> MethodOutcome {
    let min_ratio = param_f64(ctx.params, "min_ratio", 0.9);
    let bad: Vec<Value> = ctx
        .pages
        .iter()
        .filter(|p| !p.is_success())
        .map(|p| json!({ "url": p.final_url, "status_code": p.status_code }))
        .collect();
    let total = ctx.pages.len();
    let ok_ratio = (total - bad.len()) as f64 / total.max(1) as f64;
    let status = if bad.is_empty() {
        CheckStatus::Pass
    } else if ok_ratio >= min_ratio {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "checked": total, "ok_ratio": ok_ratio, "bad": bad }))
}

pub(super) fn redirect_loop_absent(ctx: &CheckContext) -> MethodOutcome {
    let mut loops: Vec<Value> = Vec::new();
    for page in &ctx.pages {
        let mut seen: HashSet<&str> = HashSet::new();
        let repeated = page
            .redirect_chain
            .iter()
            .any(|hop| !seen.insert(hop.url.as_str()));
        if repeated {
            loops.push(json!({ "url": page.url, "chain": page.redirect_chain }));
        }
    }
    let status = if loops.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "checked": ctx.pages.len(), "loops": loops }))
}

pub(super) fn redirect_hops_max(ctx: &CheckContext) -> MethodOutcome {
    let max_hops = param_usize(ctx.params, "max_hops", 2);
    let mut worst = 0usize;
    let mut offenders: Vec<Value> = Vec::new();
    for page in &ctx.pages {
        let hops = page.redirect_chain.len();
        worst = worst.max(hops);
        if hops > max_hops {
            offenders.push(json!({ "url": page.url, "hops": hops }));
        }
    }
    let status = if worst <= max_hops {
        CheckStatus::Pass
    } else if worst == max_hops + 1 {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(
        status,
        json!({ "max_hops": max_hops, "max_hops_seen": worst, "offenders": offenders }),
    )
}

pub(super) fn redirect_permanent_preferred(ctx: &CheckContext) -> MethodOutcome {
    let mut non_permanent: Vec<Value> = Vec::new();
    for page in &ctx.pages {
        for hop in &page.redirect_chain {
            if hop.status != 301 {
                non_permanent.push(json!({ "url": hop.url, "status": hop.status }));
            }
        }
    }
    let status = if non_permanent.is_empty() {
        CheckStatus::Pass
    } else {
        CheckStatus::Partial
    };
    MethodOutcome::new(status, json!({ "non_permanent": non_permanent }))
}

// --- indexability ---

pub(super) fn https_enabled(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let scheme = Url::parse(&page.final_url)
        .map(|u| u.scheme().to_string())
        .unwrap_or_default();
    let status = if scheme == "https" {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "final_url": page.final_url, "scheme": scheme }))
}

fn has_noindex(page: &sitegrade_scanner::PageRecord) -> bool {
    let header = page
        .headers
        .get("x-robots-tag")
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();
    page.head.meta_robots.contains("noindex") || header.contains("noindex")
}

pub(super) fn noindex_absent(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let status = if has_noindex(page) {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    MethodOutcome::new(
        status,
        json!({
            "meta_robots": page.head.meta_robots,
            "x_robots_tag": page.headers.get("x-robots-tag"),
        }),
    )
}

pub(super) fn noindex_absent_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 1.0);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.8);
    let noindexed: Vec<&str> = ctx
        .pages
        .iter()
        .filter(|p| has_noindex(p))
        .map(|p| p.final_url.as_str())
        .collect();
    let total = ctx.pages.len();
    let ratio = (total - noindexed.len()) as f64 / total.max(1) as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "noindexed": noindexed, "total": total }),
    )
}

pub(super) fn auth_wall_ratio(ctx: &CheckContext) -> MethodOutcome {
    let max_ratio = param_f64(ctx.params, "max_ratio", 0.1);
    let blocked: Vec<&str> = ctx
        .pages
        .iter()
        .filter(|p| p.status_code == 401 || p.status_code == 403)
        .map(|p| p.final_url.as_str())
        .collect();
    let total = ctx.pages.len();
    let ratio = blocked.len() as f64 / total.max(1) as f64;
    let status = if blocked.is_empty() {
        CheckStatus::Pass
    } else if ratio <= max_ratio {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "ratio": ratio, "blocked": blocked, "total": total }))
}

pub(super) fn soft404_ratio(ctx: &CheckContext) -> MethodOutcome {
    let max_ratio = param_f64(ctx.params, "max_ratio", 0.1);
    let suspects: Vec<&str> = ctx
        .pages
        .iter()
        .filter(|p| p.is_success() && p.body.soft404_signal)
        .map(|p| p.final_url.as_str())
        .collect();
    let total = ctx.pages.len();
    let ratio = suspects.len() as f64 / total.max(1) as f64;
    let status = if ratio <= max_ratio {
        CheckStatus::Pass
    } else if ratio >= max_ratio * 2.0 {
        CheckStatus::Fail
    } else {
        CheckStatus::Partial
    };
    MethodOutcome::new(status, json!({ "ratio": ratio, "suspects": suspects, "total": total }))
}

// --- canonical, duplication & URL hygiene ---

pub(super) fn canonical_present_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 0.95);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.8);
    let have = ctx
        .pages
        .iter()
        .filter(|p| !p.head.canonicals.is_empty())
        .count();
    let total = ctx.pages.len();
    let ratio = have as f64 / total.max(1) as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "have": have, "total": total }),
    )
}

pub(super) fn canonical_single_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 1.0);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.9);
    let multi: Vec<Value> = ctx
        .pages
        .iter()
        .filter(|p| p.head.canonicals.len() > 1)
        .map(|p| json!({ "url": p.final_url, "canonical_count": p.head.canonicals.len() }))
        .collect();
    let total = ctx.pages.len();
    let ratio = (total - multi.len()) as f64 / total.max(1) as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "multi": multi, "total": total }),
    )
}

pub(super) fn canonical_host_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 0.95);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.8);
    let preferred_host = &ctx.snapshot.host;

    let with_canonical: Vec<_> = ctx
        .pages
        .iter()
        .filter(|p| !p.head.canonicals.is_empty())
        .collect();
    if with_canonical.is_empty() {
        return MethodOutcome::na("No canonical links found in the sample.");
    }

    let mut offenders: Vec<Value> = Vec::new();
    let mut compliant = 0usize;
    for page in &with_canonical {
        // relative canonical hrefs count as compliant
        let off_host: Vec<&str> = page
            .head
            .canonicals
            .iter()
            .filter(|href| {
                urlnorm::host_of(href).is_some_and(|host| host != *preferred_host)
            })
            .map(String::as_str)
            .collect();
        if off_host.is_empty() {
            compliant += 1;
        } else {
            offenders.push(json!({ "url": page.final_url, "off_host": off_host }));
        }
    }
    let ratio = compliant as f64 / with_canonical.len() as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "offenders": offenders, "checked": with_canonical.len() }),
    )
}

pub(super) fn trailing_slash_consistency(ctx: &CheckContext) -> MethodOutcome {
    let mut with_slash = 0usize;
    let mut without_slash = 0usize;
    for page in &ctx.pages {
        for href in &page.body.all_links {
            // only site-relative path links carry the author's slash style
            if !href.starts_with('/') || href.starts_with("//") {
                continue;
            }
            let path = href.split(['?', '#']).next().unwrap_or("");
            if path.len() <= 1 {
                continue;
            }
            if path.ends_with('/') {
                with_slash += 1;
            } else {
                without_slash += 1;
            }
        }
    }
    let mixed = with_slash > 0 && without_slash > 0;
    let status = if mixed {
        CheckStatus::Partial
    } else {
        CheckStatus::Pass
    };
    MethodOutcome::new(
        status,
        json!({ "with_slash": with_slash, "without_slash": without_slash, "mixed": mixed }),
    )
}

pub(super) fn www_consistency(ctx: &CheckContext) -> MethodOutcome {
    let mut www_hosts: HashSet<String> = HashSet::new();
    let mut bare_hosts: HashSet<String> = HashSet::new();
    for page in &ctx.pages {
        let Some(host) = urlnorm::host_of(&page.final_url) else {
            continue;
        };
        match host.strip_prefix("www.") {
            Some(bare) => {
                www_hosts.insert(bare.to_string());
            }
            None => {
                bare_hosts.insert(host);
            }
        }
    }
    let mixed = www_hosts.iter().any(|bare| bare_hosts.contains(bare));
    let status = if mixed {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    MethodOutcome::new(
        status,
        json!({
            "www_hosts": www_hosts.iter().map(|h| format!("www.{h}")).collect::<Vec<_>>(),
            "bare_hosts": bare_hosts,
            "mixed": mixed,
        }),
    )
}

pub(super) fn query_string_warning(ctx: &CheckContext) -> MethodOutcome {
    let max_ratio = param_f64(ctx.params, "max_ratio", 0.3);
    let with_query: Vec<&str> = ctx
        .pages
        .iter()
        .filter(|p| {
            Url::parse(&p.final_url)
                .map(|u| u.query().is_some())
                .unwrap_or(false)
        })
        .map(|p| p.final_url.as_str())
        .collect();
    let total = ctx.pages.len();
    let ratio = with_query.len() as f64 / total.max(1) as f64;
    let status = if ratio <= max_ratio {
        CheckStatus::Pass
    } else if ratio <= max_ratio * 2.0 {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "ratio": ratio, "with_query": with_query, "total": total }))
}

fn duplicate_value_ratio(values: Vec<String>, max_ratio: f64, what: &str) -> MethodOutcome {
    if values.is_empty() {
        return MethodOutcome::na(format!("No {what} found in the sample."));
    }
    let total = values.len();
    let distinct: HashSet<&String> = values.iter().collect();
    let duplicates = total - distinct.len();
    let ratio = duplicates as f64 / total as f64;
    let status = if duplicates == 0 {
        CheckStatus::Pass
    } else if ratio <= max_ratio {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(
        status,
        json!({
            "total": total,
            "distinct": distinct.len(),
            "duplicates": duplicates,
            "ratio": ratio,
        }),
    )
}

pub(super) fn duplicate_title_ratio(ctx: &CheckContext) -> MethodOutcome {
    let max_ratio = param_f64(ctx.params, "max_ratio", 0.2);
    let values: Vec<String> = ctx
        .pages
        .iter()
        .filter(|p| !p.head.title.trim().is_empty())
        .map(|p| p.head.title.trim().to_string())
        .collect();
    duplicate_value_ratio(values, max_ratio, "titles")
}

pub(super) fn duplicate_meta_description_ratio(ctx: &CheckContext) -> MethodOutcome {
    let max_ratio = param_f64(ctx.params, "max_ratio", 0.2);
    let values: Vec<String> = ctx
        .pages
        .iter()
        .filter(|p| !p.head.meta_description.trim().is_empty())
        .map(|p| p.head.meta_description.trim().to_string())
        .collect();
    duplicate_value_ratio(values, max_ratio, "meta descriptions")
}

// --- on-page basics ---

fn presence_ratio(
    ctx: &CheckContext,
    default_pass: f64,
    default_partial: f64,
    present: impl Fn(&sitegrade_scanner::PageRecord) -> bool,
) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", default_pass);
    let partial_min = param_f64(ctx.params, "partial_ratio", default_partial);
    let have = ctx.pages.iter().filter(|p| present(p)).count();
    let total = ctx.pages.len();
    let ratio = have as f64 / total.max(1) as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "have": have, "total": total }),
    )
}

pub(super) fn title_present_ratio(ctx: &CheckContext) -> MethodOutcome {
    presence_ratio(ctx, 0.98, 0.8, |p| !p.head.title.trim().is_empty())
}

pub(super) fn meta_description_present_ratio(ctx: &CheckContext) -> MethodOutcome {
    presence_ratio(ctx, 0.95, 0.8, |p| !p.head.meta_description.trim().is_empty())
}

pub(super) fn h1_present_ratio(ctx: &CheckContext) -> MethodOutcome {
    presence_ratio(ctx, 0.9, 0.75, |p| p.body.h1_count >= 1)
}

pub(super) fn multiple_h1_warning(ctx: &CheckContext) -> MethodOutcome {
    let multi: Vec<Value> = ctx
        .pages
        .iter()
        .filter(|p| p.body.h1_count > 1)
        .map(|p| json!({ "url": p.final_url, "h1_count": p.body.h1_count }))
        .collect();
    let total = ctx.pages.len();
    let status = if multi.is_empty() {
        CheckStatus::Pass
    } else if multi.len() <= (total / 5).max(1) {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "multi": multi, "checked": total }))
}

pub(super) fn title_length_ratio(ctx: &CheckContext) -> MethodOutcome {
    let min_length = param_usize(ctx.params, "min_length", 30);
    let max_length = param_usize(ctx.params, "max_length", 65);
    let pass_min = param_f64(ctx.params, "min_ratio", 0.9);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.7);

    let titled: Vec<_> = ctx
        .pages
        .iter()
        .filter(|p| !p.head.title.trim().is_empty())
        .collect();
    if titled.is_empty() {
        return MethodOutcome::na("No titles found in the sample.");
    }

    let mut offenders: Vec<Value> = Vec::new();
    let mut in_band = 0usize;
    for page in &titled {
        let length = page.head.title.trim().chars().count();
        if (min_length..=max_length).contains(&length) {
            in_band += 1;
        } else {
            offenders.push(json!({ "url": page.final_url, "length": length }));
        }
    }
    let ratio = in_band as f64 / titled.len() as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({
            "ratio": ratio,
            "in_band": in_band,
            "checked": titled.len(),
            "offenders": offenders,
        }),
    )
}

pub(super) fn html_lang_present(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let status = if page.head.html_lang.is_empty() {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    MethodOutcome::new(status, json!({ "html_lang": page.head.html_lang }))
}

pub(super) fn viewport_present(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let status = if page.head.viewport.is_empty() {
        CheckStatus::Fail
    } else {
        CheckStatus::Pass
    };
    MethodOutcome::new(status, json!({ "meta_viewport": page.head.viewport }))
}

// --- site architecture ---

pub(super) fn internal_links_present_ratio(ctx: &CheckContext) -> MethodOutcome {
    let pass_min = param_f64(ctx.params, "min_ratio", 0.9);
    let partial_min = param_f64(ctx.params, "partial_ratio", 0.7);
    let html_pages: Vec<_> = ctx.pages.iter().filter(|p| !p.html.is_empty()).collect();
    if html_pages.is_empty() {
        return MethodOutcome::na("No HTML pages in the sample.");
    }
    let have = html_pages
        .iter()
        .filter(|p| !p.internal_links.is_empty())
        .count();
    let ratio = have as f64 / html_pages.len() as f64;
    MethodOutcome::new(
        ratio_status(ratio, pass_min, partial_min),
        json!({ "ratio": ratio, "have": have, "checked": html_pages.len() }),
    )
}

pub(super) fn click_depth_info(ctx: &CheckContext) -> MethodOutcome {
    let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for page in &ctx.pages {
        *distribution.entry(page.depth).or_default() += 1;
    }
    let max_depth_seen = distribution.keys().max().copied().unwrap_or(0);
    let by_depth: serde_json::Map<String, Value> = distribution
        .iter()
        .map(|(depth, count)| (depth.to_string(), json!(count)))
        .collect();
    MethodOutcome::new(
        CheckStatus::Pass,
        json!({ "distribution": by_depth, "max_depth_seen": max_depth_seen }),
    )
}

// --- structured data ---

pub(super) fn jsonld_present_info(ctx: &CheckContext) -> MethodOutcome {
    let have = ctx
        .pages
        .iter()
        .filter(|p| p.jsonld.jsonld_count > 0)
        .count();
    let total = ctx.pages.len();
    let ratio = have as f64 / total.max(1) as f64;
    let status = if have > 0 {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "ratio": ratio, "have": have, "total": total }))
}

pub(super) fn jsonld_parse_errors_warning(ctx: &CheckContext) -> MethodOutcome {
    let max_ratio = param_f64(ctx.params, "max_ratio", 0.2);
    let with_blocks: Vec<_> = ctx
        .pages
        .iter()
        .filter(|p| p.jsonld.jsonld_count > 0)
        .collect();
    if with_blocks.is_empty() {
        return MethodOutcome::na("No structured data found in the sample.");
    }
    let affected: Vec<&str> = with_blocks
        .iter()
        .filter(|p| p.jsonld.jsonld_parse_errors > 0)
        .map(|p| p.final_url.as_str())
        .collect();
    let ratio = affected.len() as f64 / with_blocks.len() as f64;
    let status = if affected.is_empty() {
        CheckStatus::Pass
    } else if ratio <= max_ratio {
        CheckStatus::Partial
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(
        status,
        json!({ "ratio": ratio, "affected": affected, "checked": with_blocks.len() }),
    )
}

// --- brand info ---

pub(super) fn og_tags_present(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let has_any = page.head.open_graph.values().any(|v| !v.is_empty());
    let status = if has_any {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "open_graph": page.head.open_graph }))
}

pub(super) fn favicon_present(ctx: &CheckContext) -> MethodOutcome {
    let page = ctx.pages[0];
    let status = if page.head.favicon.is_some() {
        CheckStatus::Pass
    } else {
        CheckStatus::Fail
    };
    MethodOutcome::new(status, json!({ "favicon": page.head.favicon }))
}
