//! Live check methods: the only checks that go back to the network after
//! the crawl. A failed probe degrades to `na`, never to a run failure.

use super::{CheckContext, MethodOutcome, param_f64};
use crate::model::CheckStatus;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const BROKEN_LINK_PAGE_LIMIT: usize = 10;
const BROKEN_LINK_PER_PAGE_LIMIT: usize = 10;
const BROKEN_LINK_TOTAL_LIMIT: usize = 25;
const BROKEN_LINK_CONCURRENCY: usize = 5;

/// Request a random non-existent path under the seed host and expect a
/// clean 404. A 2xx answer means the site likely serves a catch-all page
/// that will soft-404 for search engines.
pub(super) fn not_found_probe<'a>(
    ctx: &'a CheckContext<'a>,
    client: &'a Client,
) -> BoxFuture<'a, MethodOutcome> {
    Box::pin(async move {
        let Ok(seed) = Url::parse(&ctx.snapshot.normalized_url) else {
            return MethodOutcome::na("Seed URL is not parseable.");
        };
        let probe_url = format!(
            "{}://{}/{}-sitegrade-probe",
            seed.scheme(),
            ctx.snapshot.host,
            uuid::Uuid::new_v4().simple()
        );
        debug!("probing {probe_url}");

        match client.get(&probe_url).send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let status = if status_code == 404 {
                    CheckStatus::Pass
                } else if (200..300).contains(&status_code) {
                    CheckStatus::Fail
                } else {
                    CheckStatus::Partial
                };
                MethodOutcome::new(
                    status,
                    json!({ "probe_url": probe_url, "status_code": status_code }),
                )
            }
            Err(e) => MethodOutcome::na(format!("Probe request failed: {e}")),
        }
    })
}

/// Re-fetch a bounded sample of discovered internal links and count
/// 4xx/5xx answers and network failures as broken.
pub(super) fn broken_internal_links_ratio<'a>(
    ctx: &'a CheckContext<'a>,
    client: &'a Client,
) -> BoxFuture<'a, MethodOutcome> {
    Box::pin(async move {
        let max_ratio = param_f64(ctx.params, "max_ratio", 0.1);

        let mut seen: HashSet<&str> = HashSet::new();
        let mut candidates: Vec<String> = Vec::new();
        'pages: for page in ctx.pages.iter().take(BROKEN_LINK_PAGE_LIMIT) {
            let mut taken = 0usize;
            for link in &page.internal_links {
                if candidates.len() >= BROKEN_LINK_TOTAL_LIMIT {
                    break 'pages;
                }
                if taken >= BROKEN_LINK_PER_PAGE_LIMIT {
                    break;
                }
                if seen.insert(link.as_str()) {
                    candidates.push(link.clone());
                    taken += 1;
                }
            }
        }
        if candidates.is_empty() {
            return MethodOutcome::na("No internal links available to sample.");
        }

        let checked = candidates.len();
        let results: Vec<(String, Option<u16>)> = stream::iter(candidates)
            .map(|link| {
                let client = client.clone();
                async move {
                    match client.get(&link).send().await {
                        Ok(response) => (link, Some(response.status().as_u16())),
                        Err(e) => {
                            debug!("link check failed for {link}: {e}");
                            (link, None)
                        }
                    }
                }
            })
            .buffer_unordered(BROKEN_LINK_CONCURRENCY)
            .collect()
            .await;

        let broken: Vec<Value> = results
            .iter()
            .filter(|(_, status)| status.is_none_or(|s| s >= 400))
            .map(|(link, status)| json!({ "url": link, "status_code": status }))
            .collect();
        let ratio = broken.len() as f64 / checked as f64;
        let status = if broken.is_empty() || ratio <= max_ratio {
            CheckStatus::Pass
        } else if ratio >= max_ratio * 2.0 {
            CheckStatus::Fail
        } else {
            CheckStatus::Partial
        };
        MethodOutcome::new(
            status,
            json!({ "ratio": ratio, "checked": checked, "broken": broken }),
        )
    })
}
