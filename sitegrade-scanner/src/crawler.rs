use crate::error::{Result, ScanError};
use crate::extract;
use crate::snapshot::{CrawlSnapshot, PageRecord, RedirectHop};
use crate::urlnorm;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

const MAX_REDIRECT_HOPS: usize = 10;
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Breadth-first, depth- and count-bounded crawler. One frontier, one
/// visited set per run; the frontier is processed sequentially so that
/// discovery order is the snapshot insertion order.
pub struct Crawler {
    client: Client,
    max_pages: usize,
    max_depth: usize,
    max_fetch_bytes: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_config(
            "sitegrade/0.2 (+https://github.com/trapdoorsec/sitegrade)",
            Duration::from_secs(15),
        )
    }

    pub fn with_config(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            // redirects are followed manually so the hop chain is observable
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_pages: 10,
            max_depth: 2,
            max_fetch_bytes: 2_000_000,
            progress_callback: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_fetch_bytes(mut self, max_fetch_bytes: usize) -> Self {
        self.max_fetch_bytes = max_fetch_bytes;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// A shared client for live checks that want the same UA/timeout
    /// profile as the crawl itself.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn crawl(&self, target_url: &str) -> Result<CrawlSnapshot> {
        let start = urlnorm::normalize(target_url);
        let seed = Url::parse(&start)
            .map_err(|e| ScanError::InvalidUrl(format!("{target_url}: {e}")))?;
        let mut host = urlnorm::host_of(&start)
            .ok_or_else(|| ScanError::InvalidUrl(format!("{target_url}: no host")))?;

        info!(
            "starting crawl of {start} (max_pages={}, max_depth={})",
            self.max_pages, self.max_depth
        );

        let mut snapshot = CrawlSnapshot::new(target_url.to_string(), start.clone(), host.clone());

        let robots_url = format!("{}://{}/robots.txt", seed.scheme(), host);
        match self.fetch(&robots_url).await {
            Ok(outcome) => {
                snapshot.robots_txt = Some(outcome.body);
                snapshot.robots_status = Some(outcome.status);
            }
            Err(e) => snapshot.errors.push(format!("{robots_url}: {e}")),
        }

        self.discover_sitemap(seed.scheme(), &mut snapshot).await;

        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        queue.push_back((start, 0));

        while snapshot.page_count() < self.max_pages {
            let Some((url, depth)) = queue.pop_front() else {
                break;
            };
            let url = urlnorm::normalize(&url);
            if !visited.insert(url.clone()) {
                continue;
            }
            if !urlnorm::is_fetchable(&url) {
                continue;
            }
            // only the seed page may sit on a different host; it re-anchors
            // the crawl host when its redirect lands elsewhere
            let on_host = urlnorm::host_of(&url).is_some_and(|h| h == host);
            if !on_host && snapshot.page_count() > 0 {
                debug!("skipping off-host url {url}");
                continue;
            }

            if let Some(ref callback) = self.progress_callback {
                callback(snapshot.page_count(), url.clone());
            }

            let outcome = match self.fetch(&url).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("fetch failed for {url}: {e}");
                    snapshot.errors.push(format!("{url}: {e}"));
                    continue;
                }
            };

            let final_url = urlnorm::normalize(&outcome.final_url);
            if snapshot.page_count() == 0
                && let Some(final_host) = urlnorm::host_of(&final_url)
                && final_host != host
            {
                debug!("re-anchoring crawl host to {final_host}");
                host = final_host.clone();
                snapshot.host = final_host;
            }

            let is_html = outcome
                .content_type
                .as_deref()
                .map(|ct| {
                    let ct = ct.to_ascii_lowercase();
                    ct.is_empty() || ct.contains("text/html") || ct.contains("application/xhtml+xml")
                })
                .unwrap_or(true);

            let mut page = PageRecord::new(url.clone());
            page.final_url = final_url;
            page.status_code = outcome.status;
            page.headers = outcome.headers;
            page.redirect_chain = outcome.chain;
            page.depth = depth;

            if is_html && !outcome.body.is_empty() {
                page.html = outcome.body;
                let (head, body) = extract::extract_signals(&page.html);
                page.jsonld = extract::jsonld_summary(&head.jsonld_blocks);

                let mut internal_links = Vec::new();
                for href in &body.all_links {
                    let Some(absolute) = urlnorm::absolutize(&page.final_url, href) else {
                        continue;
                    };
                    if urlnorm::same_host(&absolute, &page.final_url) {
                        internal_links.push(absolute);
                    }
                }

                if depth < self.max_depth {
                    for link in &internal_links {
                        if !visited.contains(link) {
                            queue.push_back((link.clone(), depth + 1));
                        }
                    }
                }

                page.head = head;
                page.body = body;
                page.internal_links = internal_links;
            }

            snapshot.insert_page(page);
        }

        info!(
            "crawl complete: {} pages, {} errors",
            snapshot.page_count(),
            snapshot.errors.len()
        );
        Ok(snapshot)
    }

    /// Fetch one URL, following redirects manually and recording the hop
    /// chain. The body is truncated to the configured byte budget.
    async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        let mut current = url.to_string();
        let mut chain: Vec<RedirectHop> = Vec::new();

        for _ in 0..=MAX_REDIRECT_HOPS {
            debug!("fetching {current}");
            let response = self
                .client
                .get(&current)
                .header(ACCEPT, HTML_ACCEPT)
                .send()
                .await?;

            let status = response.status();
            if status.is_redirection()
                && let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                && let Some(next) = Url::parse(&current)
                    .ok()
                    .and_then(|base| base.join(location).ok())
            {
                chain.push(RedirectHop {
                    url: current.clone(),
                    status: status.as_u16(),
                });
                current = next.to_string();
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_ascii_lowercase(),
                        value.to_str().unwrap_or("").to_string(),
                    )
                })
                .collect::<HashMap<_, _>>();

            let bytes = response.bytes().await?;
            let body = truncate_utf8(&bytes, self.max_fetch_bytes);

            return Ok(FetchOutcome {
                final_url: current,
                status: status.as_u16(),
                headers,
                chain,
                content_type,
                body,
            });
        }

        Err(ScanError::Other(format!("too many redirects fetching {url}")))
    }

    /// Sitemap discovery: `Sitemap:` directives from robots.txt, then the
    /// conventional paths, accepting the first body that looks like a
    /// sitemap; otherwise an unconditional fallback fetch of /sitemap.xml
    /// whose result is recorded as-is.
    async fn discover_sitemap(&self, scheme: &str, snapshot: &mut CrawlSnapshot) {
        let base = format!("{scheme}://{}", snapshot.host);

        let mut candidates: Vec<String> = Vec::new();
        if let Some(ref robots) = snapshot.robots_txt {
            for line in robots.lines() {
                let line = line.trim();
                if line.len() > 8 && line[..8].eq_ignore_ascii_case("sitemap:") {
                    let target = line[8..].trim();
                    if !target.is_empty() {
                        candidates.push(target.to_string());
                    }
                }
            }
        }
        candidates.push(format!("{base}/sitemap.xml"));
        candidates.push(format!("{base}/sitemap_index.xml"));
        candidates.push(format!("{base}/sitemap-index.xml"));

        for candidate in &candidates {
            let sitemap_url = urlnorm::normalize(candidate);
            let Ok(outcome) = self.fetch(&sitemap_url).await else {
                continue;
            };
            if (200..300).contains(&outcome.status) && !outcome.body.is_empty() {
                let lowered = outcome.body.to_lowercase();
                if lowered.contains("<urlset") || lowered.contains("<sitemapindex") {
                    debug!("sitemap found at {sitemap_url}");
                    snapshot.sitemap_url = Some(sitemap_url);
                    snapshot.sitemap_xml = Some(outcome.body);
                    snapshot.sitemap_status = Some(outcome.status);
                    return;
                }
            }
        }

        let fallback = urlnorm::normalize(&format!("{base}/sitemap.xml"));
        match self.fetch(&fallback).await {
            Ok(outcome) => {
                snapshot.sitemap_url = Some(fallback);
                snapshot.sitemap_xml = Some(outcome.body);
                snapshot.sitemap_status = Some(outcome.status);
            }
            Err(_) => {
                snapshot.sitemap_url = Some(fallback);
            }
        }
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

struct FetchOutcome {
    final_url: String,
    status: u16,
    headers: HashMap<String, String>,
    chain: Vec<RedirectHop>,
    content_type: Option<String>,
    body: String,
}

/// Truncate to the byte budget at a safe boundary, then decode leniently,
/// dropping any trailing malformed fragment.
fn truncate_utf8(bytes: &[u8], max_bytes: usize) -> String {
    let truncated = bytes.len() > max_bytes;
    let slice = if truncated { &bytes[..max_bytes] } else { bytes };
    let mut text = String::from_utf8_lossy(slice).into_owned();
    if truncated {
        while text.ends_with('\u{FFFD}') {
            text.truncate(text.len() - '\u{FFFD}'.len_utf8());
        }
    }
    text
}
