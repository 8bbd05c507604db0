use crate::extract::{BodySignals, HeadSignals, JsonLdSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One hop of a redirect chain: the URL that redirected and the 3xx
/// status it answered with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectHop {
    pub url: String,
    pub status: u16,
}

/// One fetched page. Immutable once inserted into the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Normalized URL as requested — the snapshot key.
    pub url: String,
    /// Normalized URL after following redirects.
    pub final_url: String,
    pub status_code: u16,
    /// Response headers with lowercased keys.
    pub headers: HashMap<String, String>,
    pub redirect_chain: Vec<RedirectHop>,
    /// 0 = seed.
    pub depth: usize,
    /// Size-capped HTML; empty for non-HTML responses.
    pub html: String,
    pub head: HeadSignals,
    pub body: BodySignals,
    pub jsonld: JsonLdSummary,
    /// Same-host outbound links, absolutized and normalized.
    pub internal_links: Vec<String>,
}

impl PageRecord {
    pub fn new(url: String) -> Self {
        Self {
            final_url: url.clone(),
            url,
            status_code: 0,
            headers: HashMap::new(),
            redirect_chain: Vec::new(),
            depth: 0,
            html: String::new(),
            head: HeadSignals::default(),
            body: BodySignals::default(),
            jsonld: JsonLdSummary::default(),
            internal_links: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// The complete, immutable result of one crawl. Pages are kept in
/// discovery order; lookup is by normalized request URL.
#[derive(Debug, Clone, Default)]
pub struct CrawlSnapshot {
    /// Target URL exactly as the caller supplied it.
    pub target_url: String,
    /// Normalized seed URL.
    pub normalized_url: String,
    /// Resolved crawl authority (may differ from the seed's when the
    /// seed redirected off-host).
    pub host: String,
    pages: Vec<PageRecord>,
    index: HashMap<String, usize>,
    pub crawled_urls: Vec<String>,
    pub errors: Vec<String>,
    pub robots_txt: Option<String>,
    pub robots_status: Option<u16>,
    pub sitemap_url: Option<String>,
    pub sitemap_xml: Option<String>,
    pub sitemap_status: Option<u16>,
}

impl CrawlSnapshot {
    pub fn new(target_url: String, normalized_url: String, host: String) -> Self {
        Self {
            target_url,
            normalized_url,
            host,
            ..Default::default()
        }
    }

    /// Insert a page keyed by its normalized request URL. First-seen wins;
    /// a revisit is ignored so discovery order is stable.
    pub fn insert_page(&mut self, page: PageRecord) {
        if self.index.contains_key(&page.url) {
            return;
        }
        self.index.insert(page.url.clone(), self.pages.len());
        self.crawled_urls.push(page.url.clone());
        self.pages.push(page);
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.index.get(url).map(|&i| &self.pages[i])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
