//! Sitemap XML parsing: a single event-driven scan that accepts both a
//! `<urlset>` and a `<sitemapindex>` root, matching on the local element
//! name so namespace prefixes do not matter. Malformed XML degrades to an
//! empty entry list, never an error.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    UrlSet,
    SitemapIndex,
}

impl SitemapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SitemapKind::UrlSet => "urlset",
            SitemapKind::SitemapIndex => "sitemapindex",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSitemap {
    pub kind: Option<SitemapKind>,
    pub entries: Vec<SitemapEntry>,
}

impl ParsedSitemap {
    pub fn locs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.loc.as_str())
    }

    pub fn lastmod_count(&self) -> usize {
        self.entries.iter().filter(|e| e.lastmod.is_some()).count()
    }
}

/// Strip any namespace prefix from an element name.
fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_ascii_lowercase(),
        None => name.to_ascii_lowercase(),
    }
}

pub fn parse_sitemap(xml: &str) -> ParsedSitemap {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedSitemap::default();
    let mut in_entry = false;
    let mut current_field: Option<String> = None;
    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = local_name(start.name().as_ref());
                match name.as_str() {
                    "urlset" if parsed.kind.is_none() => parsed.kind = Some(SitemapKind::UrlSet),
                    "sitemapindex" if parsed.kind.is_none() => {
                        parsed.kind = Some(SitemapKind::SitemapIndex)
                    }
                    // one entry element per record in either flavor
                    "url" | "sitemap" => {
                        in_entry = true;
                        loc = None;
                        lastmod = None;
                    }
                    "loc" | "lastmod" if in_entry => current_field = Some(name),
                    _ => {}
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(ref field) = current_field {
                    let value = text
                        .unescape()
                        .map(|cow| cow.trim().to_string())
                        .unwrap_or_default();
                    if !value.is_empty() {
                        match field.as_str() {
                            "loc" => loc = Some(value),
                            "lastmod" => lastmod = Some(value),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(end)) => {
                let name = local_name(end.name().as_ref());
                match name.as_str() {
                    "url" | "sitemap" => {
                        if let Some(loc) = loc.take() {
                            parsed.entries.push(SitemapEntry {
                                loc,
                                lastmod: lastmod.take(),
                            });
                        }
                        in_entry = false;
                    }
                    "loc" | "lastmod" => current_field = None,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            // malformed XML: keep whatever parsed so far
            Err(_) => break,
            Ok(_) => {}
        }
    }

    parsed
}
