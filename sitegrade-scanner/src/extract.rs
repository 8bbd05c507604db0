//! Extraction of head and body signals from a single page's markup.
//!
//! The extractor only sees capped HTML text; it never touches the network
//! and never fails — malformed markup degrades to empty/default signals.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Phrases that mark a successful response as a probable not-found page.
pub const SOFT404_PHRASES: &[&str] = &[
    "page not found",
    "not found",
    "404",
    "doesn't exist",
    "does not exist",
    "we can’t find",
    "we can't find",
    "error 404",
    "page was not found",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeadSignals {
    pub title: String,
    pub meta_description: String,
    /// Lowercased value of `<meta name="robots">`.
    pub meta_robots: String,
    pub viewport: String,
    pub html_lang: String,
    /// Every canonical link href in document order, duplicates kept:
    /// more than one canonical is itself a defect signal.
    pub canonicals: Vec<String>,
    /// `og:*` property -> content. Last occurrence wins on duplicate keys.
    pub open_graph: HashMap<String, String>,
    pub favicon: Option<String>,
    /// Raw bodies of `<script type="application/ld+json">` blocks.
    pub jsonld_blocks: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodySignals {
    pub h1_count: usize,
    /// Every non-empty `<a href>` value as written in the document.
    pub all_links: Vec<String>,
    pub images: Vec<ImageRef>,
    /// Visible text, script/style excluded, whitespace-joined.
    pub text: String,
    pub soft404_signal: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonLdSummary {
    pub jsonld_count: usize,
    pub jsonld_parse_errors: usize,
}

/// Parse one page and pull out both signal records.
pub fn extract_signals(html: &str) -> (HeadSignals, BodySignals) {
    let document = Html::parse_document(html);
    (extract_head(&document), extract_body(&document))
}

/// Attempt each JSON-LD block independently; malformed blocks are counted
/// as parse errors, not extraction failures.
pub fn jsonld_summary(blocks: &[String]) -> JsonLdSummary {
    let errors = blocks
        .iter()
        .filter(|block| serde_json::from_str::<serde_json::Value>(block).is_err())
        .count();
    JsonLdSummary {
        jsonld_count: blocks.len(),
        jsonld_parse_errors: errors,
    }
}

fn extract_head(document: &Html) -> HeadSignals {
    let mut head = HeadSignals::default();

    let html_selector = Selector::parse("html").unwrap();
    if let Some(root) = document.select(&html_selector).next()
        && let Some(lang) = root.value().attr("lang")
    {
        head.html_lang = lang.trim().to_string();
    }

    let title_selector = Selector::parse("head title").unwrap();
    if let Some(title) = document.select(&title_selector).next() {
        head.title = title.text().collect::<String>().trim().to_string();
    }

    let meta_selector = Selector::parse("head meta").unwrap();
    for meta in document.select(&meta_selector) {
        let name = meta
            .value()
            .attr("name")
            .map(|n| n.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let property = meta
            .value()
            .attr("property")
            .map(|p| p.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let content = meta.value().attr("content").unwrap_or("").trim().to_string();

        match name.as_str() {
            "description" if head.meta_description.is_empty() => {
                head.meta_description = content.clone();
            }
            "robots" if head.meta_robots.is_empty() => {
                head.meta_robots = content.to_ascii_lowercase();
            }
            "viewport" if head.viewport.is_empty() => {
                head.viewport = content.clone();
            }
            _ => {}
        }
        if property.starts_with("og:") {
            head.open_graph.insert(property, content);
        }
    }

    let link_selector = Selector::parse("head link").unwrap();
    for link in document.select(&link_selector) {
        let rel = link
            .value()
            .attr("rel")
            .map(|r| r.to_ascii_lowercase())
            .unwrap_or_default();
        let rels: Vec<&str> = rel.split_whitespace().collect();
        let href = link.value().attr("href").unwrap_or("").trim();
        if href.is_empty() {
            continue;
        }
        if rels.contains(&"canonical") {
            head.canonicals.push(href.to_string());
        }
        if rels.contains(&"icon") && head.favicon.is_none() {
            head.favicon = Some(href.to_string());
        }
    }

    let script_selector = Selector::parse("head script").unwrap();
    for script in document.select(&script_selector) {
        let script_type = script
            .value()
            .attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if script_type == "application/ld+json" {
            let body = script.text().collect::<String>().trim().to_string();
            if !body.is_empty() {
                head.jsonld_blocks.push(body);
            }
        }
    }

    head
}

fn extract_body(document: &Html) -> BodySignals {
    let mut body = BodySignals::default();

    let h1_selector = Selector::parse("h1").unwrap();
    body.h1_count = document.select(&h1_selector).count();

    let anchor_selector = Selector::parse("a[href]").unwrap();
    for anchor in document.select(&anchor_selector) {
        let href = anchor.value().attr("href").unwrap_or("").trim();
        if !href.is_empty() {
            body.all_links.push(href.to_string());
        }
    }

    let img_selector = Selector::parse("img").unwrap();
    for img in document.select(&img_selector) {
        body.images.push(ImageRef {
            src: img.value().attr("src").unwrap_or("").trim().to_string(),
            alt: img.value().attr("alt").unwrap_or("").trim().to_string(),
        });
    }

    body.text = visible_text(document);
    let lowered = body.text.to_lowercase();
    body.soft404_signal = SOFT404_PHRASES.iter().any(|phrase| lowered.contains(phrase));

    body
}

fn visible_text(document: &Html) -> String {
    let mut parts: Vec<String> = Vec::new();
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name().to_ascii_lowercase()))
            .is_some_and(|name| name == "script" || name == "style");
        if in_hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en-GB">
<head>
  <title>  Widgets &amp; Gadgets  </title>
  <meta name="Description" content="All the widgets.">
  <meta name="description" content="A later description that must lose.">
  <meta name="ROBOTS" content="NoIndex, nofollow">
  <meta name="viewport" content="width=device-width">
  <meta property="og:title" content="First title">
  <meta property="og:title" content="Winning title">
  <meta property="og:image" content="/img/cover.png">
  <link rel="canonical" href="https://example.com/widgets">
  <link rel="Canonical" href="https://example.com/widgets-dup">
  <link rel="shortcut icon" href="/favicon.ico">
  <script type="application/ld+json">{"@type": "Product"}</script>
  <script type="application/ld+json">{broken json</script>
</head>
<body>
  <h1>Widgets</h1>
  <h1>Also widgets</h1>
  <a href="/a">A</a>
  <a href="https://other.example/b">B</a>
  <a href="">empty</a>
  <img src="/w.png" alt="a widget">
  <script>var hidden = "page not found";</script>
  <p>Browse our catalogue.</p>
</body>
</html>"#;

    #[test]
    fn head_signals() {
        let (head, _) = extract_signals(PAGE);
        assert_eq!(head.title, "Widgets & Gadgets");
        assert_eq!(head.meta_description, "All the widgets.");
        assert_eq!(head.meta_robots, "noindex, nofollow");
        assert_eq!(head.viewport, "width=device-width");
        assert_eq!(head.html_lang, "en-GB");
        assert_eq!(
            head.canonicals,
            vec!["https://example.com/widgets", "https://example.com/widgets-dup"]
        );
        // last og:title wins
        assert_eq!(head.open_graph.get("og:title").map(String::as_str), Some("Winning title"));
        assert_eq!(head.favicon.as_deref(), Some("/favicon.ico"));
        assert_eq!(head.jsonld_blocks.len(), 2);
    }

    #[test]
    fn body_signals() {
        let (_, body) = extract_signals(PAGE);
        assert_eq!(body.h1_count, 2);
        assert_eq!(body.all_links, vec!["/a", "https://other.example/b"]);
        assert_eq!(body.images.len(), 1);
        assert_eq!(body.images[0].alt, "a widget");
        assert!(body.text.contains("Browse our catalogue."));
        // script content is not visible text
        assert!(!body.text.contains("hidden"));
        assert!(!body.soft404_signal);
    }

    #[test]
    fn soft404_phrase_in_visible_text() {
        let html = "<html><body><p>Sorry, that page was not found.</p></body></html>";
        let (_, body) = extract_signals(html);
        assert!(body.soft404_signal);
    }

    #[test]
    fn jsonld_parse_errors_are_counted() {
        let blocks = vec!["{\"ok\": true}".to_string(), "{nope".to_string()];
        let summary = jsonld_summary(&blocks);
        assert_eq!(summary.jsonld_count, 2);
        assert_eq!(summary.jsonld_parse_errors, 1);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let (head, body) = extract_signals("");
        assert!(head.title.is_empty());
        assert!(head.canonicals.is_empty());
        assert_eq!(body.h1_count, 0);
        assert!(body.all_links.is_empty());
    }
}
