//! URL canonicalization used for frontier membership and host scoping.
//!
//! Every URL that enters the visited set or the snapshot goes through
//! [`normalize`] first, so string equality is the dedup identity.

use url::Url;

/// Canonicalize a URL string: trim whitespace, drop any fragment, default
/// the scheme to `https`, collapse duplicate path separators and strip a
/// single non-root trailing slash. Never fails; unparseable input comes
/// back trimmed and fragment-stripped.
pub fn normalize(raw: &str) -> String {
    let trimmed = strip_fragment(raw.trim());
    if trimmed.is_empty() {
        return String::new();
    }

    match Url::parse(trimmed) {
        Ok(parsed) => rebuild(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match Url::parse(&format!("https://{trimmed}")) {
                Ok(parsed) => rebuild(parsed),
                Err(_) => trimmed.to_string(),
            }
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Case-insensitive authority (host[:port]) equality.
pub fn same_host(a: &str, b: &str) -> bool {
    match (host_of(a), host_of(b)) {
        (Some(ha), Some(hb)) => ha == hb,
        _ => false,
    }
}

/// The lowercased authority (host, plus `:port` when explicit) of a URL.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// True iff the URL uses a scheme the crawler will fetch.
pub fn is_fetchable(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve `href` against `base` per standard relative-URL resolution,
/// then normalize. Skips empty and non-navigational hrefs.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let resolved = base_url.join(href).ok()?;
    Some(normalize(resolved.as_str()))
}

fn strip_fragment(url: &str) -> &str {
    match url.split_once('#') {
        Some((before, _)) => before,
        None => url,
    }
}

fn rebuild(mut parsed: Url) -> String {
    parsed.set_fragment(None);
    if parsed.cannot_be_a_base() {
        return parsed.to_string();
    }

    let mut path = collapse_slashes(parsed.path());
    // path params (`;...` on the last segment) are dropped
    if let Some(semi) = path.rfind(';')
        && semi > path.rfind('/').unwrap_or(0)
    {
        path.truncate(semi);
    }
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    parsed.set_path(&path);
    parsed.to_string()
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    if out.is_empty() { "/".to_string() } else { out }
}
