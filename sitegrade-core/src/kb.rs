//! Knowledge-base lookup for pro remediation content. Check ids are
//! restricted to a safe charset before they are allowed anywhere near the
//! filesystem; anything else rejects the lookup outright.

use std::path::Path;

/// Accept only `[A-Za-z0-9_-]` ids; returns None for anything else.
pub fn safe_check_id(check_id: &str) -> Option<&str> {
    if check_id.is_empty() {
        return None;
    }
    let ok = check_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    ok.then_some(check_id)
}

/// Read `<kb_dir>/<check_id>.md` if the id is safe and the file exists.
pub fn load_fix(kb_dir: &Path, check_id: &str) -> Option<String> {
    let safe = safe_check_id(check_id)?;
    let md_path = kb_dir.join(format!("{safe}.md"));
    if md_path.is_file() {
        std::fs::read_to_string(md_path).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn rejects_unsafe_ids() {
        assert!(safe_check_id("../../etc/passwd").is_none());
        assert!(safe_check_id("id with spaces").is_none());
        assert!(safe_check_id("").is_none());
        assert!(safe_check_id("robots.exists").is_none());
    }

    #[test]
    fn accepts_safe_ids() {
        assert_eq!(safe_check_id("https_enabled"), Some("https_enabled"));
        assert_eq!(safe_check_id("check-42"), Some("check-42"));
    }

    #[test]
    fn unsafe_id_never_touches_the_filesystem() {
        assert!(load_fix(&PathBuf::from("/nonexistent"), "../escape").is_none());
    }
}
