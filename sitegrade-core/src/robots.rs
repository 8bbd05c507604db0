//! Simplified robots.txt evaluation.
//!
//! Only the `User-agent: *` group is honored; rules are plain path
//! prefixes (no wildcards). Longest matching prefix wins, and an Allow at
//! least as long as the matching Disallow wins the tie. A path with no
//! matching rule is allowed.

#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    /// Every `Sitemap:` directive, regardless of user-agent group.
    pub sitemaps: Vec<String>,
}

impl RobotsRules {
    pub fn parse(robots_txt: &str) -> Self {
        let mut rules = RobotsRules::default();
        let mut in_wildcard_group = false;

        for line in robots_txt.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => in_wildcard_group = value == "*",
                "sitemap" => {
                    if !value.is_empty() {
                        rules.sitemaps.push(value.to_string());
                    }
                }
                "allow" if in_wildcard_group && !value.is_empty() => {
                    rules.allow.push(value.to_string());
                }
                "disallow" if in_wildcard_group && !value.is_empty() => {
                    rules.disallow.push(value.to_string());
                }
                _ => {}
            }
        }

        rules
    }

    pub fn is_allowed(&self, path: &str) -> bool {
        let longest_disallow = longest_prefix(&self.disallow, path);
        let Some(disallow_len) = longest_disallow else {
            return true;
        };
        match longest_prefix(&self.allow, path) {
            Some(allow_len) => allow_len >= disallow_len,
            None => false,
        }
    }

    pub fn mentions_sitemap(&self) -> bool {
        !self.sitemaps.is_empty()
    }
}

fn longest_prefix(rules: &[String], path: &str) -> Option<usize> {
    rules
        .iter()
        .filter(|rule| path.starts_with(rule.as_str()))
        .map(|rule| rule.len())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "\
# comments are ignored
User-agent: googlebot
Disallow: /googlebot-only/

User-agent: *
Disallow: /private/
Disallow: /tmp
Allow: /private/press/

Sitemap: https://example.com/sitemap.xml
";

    #[test]
    fn only_wildcard_group_applies() {
        let rules = RobotsRules::parse(ROBOTS);
        assert!(rules.is_allowed("/googlebot-only/page"));
        assert!(!rules.is_allowed("/private/page"));
        assert!(!rules.is_allowed("/tmp/file"));
    }

    #[test]
    fn allow_wins_at_equal_or_longer_length() {
        let rules = RobotsRules::parse(ROBOTS);
        assert!(rules.is_allowed("/private/press/2024"));
    }

    #[test]
    fn unmatched_paths_are_allowed() {
        let rules = RobotsRules::parse(ROBOTS);
        assert!(rules.is_allowed("/"));
        assert!(rules.is_allowed("/blog/post"));
    }

    #[test]
    fn sitemap_directives_are_collected() {
        let rules = RobotsRules::parse(ROBOTS);
        assert_eq!(rules.sitemaps, vec!["https://example.com/sitemap.xml"]);
        assert!(rules.mentions_sitemap());
    }

    #[test]
    fn empty_input_allows_everything() {
        let rules = RobotsRules::parse("");
        assert!(rules.is_allowed("/anything"));
        assert!(!rules.mentions_sitemap());
    }
}
