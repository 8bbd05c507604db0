use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Explicit per-run configuration for the audit pipeline. Built once by
/// the caller and passed in; the core keeps no process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Byte budget applied to every fetched body (pages, robots.txt,
    /// sitemaps).
    pub max_fetch_bytes: usize,
    pub default_max_pages_free: usize,
    pub default_max_depth: usize,
    /// Page count used by the `sample_set` check scope.
    pub sample_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            user_agent: "sitegrade/0.2 (+https://github.com/trapdoorsec/sitegrade)".to_string(),
            request_timeout_secs: 15,
            max_fetch_bytes: 2_000_000,
            default_max_pages_free: 10,
            default_max_depth: 2,
            sample_limit: 10,
        }
    }
}

impl AuditConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
