use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    /// Malformed or missing check/scoring documents, or invalid limits.
    /// The only error class that aborts a run.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scan error: {0}")]
    Scan(#[from] sitegrade_scanner::ScanError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
