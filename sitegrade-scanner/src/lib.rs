pub mod crawler;
pub mod error;
pub mod extract;
pub mod snapshot;
pub mod urlnorm;

pub use crawler::Crawler;
pub use error::ScanError;
pub use snapshot::{CrawlSnapshot, PageRecord};
