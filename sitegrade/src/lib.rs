// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    colored_grade, load_documents, parse_format, render_report, resolve_db_path, resolve_dir,
};
