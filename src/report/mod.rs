//! Report rendering: Markdown, JSON and the flat CSV export.

mod export;
mod generator;

pub use export::export_csv;
pub use generator::{generate_json_report, generate_markdown_report};
