//! Report presentation.
//!
//! This module derives view models from the raw report and renders them
//! as Markdown or JSON.

pub mod generator;
pub mod presenter;

pub use generator::{generate_json_report, generate_markdown_report, ReportMetadata};
pub use presenter::{present, ExpandState, ReportView};
