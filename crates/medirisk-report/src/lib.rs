//! MediRisk Report - PDF rendering
//!
//! This crate provides:
//! - A small PDF 1.4 writer using the base-14 Helvetica fonts (`pdf`, `font`)
//! - A flowing layout with paragraphs, bullets, tables and bar charts (`layout`)
//! - The prediction and statistics reports (`prediction`, `statistics`)

pub mod font;
pub mod layout;
pub mod pdf;
pub mod prediction;
pub mod statistics;
pub mod style;

pub use layout::{Align, BarChart, Layout, Table, TextStyle};
pub use pdf::{Color, DocumentInfo, PageContent};
pub use prediction::{PREDICTION_REPORT_TITLE, prediction_report};
pub use statistics::{STATISTICS_REPORT_TITLE, statistics_report};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Label for the `reports_generated_total` metric
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Prediction,
    Statistics,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Prediction => "prediction",
            ReportKind::Statistics => "statistics",
        }
    }
}
