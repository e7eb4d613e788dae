//! Report for a single prediction

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use medirisk_predict::{Prediction, RiskLevel, Severity, unit_for};

use crate::layout::{Layout, Table, TextStyle};
use crate::pdf::{Color, DocumentInfo};
use crate::style;

pub const PREDICTION_REPORT_TITLE: &str = "Health Analysis Report";

pub fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::High => Color::RED,
        RiskLevel::Moderate => Color::ORANGE,
        RiskLevel::Low => Color::GREEN,
    }
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::RED,
        Severity::Medium => Color::ORANGE,
        Severity::Low => Color::GREEN,
    }
}

/// `heart_rate` -> `Heart rate`
fn parameter_label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Render `prediction` as a PDF document
pub fn prediction_report(prediction: &Prediction, author: &str, now: DateTime<Utc>) -> Vec<u8> {
    let mut layout = Layout::new();

    layout.paragraph(PREDICTION_REPORT_TITLE, style::title());
    layout.paragraph(&format!("Generated by {}", author), style::subtitle());
    layout.spacer(10.0);

    layout.paragraph(
        &format!("Date: {}", now.format("%d/%m/%Y %H:%M")),
        style::header(),
    );
    layout.paragraph(
        &format!("Analysis type: {}", prediction.disease_type.title()),
        style::header(),
    );
    layout.spacer(12.0);

    layout.paragraph(
        &format!("Risk level: {}", prediction.risk_level),
        TextStyle::default()
            .bold()
            .size(16.0)
            .color(risk_color(prediction.risk_level))
            .space_after(8.0),
    );
    layout.paragraph(
        &format!("Estimated probability: {:.1}%", prediction.probability),
        TextStyle::default(),
    );
    let description = if prediction.risk_description.is_empty() {
        prediction.risk_level.description()
    } else {
        prediction.risk_description.as_str()
    };
    layout.paragraph(description, TextStyle::default().space_after(14.0));

    layout.heading("Risk factors", style::section());
    if prediction.risk_factors.is_empty() {
        layout.paragraph("No notable risk factor identified.", TextStyle::default());
    }
    for factor in &prediction.risk_factors {
        layout.bullet(
            &format!("{}: {}", factor.name, factor.description),
            TextStyle::default().color(severity_color(factor.severity)),
        );
    }
    layout.spacer(12.0);

    layout.heading("Recommendations", style::section());
    for group in &prediction.recommendations {
        layout.heading(&group.title, style::subsection());
        for item in &group.items {
            layout.bullet(item, TextStyle::default());
        }
        layout.spacer(6.0);
    }
    layout.spacer(6.0);

    layout.heading("Measured values", style::section());
    let mut rows = vec![vec![
        "Parameter".to_string(),
        "Value".to_string(),
        "Unit".to_string(),
    ]];
    rows.extend(prediction.input_data.iter().map(|(key, value)| {
        vec![
            parameter_label(key),
            display_value(value),
            unit_for(key).to_string(),
        ]
    }));
    let table = Table::new(rows)
        .with_header(Some(Color::GREY), Color::WHITE_SMOKE)
        .with_body_fill(Color::BEIGE)
        .centered();
    layout.table(&table);

    debug!(
        disease = %prediction.disease_type,
        risk_level = %prediction.risk_level,
        pages = layout.page_count(),
        "Prediction report rendered"
    );
    layout.finish(&DocumentInfo::new(PREDICTION_REPORT_TITLE, now))
}
