//! Report over the whole prediction history

use chrono::{DateTime, Utc};
use tracing::debug;

use medirisk_persistence::StatisticsSummary;
use medirisk_predict::{DiseaseType, RiskLevel};

use crate::layout::{BarChart, Layout, Table};
use crate::pdf::{Color, DocumentInfo};
use crate::prediction::risk_color;
use crate::style;

pub const STATISTICS_REPORT_TITLE: &str = "Prediction Statistics Report";

const DISEASE_COLORS: [Color; 3] = [
    Color::hex(0x2E86C1),
    Color::hex(0x8E44AD),
    Color::hex(0x17A589),
];

fn general_rows(summary: &StatisticsSummary) -> Vec<Vec<String>> {
    vec![
        vec![
            "Total predictions".to_string(),
            summary.statistics.total_predictions.to_string(),
        ],
        vec![
            "Period covered".to_string(),
            format!("{} - {}", summary.first_date, summary.last_date),
        ],
        vec![
            "High risk (%)".to_string(),
            format!("{:.1}%", summary.high_risk_percent),
        ],
        vec![
            "Most frequent type".to_string(),
            summary.most_frequent_disease.title().to_string(),
        ],
    ]
}

fn daily_rows(summary: &StatisticsSummary) -> Vec<Vec<String>> {
    let mut rows = vec![
        std::iter::once("Date".to_string())
            .chain(RiskLevel::ALL.iter().map(|l| l.to_string()))
            .chain(std::iter::once("Total".to_string()))
            .collect::<Vec<_>>(),
    ];
    for day in &summary.daily {
        let counts: Vec<u64> = RiskLevel::ALL.iter().map(|l| day.counts.get(*l)).collect();
        let total: u64 = counts.iter().sum();
        rows.push(
            std::iter::once(day.date.format("%Y-%m-%d").to_string())
                .chain(counts.iter().map(u64::to_string))
                .chain(std::iter::once(total.to_string()))
                .collect(),
        );
    }
    rows
}

/// Render the history summary as a PDF document
pub fn statistics_report(summary: &StatisticsSummary, now: DateTime<Utc>) -> Vec<u8> {
    let mut layout = Layout::new();

    layout.paragraph(STATISTICS_REPORT_TITLE, style::title());
    layout.paragraph(
        &format!("Generated on {}", now.format("%d/%m/%Y %H:%M")),
        style::subtitle(),
    );
    layout.spacer(10.0);

    layout.heading("General statistics", style::section());
    let general = Table::new(general_rows(summary))
        .with_label_column(Some(Color::GREY), Color::WHITE_SMOKE)
        .with_widths(vec![1.2, 1.0]);
    layout.table(&general);

    let levels = RiskLevel::ALL.iter().fold(
        BarChart::new("Distribution of risk levels"),
        |chart, level| {
            chart.bar(
                level.as_str(),
                summary.statistics.risk_levels.get(*level) as f64,
                risk_color(*level),
            )
        },
    );
    layout.bar_chart(&levels);

    let diseases = DiseaseType::ALL.iter().zip(DISEASE_COLORS).fold(
        BarChart::new("Distribution by disease type"),
        |chart, (disease, color)| {
            chart.bar(
                disease.title(),
                summary.statistics.disease_types.get(*disease) as f64,
                color,
            )
        },
    );
    layout.bar_chart(&diseases);

    layout.heading("Daily evolution", style::section());
    let daily = Table::new(daily_rows(summary))
        .with_header(Some(Color::GREY), Color::WHITE_SMOKE)
        .with_widths(vec![1.6, 1.0, 1.0, 1.0, 1.0])
        .centered();
    layout.table(&daily);

    debug!(
        total = summary.statistics.total_predictions,
        days = summary.daily.len(),
        pages = layout.page_count(),
        "Statistics report rendered"
    );
    layout.finish(&DocumentInfo::new(STATISTICS_REPORT_TITLE, now))
}
