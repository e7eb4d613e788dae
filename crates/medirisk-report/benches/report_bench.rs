// Benchmarks for PDF rendering
// Measures a full prediction report and a statistics report over a long history

use std::hint::black_box;

use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use medirisk_persistence::{PredictionRecord, StatisticsSummary};
use medirisk_predict::{ModelSettings, PredictionEngine};
use medirisk_report::{prediction_report, statistics_report};
use serde_json::json;

fn bench_prediction_report(c: &mut Criterion) {
    let engine = PredictionEngine::train(ModelSettings {
        n_estimators: 10,
        ..Default::default()
    })
    .unwrap();
    let input = json!({"glucose": 190, "age": 58, "bmi": 33.1})
        .as_object()
        .cloned()
        .unwrap();
    let prediction = engine.predict("diabetes", &input).unwrap();
    let now = Utc::now();

    c.bench_function("prediction_report", |b| {
        b.iter(|| prediction_report(black_box(&prediction), "MediRisk", now))
    });
}

fn bench_statistics_report(c: &mut Criterion) {
    let engine = PredictionEngine::train(ModelSettings {
        n_estimators: 10,
        ..Default::default()
    })
    .unwrap();
    let input = json!({"systolic": 150, "diastolic": 95, "age": 61})
        .as_object()
        .cloned()
        .unwrap();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let records: Vec<PredictionRecord> = (0..365)
        .map(|day| {
            let mut record =
                PredictionRecord::new(engine.predict("hypertension", &input).unwrap(), None);
            record.timestamp = start + Duration::days(day);
            record
        })
        .collect();
    let summary = StatisticsSummary::from_records(&records).unwrap();
    let now = Utc::now();

    c.bench_function("statistics_report_365_days", |b| {
        b.iter(|| statistics_report(black_box(&summary), now))
    });
}

criterion_group!(benches, bench_prediction_report, bench_statistics_report);
criterion_main!(benches);
