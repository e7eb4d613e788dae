//! Aggregates computed over the prediction history

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medirisk_common::round1;
use medirisk_predict::{DiseaseType, RiskLevel};

use crate::model::PredictionRecord;

/// Count per risk level; every level is always present
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLevelCounts {
    #[serde(rename = "High")]
    pub high: u64,
    #[serde(rename = "Moderate")]
    pub moderate: u64,
    #[serde(rename = "Low")]
    pub low: u64,
}

impl RiskLevelCounts {
    pub fn add(&mut self, level: RiskLevel) {
        *self.slot(level) += 1;
    }

    pub fn get(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::Low => self.low,
        }
    }

    fn slot(&mut self, level: RiskLevel) -> &mut u64 {
        match level {
            RiskLevel::High => &mut self.high,
            RiskLevel::Moderate => &mut self.moderate,
            RiskLevel::Low => &mut self.low,
        }
    }
}

/// Count per disease type; every type is always present
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseCounts {
    pub diabetes: u64,
    pub hypertension: u64,
    pub cardiovascular: u64,
}

impl DiseaseCounts {
    pub fn add(&mut self, disease: DiseaseType) {
        match disease {
            DiseaseType::Diabetes => self.diabetes += 1,
            DiseaseType::Hypertension => self.hypertension += 1,
            DiseaseType::Cardiovascular => self.cardiovascular += 1,
        }
    }

    pub fn get(&self, disease: DiseaseType) -> u64 {
        match disease {
            DiseaseType::Diabetes => self.diabetes,
            DiseaseType::Hypertension => self.hypertension,
            DiseaseType::Cardiovascular => self.cardiovascular,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionStatistics {
    pub total_predictions: u64,
    pub risk_levels: RiskLevelCounts,
    pub disease_types: DiseaseCounts,
}

impl PredictionStatistics {
    /// `None` when there is nothing to summarize
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a PredictionRecord>,
    ) -> Option<Self> {
        let mut stats = Self::default();
        for record in records {
            stats.total_predictions += 1;
            stats.risk_levels.add(record.prediction.risk_level);
            stats.disease_types.add(record.disease_type());
        }
        (stats.total_predictions > 0).then_some(stats)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: RiskLevelCounts,
}

/// Statistics plus the period covered and the day-by-day evolution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    #[serde(flatten)]
    pub statistics: PredictionStatistics,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Share of High results, percent with one decimal
    pub high_risk_percent: f64,
    pub most_frequent_disease: DiseaseType,
    pub daily: Vec<DailyCount>,
}

impl StatisticsSummary {
    pub fn from_records(records: &[PredictionRecord]) -> Option<Self> {
        let statistics = PredictionStatistics::from_records(records)?;

        let mut days: BTreeMap<NaiveDate, RiskLevelCounts> = BTreeMap::new();
        for record in records {
            days.entry(record.timestamp.date_naive())
                .or_default()
                .add(record.prediction.risk_level);
        }
        let first_date = *days.keys().next()?;
        let last_date = *days.keys().next_back()?;

        let mut most_frequent_disease = DiseaseType::ALL[0];
        for disease in DiseaseType::ALL {
            if statistics.disease_types.get(disease)
                > statistics.disease_types.get(most_frequent_disease)
            {
                most_frequent_disease = disease;
            }
        }

        let high_risk_percent = round1(
            statistics.risk_levels.high as f64 * 100.0 / statistics.total_predictions as f64,
        );

        Some(Self {
            statistics,
            first_date,
            last_date,
            high_risk_percent,
            most_frequent_disease,
            daily: days
                .into_iter()
                .map(|(date, counts)| DailyCount { date, counts })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;

    #[test]
    fn test_statistics_empty() {
        let none: Vec<PredictionRecord> = Vec::new();
        assert!(PredictionStatistics::from_records(&none).is_none());
        assert!(StatisticsSummary::from_records(&none).is_none());
    }

    #[test]
    fn test_statistics_all_keys_present() {
        let records = vec![record(DiseaseType::Diabetes, RiskLevel::High, (2024, 5, 1, 10))];
        let stats = PredictionStatistics::from_records(&records).unwrap();
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["total_predictions"], 1);
        assert_eq!(value["risk_levels"]["High"], 1);
        assert_eq!(value["risk_levels"]["Moderate"], 0);
        assert_eq!(value["risk_levels"]["Low"], 0);
        assert_eq!(value["disease_types"]["diabetes"], 1);
        assert_eq!(value["disease_types"]["cardiovascular"], 0);
    }

    #[test]
    fn test_summary() {
        let records = vec![
            record(DiseaseType::Hypertension, RiskLevel::High, (2024, 5, 2, 10)),
            record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 5, 1, 9)),
            record(DiseaseType::Hypertension, RiskLevel::Moderate, (2024, 5, 2, 11)),
        ];
        let summary = StatisticsSummary::from_records(&records).unwrap();
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(summary.high_risk_percent, 33.3);
        assert_eq!(summary.most_frequent_disease, DiseaseType::Hypertension);
        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.daily[0].counts.low, 1);
        assert_eq!(summary.daily[1].counts.high, 1);
        assert_eq!(summary.daily[1].counts.moderate, 1);
    }

    #[test]
    fn test_most_frequent_tie_goes_to_first_disease() {
        let records = vec![
            record(DiseaseType::Cardiovascular, RiskLevel::Low, (2024, 5, 1, 9)),
            record(DiseaseType::Hypertension, RiskLevel::Low, (2024, 5, 1, 9)),
        ];
        let summary = StatisticsSummary::from_records(&records).unwrap();
        assert_eq!(summary.most_frequent_disease, DiseaseType::Hypertension);
    }
}
