//! Domain model types for the persistence abstraction layer
//!
//! These types are used as return values from the persistence traits,
//! decoupled from specific storage backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medirisk_common::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use medirisk_predict::{DiseaseType, Prediction};

/// A prediction as kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub prediction: Prediction,
}

impl PredictionRecord {
    /// Stamp a fresh prediction with a new id and the current time
    pub fn new(prediction: Prediction, user_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id,
            prediction,
        }
    }

    pub fn disease_type(&self) -> DiseaseType {
        self.prediction.disease_type
    }
}

/// Registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserInfo {
    pub fn new(email: &str, name: &str, password_hash: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Generic paginated result
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u64,
    pub pages_available: u64,
    pub page_items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total_count: u64, page_number: u64, page_size: u64, page_items: Vec<T>) -> Self {
        Self {
            total_count,
            page_number,
            pages_available: if page_size > 0 {
                total_count.div_ceil(page_size)
            } else {
                0
            },
            page_items,
        }
    }

    pub fn empty() -> Self {
        Self {
            total_count: 0,
            page_number: 0,
            pages_available: 0,
            page_items: Vec::new(),
        }
    }
}

/// History listing parameters; pages are 1-based, newest record first
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryQuery {
    pub disease_type: Option<DiseaseType>,
    pub page_no: u64,
    pub page_size: u64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            disease_type: None,
            page_no: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl HistoryQuery {
    pub fn new(disease_type: Option<DiseaseType>, page_no: u64, page_size: u64) -> Self {
        Self {
            disease_type,
            page_no: page_no.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn matches(&self, record: &PredictionRecord) -> bool {
        self.disease_type.is_none_or(|d| d == record.disease_type())
    }

    /// Records to skip; saturates for page numbers far past the end
    pub fn offset(&self) -> u64 {
        self.page_no
            .saturating_sub(1)
            .saturating_mul(self.page_size)
    }

    /// Filter and page records given in insertion order
    pub fn paginate(&self, records: Vec<PredictionRecord>) -> Page<PredictionRecord> {
        let matching: Vec<PredictionRecord> =
            records.into_iter().rev().filter(|r| self.matches(r)).collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.page_size as usize)
            .collect();
        Page::new(total, self.page_no, self.page_size, items)
    }
}

/// Storage mode for the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// JSON files on local disk
    File,
    /// Standalone embedded RocksDB
    Embedded,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::File => write!(f, "file"),
            StorageMode::Embedded => write!(f, "embedded"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(StorageMode::File),
            "embedded" => Ok(StorageMode::Embedded),
            _ => Err(format!("Invalid storage mode: {}", s)),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;
    use medirisk_predict::{DiseaseType, Prediction, RiskLevel};

    use super::*;

    pub fn record(disease: DiseaseType, level: RiskLevel, at: (i32, u32, u32, u32)) -> PredictionRecord {
        let (y, m, d, h) = at;
        PredictionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            user_id: None,
            prediction: Prediction {
                disease_type: disease,
                risk_level: level,
                risk_description: level.description().to_string(),
                probability: 50.0,
                risk_factors: Vec::new(),
                recommendations: Vec::new(),
                input_data: Default::default(),
                message: level.description().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use medirisk_predict::RiskLevel;

    #[test]
    fn test_storage_mode_display() {
        assert_eq!(StorageMode::File.to_string(), "file");
        assert_eq!(StorageMode::Embedded.to_string(), "embedded");
    }

    #[test]
    fn test_storage_mode_from_str() {
        assert_eq!("file".parse::<StorageMode>().unwrap(), StorageMode::File);
        assert_eq!(
            "embedded".parse::<StorageMode>().unwrap(),
            StorageMode::Embedded
        );
        assert!("invalid".parse::<StorageMode>().is_err());
    }

    #[test]
    fn test_page_new() {
        let page = Page::<String>::new(101, 1, 10, vec!["a".to_string()]);
        assert_eq!(page.total_count, 101);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.pages_available, 11);
        assert_eq!(page.page_items.len(), 1);
    }

    #[test]
    fn test_page_empty() {
        let page = Page::<String>::empty();
        assert_eq!(page.total_count, 0);
        assert!(page.page_items.is_empty());
    }

    #[test]
    fn test_history_query_clamps() {
        let q = HistoryQuery::new(None, 0, 10_000);
        assert_eq!(q.page_no, 1);
        assert_eq!(q.page_size, MAX_PAGE_SIZE);
        assert_eq!(HistoryQuery::new(None, 3, 0).page_size, 1);
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(HistoryQuery::new(None, 3, 20).offset(), 40);
        let q = HistoryQuery::new(None, u64::MAX, MAX_PAGE_SIZE);
        assert_eq!(q.offset(), u64::MAX);

        let records = vec![record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 8))];
        let page = q.paginate(records);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.page_number, u64::MAX);
        assert!(page.page_items.is_empty());
    }

    #[test]
    fn test_paginate_newest_first_with_filter() {
        let records = vec![
            record(DiseaseType::Diabetes, RiskLevel::Low, (2024, 1, 1, 8)),
            record(DiseaseType::Hypertension, RiskLevel::High, (2024, 1, 1, 9)),
            record(DiseaseType::Diabetes, RiskLevel::High, (2024, 1, 2, 8)),
            record(DiseaseType::Diabetes, RiskLevel::Moderate, (2024, 1, 3, 8)),
        ];
        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

        let page = HistoryQuery::new(Some(DiseaseType::Diabetes), 1, 2).paginate(records.clone());
        assert_eq!(page.total_count, 3);
        assert_eq!(page.pages_available, 2);
        assert_eq!(page.page_items[0].id, ids[3]);
        assert_eq!(page.page_items[1].id, ids[2]);

        let page = HistoryQuery::new(Some(DiseaseType::Diabetes), 2, 2).paginate(records.clone());
        assert_eq!(page.page_items.len(), 1);
        assert_eq!(page.page_items[0].id, ids[0]);

        let page = HistoryQuery::new(None, 5, 2).paginate(records);
        assert_eq!(page.total_count, 4);
        assert!(page.page_items.is_empty());
    }

    #[test]
    fn test_record_json_is_flat() {
        let r = record(DiseaseType::Cardiovascular, RiskLevel::Moderate, (2024, 3, 1, 12));
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["disease_type"], "cardiovascular");
        assert_eq!(value["risk_level"], "Moderate");
        assert!(value.get("user_id").is_none());
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-03-01T12:00:00"));

        let back: PredictionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, r);
    }
}
