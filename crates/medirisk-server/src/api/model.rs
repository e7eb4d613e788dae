//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};

use medirisk_common::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use medirisk_persistence::{HistoryQuery, StorageMode};
use medirisk_predict::{DiseaseType, FieldRange, MetricInput, PredictError, disease::AGE_RANGE};

/// Body of `POST /predict`
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub disease_type: Option<String>,
    #[serde(default)]
    pub data: Option<MetricInput>,
}

/// Query of `GET /history`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub disease_type: Option<String>,
    pub page_no: Option<u64>,
    pub page_size: Option<u64>,
}

impl HistoryParams {
    /// An empty `diseaseType` means no filter; an unknown one is rejected
    pub fn to_query(&self) -> Result<HistoryQuery, PredictError> {
        let disease_type = match self.disease_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(v) => Some(v.parse::<DiseaseType>()?),
        };
        Ok(HistoryQuery::new(
            disease_type,
            self.page_no.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        ))
    }
}

/// Body of `POST /auth/register`
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /auth/login`
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// One entry of the service metadata returned by `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseInfo {
    pub disease_type: DiseaseType,
    pub title: &'static str,
    pub fields: Vec<FieldRange>,
}

impl From<DiseaseType> for DiseaseInfo {
    fn from(disease: DiseaseType) -> Self {
        let mut fields = disease.ranges().to_vec();
        fields.push(AGE_RANGE);
        Self {
            disease_type: disease,
            title: disease.title(),
            fields,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub diseases: Vec<DiseaseInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub storage: StorageMode,
}
