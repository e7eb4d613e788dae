//! Supported diseases, their input fields and accepted ranges

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Submitted form values keyed by field name
pub type MetricInput = serde_json::Map<String, serde_json::Value>;

pub const GLUCOSE: &str = "glucose";
pub const BMI: &str = "bmi";
pub const SYSTOLIC: &str = "systolic";
pub const DIASTOLIC: &str = "diastolic";
pub const HEART_RATE: &str = "heart_rate";
pub const CHOLESTEROL: &str = "cholesterol";
pub const AGE: &str = "age";

/// Inclusive bounds accepted for one input field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldRange {
    pub field: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

pub const AGE_RANGE: FieldRange = FieldRange {
    field: AGE,
    label: "Age",
    min: 18.0,
    max: 120.0,
    unit: "years",
};

const DIABETES_RANGES: [FieldRange; 2] = [
    FieldRange {
        field: GLUCOSE,
        label: "Glucose",
        min: 70.0,
        max: 400.0,
        unit: "mg/dL",
    },
    FieldRange {
        field: BMI,
        label: "BMI",
        min: 15.0,
        max: 50.0,
        unit: "kg/m²",
    },
];

const HYPERTENSION_RANGES: [FieldRange; 2] = [
    FieldRange {
        field: SYSTOLIC,
        label: "Systolic pressure",
        min: 90.0,
        max: 200.0,
        unit: "mmHg",
    },
    FieldRange {
        field: DIASTOLIC,
        label: "Diastolic pressure",
        min: 60.0,
        max: 120.0,
        unit: "mmHg",
    },
];

const CARDIOVASCULAR_RANGES: [FieldRange; 2] = [
    FieldRange {
        field: HEART_RATE,
        label: "Heart rate",
        min: 40.0,
        max: 120.0,
        unit: "bpm",
    },
    FieldRange {
        field: CHOLESTEROL,
        label: "Cholesterol",
        min: 100.0,
        max: 300.0,
        unit: "mg/dL",
    },
];

/// Disease a prediction is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseType {
    Diabetes,
    Hypertension,
    Cardiovascular,
}

impl DiseaseType {
    pub const ALL: [DiseaseType; 3] = [
        DiseaseType::Diabetes,
        DiseaseType::Hypertension,
        DiseaseType::Cardiovascular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseType::Diabetes => "diabetes",
            DiseaseType::Hypertension => "hypertension",
            DiseaseType::Cardiovascular => "cardiovascular",
        }
    }

    /// Capitalized name used in report titles
    pub fn title(&self) -> &'static str {
        match self {
            DiseaseType::Diabetes => "Diabetes",
            DiseaseType::Hypertension => "Hypertension",
            DiseaseType::Cardiovascular => "Cardiovascular",
        }
    }

    /// Model feature order
    pub fn feature_names(&self) -> [&'static str; 3] {
        match self {
            DiseaseType::Diabetes => [GLUCOSE, AGE, BMI],
            DiseaseType::Hypertension => [SYSTOLIC, DIASTOLIC, AGE],
            DiseaseType::Cardiovascular => [HEART_RATE, CHOLESTEROL, AGE],
        }
    }

    /// Disease-specific ranges, checked before the shared age range
    pub fn ranges(&self) -> &'static [FieldRange] {
        match self {
            DiseaseType::Diabetes => &DIABETES_RANGES,
            DiseaseType::Hypertension => &HYPERTENSION_RANGES,
            DiseaseType::Cardiovascular => &CARDIOVASCULAR_RANGES,
        }
    }
}

impl fmt::Display for DiseaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiseaseType {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiseaseType::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| PredictError::UnknownDisease(s.to_string()))
    }
}

/// Display unit for a measured field, `-` when unknown
pub fn unit_for(field: &str) -> &'static str {
    match field {
        GLUCOSE | CHOLESTEROL => "mg/dL",
        BMI => "kg/m²",
        SYSTOLIC | DIASTOLIC => "mmHg",
        HEART_RATE => "bpm",
        AGE => "years",
        _ => "-",
    }
}
