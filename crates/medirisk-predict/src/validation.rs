//! Form input validation
//!
//! Checks run in a fixed order: required fields, disease-specific ranges,
//! then the shared age range. The first failure is reported.

use medirisk_common::json_as_f64;

use crate::disease::{AGE_RANGE, DiseaseType, FieldRange, MetricInput};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{}", missing_fields_message(*.0))]
    MissingFields(DiseaseType),

    #[error("{} must be between {} and {} {}.", .0.label, .0.min, .0.max, .0.unit)]
    OutOfRange(FieldRange),

    #[error("Format error: '{0}' must be a valid number.")]
    InvalidNumber(String),
}

fn missing_fields_message(disease: DiseaseType) -> &'static str {
    match disease {
        DiseaseType::Diabetes => "Please provide glucose, age and BMI.",
        DiseaseType::Hypertension => "Please provide systolic pressure, diastolic pressure and age.",
        DiseaseType::Cardiovascular => "Please provide heart rate, cholesterol and age.",
    }
}

fn numeric(input: &MetricInput, field: &str) -> Result<f64, ValidationError> {
    input
        .get(field)
        .and_then(json_as_f64)
        .ok_or_else(|| ValidationError::InvalidNumber(field.to_string()))
}

fn check_range(input: &MetricInput, range: &FieldRange) -> Result<f64, ValidationError> {
    let value = numeric(input, range.field)?;
    if value < range.min || value > range.max {
        return Err(ValidationError::OutOfRange(*range));
    }
    Ok(value)
}

/// Validate the input for `disease` and return its feature vector
pub fn validate(disease: DiseaseType, input: &MetricInput) -> Result<[f64; 3], ValidationError> {
    let names = disease.feature_names();
    if !names.iter().all(|name| input.contains_key(*name)) {
        return Err(ValidationError::MissingFields(disease));
    }

    for range in disease.ranges() {
        check_range(input, range)?;
    }
    check_range(input, &AGE_RANGE)?;

    let mut features = [0.0; 3];
    for (slot, name) in features.iter_mut().zip(names) {
        *slot = numeric(input, name)?;
    }
    Ok(features)
}
