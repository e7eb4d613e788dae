//! Turning a model probability into a patient-facing assessment
//!
//! The risk level comes from the probability alone. Risk factors come from
//! fixed clinical thresholds on the submitted values and may disagree with
//! the model.

use serde::{Deserialize, Serialize};

use medirisk_common::round1;

use crate::disease::{DiseaseType, MetricInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Moderate, RiskLevel::Low];

    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            RiskLevel::Low
        } else if probability < 0.7 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Your risk level is low. Keep maintaining your healthy habits.",
            RiskLevel::Moderate => {
                "Your risk level is moderate. Particular attention is recommended."
            }
            RiskLevel::High => {
                "Your risk level is high. A medical consultation is strongly recommended."
            }
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub severity: Severity,
    pub description: String,
}

impl RiskFactor {
    fn new(name: &str, severity: Severity, description: String) -> Self {
        Self {
            name: name.to_string(),
            severity,
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationGroup {
    pub title: String,
    pub items: Vec<String>,
}

/// A complete assessment as returned to clients and stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease_type: DiseaseType,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_description: String,
    /// Percentage, one decimal
    pub probability: f64,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub recommendations: Vec<RecommendationGroup>,
    #[serde(default)]
    pub input_data: MetricInput,
    #[serde(default)]
    pub message: String,
}

/// Rule-based findings for the validated feature vector
pub fn risk_factors(disease: DiseaseType, features: &[f64; 3]) -> Vec<RiskFactor> {
    let mut factors = Vec::new();
    match disease {
        DiseaseType::Diabetes => {
            let [glucose, age, bmi] = *features;
            let g = glucose.trunc() as i64;
            if glucose >= 200.0 {
                factors.push(RiskFactor::new(
                    "Very high blood glucose",
                    Severity::High,
                    format!(
                        "Your glucose level ({g}mg/dL) is significantly above normal. A level \
                         above 200mg/dL may indicate diabetes. A medical consultation is recommended."
                    ),
                ));
            } else if glucose >= 140.0 {
                factors.push(RiskFactor::new(
                    "High blood glucose",
                    Severity::Medium,
                    format!(
                        "Your glucose level ({g}mg/dL) is above normal. A level between 140 and \
                         199mg/dL may indicate pre-diabetes."
                    ),
                ));
            }

            let b = round1(bmi);
            if bmi >= 30.0 {
                factors.push(RiskFactor::new(
                    "Obesity",
                    Severity::High,
                    format!(
                        "Your BMI of {b:.1} indicates obesity. Obesity significantly increases \
                         the risk of diabetes and other health problems."
                    ),
                ));
            } else if bmi >= 25.0 {
                factors.push(RiskFactor::new(
                    "Overweight",
                    Severity::Medium,
                    format!(
                        "Your BMI of {b:.1} indicates overweight. Being overweight can increase \
                         the risk of diabetes. Moderate weight loss could reduce this risk."
                    ),
                ));
            }

            if age >= 45.0 {
                factors.push(RiskFactor::new(
                    "At-risk age",
                    Severity::Medium,
                    format!(
                        "At {} years old, you are in an age group where the risk of diabetes is \
                         higher. Regular screening is recommended.",
                        age.trunc() as i64
                    ),
                ));
            }
        }
        DiseaseType::Hypertension => {
            let [systolic, diastolic, _] = *features;
            let bp = format!("{}/{}", systolic.trunc() as i64, diastolic.trunc() as i64);
            if systolic >= 160.0 || diastolic >= 100.0 {
                factors.push(RiskFactor::new(
                    "Severe hypertension",
                    Severity::High,
                    format!(
                        "Your blood pressure ({bp}mmHg) indicates severe hypertension. An urgent \
                         medical consultation is necessary."
                    ),
                ));
            } else if systolic >= 140.0 || diastolic >= 90.0 {
                factors.push(RiskFactor::new(
                    "Hypertension",
                    Severity::Medium,
                    format!(
                        "Your blood pressure ({bp}mmHg) indicates hypertension. Regular medical \
                         follow-up is recommended."
                    ),
                ));
            } else if systolic >= 130.0 || diastolic >= 85.0 {
                factors.push(RiskFactor::new(
                    "Pre-hypertension",
                    Severity::Low,
                    format!(
                        "Your blood pressure ({bp}mmHg) is slightly elevated. Lifestyle changes \
                         could help reduce it."
                    ),
                ));
            }
        }
        DiseaseType::Cardiovascular => {
            let [heart_rate, cholesterol, _] = *features;
            let c = cholesterol.trunc() as i64;
            if cholesterol >= 240.0 {
                factors.push(RiskFactor::new(
                    "Very high cholesterol",
                    Severity::High,
                    format!(
                        "Your cholesterol level ({c}mg/dL) is very high. A high level \
                         significantly increases the risk of cardiovascular disease."
                    ),
                ));
            } else if cholesterol >= 200.0 {
                factors.push(RiskFactor::new(
                    "High cholesterol",
                    Severity::Medium,
                    format!(
                        "Your cholesterol level ({c}mg/dL) is at the upper limit. Monitoring and \
                         dietary changes are recommended."
                    ),
                ));
            }

            let hr = heart_rate.trunc() as i64;
            if heart_rate >= 100.0 {
                factors.push(RiskFactor::new(
                    "High heart rate",
                    Severity::Medium,
                    format!(
                        "Your heart rate ({hr}bpm) is high. A high resting rate may indicate \
                         cardiovascular risk."
                    ),
                ));
            } else if heart_rate < 60.0 {
                factors.push(RiskFactor::new(
                    "Low heart rate",
                    Severity::Low,
                    format!(
                        "Your heart rate ({hr}bpm) is low. If you are not an athlete, this may \
                         require an evaluation."
                    ),
                ));
            }
        }
    }
    factors
}

const GENERAL_TITLE: &str = "General health recommendations";
const GENERAL_ITEMS: [&str; 4] = [
    "Maintain a healthy weight",
    "Get enough sleep (7-8 hours per night)",
    "Stay hydrated",
    "Manage your stress daily",
];

fn level_group(disease: DiseaseType, level: RiskLevel) -> (&'static str, &'static [&'static str]) {
    use DiseaseType::*;
    use RiskLevel::*;

    match (disease, level) {
        (Diabetes, Low) => (
            "General recommendations",
            &[
                "Maintain a balanced diet",
                "Exercise regularly",
                "Check your blood glucose occasionally",
            ],
        ),
        (Diabetes, Moderate) => (
            "Monitoring and lifestyle",
            &[
                "Reduce your intake of refined sugars",
                "Increase physical activity to 30 minutes a day",
                "Check your blood glucose weekly",
                "Consult a nutritionist",
            ],
        ),
        (Diabetes, High) => (
            "Urgent actions",
            &[
                "See a doctor soon",
                "Check your blood glucose daily",
                "Follow a strict diet",
                "Keep a food diary",
            ],
        ),
        (Hypertension, Low) => (
            "Prevention",
            &[
                "Keep a low-salt diet",
                "Stay physically active",
                "Manage your stress",
            ],
        ),
        (Hypertension, Moderate) => (
            "Lifestyle adjustments",
            &[
                "Significantly reduce your salt intake",
                "Do cardiovascular exercise 3 times a week",
                "Avoid alcohol and tobacco",
                "Practice meditation",
            ],
        ),
        (Hypertension, High) => (
            "Medical follow-up",
            &[
                "See a cardiologist soon",
                "Follow the DASH diet",
                "Check your blood pressure daily",
                "Limit caffeine",
            ],
        ),
        (Cardiovascular, Low) => (
            "Cardiovascular prevention",
            &[
                "Keep an active lifestyle",
                "Follow a balanced diet",
                "Avoid tobacco",
            ],
        ),
        (Cardiovascular, Moderate) => (
            "Cardiovascular monitoring",
            &[
                "Increase physical activity",
                "Adopt a Mediterranean diet",
                "Manage stress",
                "Monitor your cholesterol",
            ],
        ),
        (Cardiovascular, High) => (
            "Immediate actions",
            &[
                "See a cardiologist urgently",
                "Follow a cardiac rehabilitation program",
                "Strictly control cholesterol and blood pressure",
                "Stop smoking immediately",
            ],
        ),
    }
}

/// Level-specific advice followed by the general group
pub fn recommendations(disease: DiseaseType, level: RiskLevel) -> Vec<RecommendationGroup> {
    let (title, items) = level_group(disease, level);
    vec![
        RecommendationGroup {
            title: title.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        },
        RecommendationGroup {
            title: GENERAL_TITLE.to_string(),
            items: GENERAL_ITEMS.iter().map(|s| s.to_string()).collect(),
        },
    ]
}

/// Build the full prediction payload
pub fn assess(
    disease: DiseaseType,
    probability: f64,
    features: &[f64; 3],
    input: &MetricInput,
) -> Prediction {
    let level = RiskLevel::from_probability(probability);
    let description = level.description().to_string();
    Prediction {
        disease_type: disease,
        risk_level: level,
        risk_description: description.clone(),
        probability: round1(probability * 100.0),
        risk_factors: risk_factors(disease, features),
        recommendations: recommendations(disease, level),
        input_data: input.clone(),
        message: description,
    }
}
