//! Deterministic synthetic training data
//!
//! Each disease gets a table of normally distributed features and a label
//! computed from simple clinical rules. The same seed always yields the same
//! table, which keeps trained models reproducible across restarts.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::disease::DiseaseType;
use crate::error::ModelError;

/// Feature rows and their binary labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub rows: Vec<[f64; 3]>,
    pub labels: Vec<bool>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|l| **l).count() as f64 / self.labels.len() as f64
    }
}

/// (mean, standard deviation) per feature, in feature order
fn parameters(disease: DiseaseType) -> [(f64, f64); 3] {
    match disease {
        DiseaseType::Diabetes => [(150.0, 50.0), (50.0, 20.0), (25.0, 5.0)],
        DiseaseType::Hypertension => [(130.0, 20.0), (80.0, 10.0), (50.0, 20.0)],
        DiseaseType::Cardiovascular => [(75.0, 15.0), (200.0, 40.0), (50.0, 20.0)],
    }
}

/// One normal distribution per feature
pub fn distribution(disease: DiseaseType) -> Result<[Normal<f64>; 3], ModelError> {
    let [a, b, c] = parameters(disease);
    Ok([
        Normal::new(a.0, a.1)?,
        Normal::new(b.0, b.1)?,
        Normal::new(c.0, c.1)?,
    ])
}

/// Ground-truth rule used to label a synthetic row
pub fn label(disease: DiseaseType, row: &[f64; 3]) -> bool {
    match disease {
        DiseaseType::Diabetes => {
            let [glucose, age, bmi] = *row;
            glucose > 200.0 || (bmi > 30.0 && age > 45.0) || (glucose > 150.0 && bmi > 27.0)
        }
        DiseaseType::Hypertension => {
            let [systolic, diastolic, age] = *row;
            (systolic > 140.0 && diastolic > 90.0)
                || systolic > 160.0
                || diastolic > 100.0
                || (systolic > 130.0 && diastolic > 85.0 && age > 60.0)
        }
        DiseaseType::Cardiovascular => {
            let [heart_rate, cholesterol, age] = *row;
            cholesterol > 240.0
                || (heart_rate > 100.0 && age > 60.0)
                || (cholesterol > 200.0 && age > 55.0)
                || (heart_rate < 50.0 && age > 40.0)
        }
    }
}

/// Generate `samples` labelled rows for `disease`
pub fn synthesize(disease: DiseaseType, samples: usize, seed: u64) -> Result<Dataset, ModelError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = distribution(disease)?;

    let mut rows = Vec::with_capacity(samples);
    let mut labels = Vec::with_capacity(samples);
    for _ in 0..samples {
        let mut row = [0.0; 3];
        for (value, normal) in row.iter_mut().zip(&features) {
            *value = normal.sample(&mut rng);
        }
        labels.push(label(disease, &row));
        rows.push(row);
    }

    Ok(Dataset { rows, labels })
}
