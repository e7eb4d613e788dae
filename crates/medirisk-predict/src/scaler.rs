use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Per-column standardization to zero mean and unit variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ModelError> {
        let first = rows.first().ok_or(ModelError::EmptyDataset)?;
        let width = first.as_ref().len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            let row = check_width(row.as_ref(), width)?;
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut scale = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row.as_ref()).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        for s in scale.iter_mut() {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let row = check_width(row, self.mean.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform_all<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<Vec<Vec<f64>>, ModelError> {
        rows.iter().map(|r| self.transform(r.as_ref())).collect()
    }

    /// Check a deserialized scaler against the expected width
    pub fn validate(&self, width: usize) -> Result<(), ModelError> {
        if self.mean.len() != width || self.scale.len() != width {
            return Err(ModelError::DimensionMismatch {
                expected: width,
                actual: self.mean.len().min(self.scale.len()),
            });
        }
        let finite = self.mean.iter().all(|m| m.is_finite());
        let positive = self.scale.iter().all(|s| s.is_finite() && *s > 0.0);
        if !finite || !positive {
            return Err(ModelError::CorruptSnapshot(
                "scaler holds a non-finite mean or a non-positive scale".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

fn check_width(row: &[f64], width: usize) -> Result<&[f64], ModelError> {
    if row.len() != width {
        return Err(ModelError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        });
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fit_transform() {
        let rows = vec![[1.0, 10.0], [3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        // population std of [1, 3] is 1; constant column falls back to 1
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
        assert_eq!(scaler.transform(&[3.0, 12.0]).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_fit_empty() {
        let rows: Vec<[f64; 3]> = Vec::new();
        assert!(matches!(
            StandardScaler::fit(&rows),
            Err(ModelError::EmptyDataset)
        ));
    }

    #[test]
    fn test_transform_wrong_width() {
        let scaler = StandardScaler::fit(&[[1.0, 2.0, 3.0]]).unwrap();
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(StandardScaler::fit(&rows).is_err());
    }

    proptest! {
        #[test]
        fn transformed_columns_are_centered(
            rows in prop::collection::vec(prop::array::uniform3(-1000.0f64..1000.0), 2..60)
        ) {
            let scaler = StandardScaler::fit(&rows).unwrap();
            let scaled = scaler.transform_all(&rows).unwrap();
            for col in 0..3 {
                let mean = scaled.iter().map(|r| r[col]).sum::<f64>() / scaled.len() as f64;
                prop_assert!(mean.abs() < 1e-6);
            }
        }
    }
}
