use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// In-memory numeric dataset: a dense row-major feature matrix with one
/// label per sample. Parsing and encoding are the caller's concern, the
/// matrix is expected to be fully numeric and label-aligned.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    /// Feature values, row-major: `x[sample * feature_len + feature]`
    pub x: Vec<f64>,
    /// Class label of each sample
    pub y: Vec<u8>,
    /// Feature names, one per column
    pub features: Vec<String>,
    pub feature_len: usize,
    pub sample_len: usize,
}

impl Dataset {
    /// Build a dataset from sample rows, labels and column names.
    /// Fails fast on empty input or shape mismatches, before any evolution
    /// can start.
    pub fn from_parts(
        rows: Vec<Vec<f64>>,
        y: Vec<u8>,
        features: Vec<String>,
    ) -> Result<Dataset, CoreError> {
        if rows.is_empty() || features.is_empty() {
            return Err(CoreError::EmptyDataset);
        }
        if rows.len() != y.len() {
            return Err(CoreError::ShapeMismatch {
                x_rows: rows.len(),
                y_len: y.len(),
            });
        }

        let feature_len = features.len();
        let sample_len = rows.len();
        let mut x = Vec::with_capacity(sample_len * feature_len);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != feature_len {
                return Err(CoreError::InvalidConfig(format!(
                    "Sample {} has {} values but {} feature names were provided",
                    i,
                    row.len(),
                    feature_len
                )));
            }
            x.extend(row);
        }

        Ok(Dataset {
            x,
            y,
            features,
            feature_len,
            sample_len,
        })
    }

    /// Re-check internal consistency. Useful when the struct was assembled
    /// field by field instead of through [`Dataset::from_parts`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sample_len == 0 || self.feature_len == 0 {
            return Err(CoreError::EmptyDataset);
        }
        if self.y.len() != self.sample_len {
            return Err(CoreError::ShapeMismatch {
                x_rows: self.sample_len,
                y_len: self.y.len(),
            });
        }
        if self.x.len() != self.sample_len * self.feature_len {
            return Err(CoreError::InvalidConfig(format!(
                "Feature matrix has {} values but {} samples x {} features require {}",
                self.x.len(),
                self.sample_len,
                self.feature_len,
                self.sample_len * self.feature_len
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn value(&self, sample: usize, feature: usize) -> f64 {
        self.x[sample * self.feature_len + feature]
    }

    /// Distinct labels present in the dataset, ascending.
    pub fn classes(&self) -> Vec<u8> {
        let mut classes: Vec<u8> = self.y.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Extract a row-major submatrix restricted to the given samples and
    /// columns, together with the matching labels.
    pub fn submatrix(&self, samples: &[usize], columns: &[usize]) -> (Vec<f64>, Vec<u8>) {
        let mut x = Vec::with_capacity(samples.len() * columns.len());
        let mut y = Vec::with_capacity(samples.len());
        for &s in samples {
            for &c in columns {
                x.push(self.value(s, c));
            }
            y.push(self.y[s]);
        }
        (x, y)
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Dataset with {} samples, {} features and {} classes",
            self.sample_len,
            self.feature_len,
            self.classes().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_from_parts_valid() {
        let data = Dataset::from_parts(
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            vec![0, 1, 0],
            names(2),
        )
        .unwrap();
        assert_eq!(data.sample_len, 3);
        assert_eq!(data.feature_len, 2);
        assert_eq!(data.value(1, 0), 3.0);
        assert_eq!(data.value(2, 1), 6.0);
        assert_eq!(data.classes(), vec![0, 1]);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_from_parts_empty_is_fatal() {
        let err = Dataset::from_parts(vec![], vec![], names(2)).unwrap_err();
        assert_eq!(err, CoreError::EmptyDataset);
    }

    #[test]
    fn test_from_parts_shape_mismatch_is_fatal() {
        let err =
            Dataset::from_parts(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0], names(2))
                .unwrap_err();
        assert_eq!(err, CoreError::ShapeMismatch { x_rows: 2, y_len: 1 });
    }

    #[test]
    fn test_from_parts_ragged_rows_rejected() {
        let err = Dataset::from_parts(vec![vec![1.0, 2.0], vec![3.0]], vec![0, 1], names(2))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_distinguishes_label_and_matrix_mismatches() {
        let mut data = Dataset::from_parts(
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![0, 1],
            names(2),
        )
        .unwrap();

        data.y.pop();
        assert_eq!(
            data.validate().unwrap_err(),
            CoreError::ShapeMismatch { x_rows: 2, y_len: 1 }
        );

        data.y.push(1);
        data.x.pop();
        match data.validate().unwrap_err() {
            CoreError::InvalidConfig(message) => {
                assert!(message.contains("3 values"), "got: {}", message);
                assert!(message.contains("require 4"), "got: {}", message);
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_submatrix() {
        let data = Dataset::from_parts(
            vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
            vec![0, 1, 1],
            names(3),
        )
        .unwrap();
        let (x, y) = data.submatrix(&[0, 2], &[0, 2]);
        assert_eq!(x, vec![1.0, 3.0, 7.0, 9.0]);
        assert_eq!(y, vec![0, 1]);
    }
}
