use crate::classifier::Classifier;
use crate::data::Dataset;
use crate::error::CoreError;
use crate::utils;
use log::debug;
use rand_chacha::ChaCha8Rng;

/// Scores a feature mask by stratified k-fold cross-validation.
///
/// Fold assignment is drawn once from the run RNG, so every evaluation of
/// the same mask within a run sees the same partition and returns the same
/// accuracy. Evaluation itself holds no mutable state and is safe to call
/// concurrently for different individuals.
pub struct FitnessEvaluator<'a> {
    data: &'a Dataset,
    backend: &'a dyn Classifier,
    /// Sample indices of each validation fold; together they cover every
    /// sample exactly once, with class proportions preserved per fold.
    validation_folds: Vec<Vec<usize>>,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(
        data: &'a Dataset,
        backend: &'a dyn Classifier,
        folds: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<FitnessEvaluator<'a>, CoreError> {
        if folds < 2 {
            return Err(CoreError::InvalidConfig(format!(
                "Invalid folds={}. Must be >= 2.",
                folds
            )));
        }
        if folds > data.sample_len {
            return Err(CoreError::InvalidConfig(format!(
                "Invalid folds={}. Dataset only has {} samples.",
                folds, data.sample_len
            )));
        }

        // Stratify: chunk the indices of each class separately, then merge
        // chunk i of every class into fold i.
        let mut validation_folds: Vec<Vec<usize>> = vec![Vec::new(); folds];
        for class in data.classes() {
            let indices: Vec<usize> = (0..data.sample_len)
                .filter(|&i| data.y[i] == class)
                .collect();
            let chunks = utils::split_into_balanced_random_chunks(indices, folds, rng);
            for (fold, chunk) in validation_folds.iter_mut().zip(chunks) {
                fold.extend(chunk);
            }
        }

        debug!(
            "Built {} stratified folds over {} samples",
            folds, data.sample_len
        );

        Ok(FitnessEvaluator {
            data,
            backend,
            validation_folds,
        })
    }

    /// Pooled cross-validated accuracy of a classifier restricted to the
    /// masked columns: correct predictions over all held-out samples,
    /// divided by the total sample count.
    pub fn evaluate(&self, mask: &[bool]) -> Result<f64, CoreError> {
        let columns: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| i)
            .collect();
        if columns.is_empty() {
            return Err(CoreError::EmptyMask);
        }

        let mut correct = 0usize;
        let mut total = 0usize;

        for (fold_idx, validation) in self.validation_folds.iter().enumerate() {
            let train: Vec<usize> = self
                .validation_folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, fold)| fold.iter().copied())
                .collect();

            let (train_x, train_y) = self.data.submatrix(&train, &columns);
            let model = self.backend.fit(&train_x, &train_y, columns.len())?;

            let (valid_x, valid_y) = self.data.submatrix(validation, &columns);
            let predictions = model.predict(&valid_x, columns.len());

            correct += predictions
                .iter()
                .zip(valid_y.iter())
                .filter(|(p, t)| p == t)
                .count();
            total += valid_y.len();
        }

        Ok(correct as f64 / total as f64)
    }
}
