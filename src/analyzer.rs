use crate::classifier::Classifier;
use crate::data::Dataset;
use crate::error::CoreError;
use crate::individual::Individual;
use crate::utils::shuffle_column;
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Post-hoc metrics over the best individual of a run.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct PerformanceReport {
    pub total_features: usize,
    pub selected_features: usize,
    /// `(1 - selected/total) * 100`
    pub reduction_percentage: f64,
    pub accuracy: f64,
    /// Harmonic combination of accuracy and reduction, in [0,100]
    pub efficiency_score: f64,
    /// Per-feature contribution scores aligned to the original column
    /// order; unselected features are exactly zero, selected ones sum
    /// to 100 (permutation importance of the refitted best model)
    pub feature_importance: Vec<f64>,
}

/// Reads a finished run and the original dataset; holds no state and has no
/// side effects beyond transient model fits.
pub struct PerformanceAnalyzer<'a> {
    data: &'a Dataset,
    backend: &'a dyn Classifier,
}

pub fn reduction_percentage(selected: usize, total: usize) -> f64 {
    (1.0 - selected as f64 / total as f64) * 100.0
}

/// Composite of accuracy and reduction fraction: 100 times their harmonic
/// mean. Monotone increasing in both arguments and bounded to [0,100];
/// selecting every feature scores 0 regardless of accuracy.
pub fn efficiency_score(accuracy: f64, reduction_fraction: f64) -> f64 {
    if accuracy + reduction_fraction <= 0.0 {
        return 0.0;
    }
    (100.0 * 2.0 * accuracy * reduction_fraction / (accuracy + reduction_fraction))
        .clamp(0.0, 100.0)
}

impl<'a> PerformanceAnalyzer<'a> {
    pub fn new(data: &'a Dataset, backend: &'a dyn Classifier) -> PerformanceAnalyzer<'a> {
        PerformanceAnalyzer { data, backend }
    }

    pub fn analyze(
        &self,
        best: &Individual,
        n_permutations: usize,
        seed: u64,
    ) -> Result<PerformanceReport, CoreError> {
        let total = self.data.feature_len;
        let reduction = reduction_percentage(best.k, total);

        Ok(PerformanceReport {
            total_features: total,
            selected_features: best.k,
            reduction_percentage: reduction,
            accuracy: best.accuracy,
            efficiency_score: efficiency_score(best.accuracy, reduction / 100.0),
            feature_importance: self.permutation_importance(best, n_permutations, seed)?,
        })
    }

    /// Mean decrease in accuracy when one selected column is permuted,
    /// averaged over seeded permutations on a model refitted to the best
    /// mask. Scores are clamped at zero, normalized to sum to 100 over
    /// selected features, and spread uniformly when no permutation moves
    /// the accuracy at all.
    fn permutation_importance(
        &self,
        best: &Individual,
        n_permutations: usize,
        seed: u64,
    ) -> Result<Vec<f64>, CoreError> {
        let columns = best.selected_indices();
        if columns.is_empty() {
            return Err(CoreError::EmptyMask);
        }

        let rows: Vec<usize> = (0..self.data.sample_len).collect();
        let (x, y) = self.data.submatrix(&rows, &columns);
        let model = self.backend.fit(&x, &y, columns.len())?;

        let baseline = accuracy_of(&model.predict(&x, columns.len()), &y);
        debug!("Importance baseline accuracy: {:.3}", baseline);

        let mut drops = Vec::with_capacity(columns.len());
        for (position, &column) in columns.iter().enumerate() {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(column as u64));
            let mut permuted_sum = 0.0;
            for _ in 0..n_permutations {
                let mut x_permuted = x.clone();
                shuffle_column(
                    &mut x_permuted,
                    self.data.sample_len,
                    columns.len(),
                    position,
                    &mut rng,
                );
                permuted_sum += accuracy_of(&model.predict(&x_permuted, columns.len()), &y);
            }
            let drop = baseline - permuted_sum / n_permutations as f64;
            drops.push(drop.max(0.0));
        }

        let total_drop: f64 = drops.iter().sum();
        let mut importance = vec![0.0; self.data.feature_len];
        if total_drop > 0.0 {
            for (&column, &drop) in columns.iter().zip(drops.iter()) {
                importance[column] = drop / total_drop * 100.0;
            }
        } else {
            for &column in &columns {
                importance[column] = 100.0 / columns.len() as f64;
            }
        }

        Ok(importance)
    }
}

fn accuracy_of(predictions: &[u8], truth: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    predictions
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count() as f64
        / truth.len() as f64
}
