use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One candidate solution: a boolean mask over the candidate features plus
/// its cached evaluation. Crossover and mutation build new individuals, so
/// a computed fitness is never silently stale.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Individual {
    /// Selection mask, one entry per feature column
    pub mask: Vec<bool>,
    /// Number of selected features, kept in sync with `mask`
    pub k: usize,
    /// Cross-validated accuracy estimate in [0,1]
    pub accuracy: f64,
    /// Combined fitness: accuracy minus the parsimony penalty
    pub fit: f64,
    /// Generation that produced this individual
    pub epoch: usize,
}

impl Individual {
    pub fn new(feature_len: usize) -> Individual {
        Individual {
            mask: vec![false; feature_len],
            k: 0,
            accuracy: 0.0,
            fit: 0.0,
            epoch: 0,
        }
    }

    /// Random mask with each bit set with probability 0.5, repaired so the
    /// invariant of at least one selected feature always holds.
    pub fn random(feature_len: usize, rng: &mut ChaCha8Rng) -> Individual {
        let mut individual = Individual::new(feature_len);
        individual.mask = (0..feature_len).map(|_| rng.gen_bool(0.5)).collect();
        individual.count_k();
        individual.repair(rng);
        individual
    }

    pub fn count_k(&mut self) {
        self.k = self.mask.iter().filter(|&&b| b).count();
    }

    /// Force one random bit on when the mask is empty. An empty mask must
    /// never reach the evaluator.
    pub fn repair(&mut self, rng: &mut ChaCha8Rng) {
        if self.k == 0 {
            let bit = rng.gen_range(0..self.mask.len());
            self.mask[bit] = true;
            self.k = 1;
        }
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Fraction of candidate features this individual selects.
    pub fn feature_ratio(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.k as f64 / self.mask.len() as f64
    }

    /// Number of positions where two masks disagree.
    pub fn hamming(&self, other: &Individual) -> usize {
        self.mask
            .iter()
            .zip(other.mask.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}
