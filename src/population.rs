use crate::cv::FitnessEvaluator;
use crate::error::CoreError;
use crate::ga::fitness;
use crate::individual::Individual;
use crate::utils;
use log::warn;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fitness assigned to an individual whose evaluation failed. Below any
/// reachable fit: accuracy is never negative and the parsimony penalty is
/// far smaller than 1.
pub const WORST_FIT: f64 = -1.0;

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    pub fn new() -> Population {
        Population {
            individuals: Vec::new(),
        }
    }

    /// Random initial population of the requested size.
    pub fn generate(size: usize, feature_len: usize, rng: &mut ChaCha8Rng) -> Population {
        let mut pop = Population::new();
        for _ in 0..size {
            pop.individuals.push(Individual::random(feature_len, rng));
        }
        pop
    }

    pub fn add(&mut self, other: Population) {
        self.individuals.extend(other.individuals);
    }

    /// Mean pairwise Hamming distance between masks, normalized by mask
    /// length so the result lands in [0,1]. A population of identical masks
    /// scores 0.
    pub fn diversity(&self) -> f64 {
        let n = self.individuals.len();
        if n < 2 {
            return 0.0;
        }
        let feature_len = self.individuals[0].mask.len();
        if feature_len == 0 {
            return 0.0;
        }

        let mut total_distance = 0usize;
        let mut comparisons = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                total_distance += self.individuals[i].hamming(&self.individuals[j]);
                comparisons += 1;
            }
        }

        total_distance as f64 / (comparisons * feature_len) as f64
    }

    /// Evaluate every individual in parallel against the shared read-only
    /// evaluator. Failed evaluations are discounted to [`WORST_FIT`] for
    /// this generation and counted, never propagated.
    pub fn evaluate(
        &mut self,
        evaluator: &FitnessEvaluator,
        sparsity_weight: f64,
        failures: &AtomicUsize,
    ) {
        self.individuals.par_iter_mut().for_each(|individual| {
            match evaluator.evaluate(&individual.mask) {
                Ok(accuracy) => {
                    individual.accuracy = accuracy;
                    individual.fit =
                        fitness(accuracy, individual.feature_ratio(), sparsity_weight);
                }
                Err(CoreError::EmptyMask) => {
                    warn!("Unrepaired empty mask reached evaluation, discounting it");
                    individual.accuracy = 0.0;
                    individual.fit = WORST_FIT;
                    failures.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("Evaluation failed for one individual: {}", e);
                    individual.accuracy = 0.0;
                    individual.fit = WORST_FIT;
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    }

    /// Sort descending by fit. The sort is stable, so equal fits keep their
    /// current order.
    pub fn sort(mut self) -> Self {
        self.individuals
            .sort_by(|i, j| j.fit.partial_cmp(&i.fit).unwrap());
        self
    }

    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .max_by(|i, j| i.fit.partial_cmp(&j.fit).unwrap())
    }

    pub fn mean_accuracy(&self) -> f64 {
        utils::mean(
            &self
                .individuals
                .iter()
                .map(|i| i.accuracy)
                .collect::<Vec<f64>>(),
        )
    }

    pub fn mean_fit(&self) -> f64 {
        utils::mean(&self.individuals.iter().map(|i| i.fit).collect::<Vec<f64>>())
    }
}
