use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub ga: GA,
    #[serde(default)]
    pub cv: CV,
    #[serde(default)]
    pub importance: Importance,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    /// Worker threads for fitness evaluation; 0 uses the default rayon pool
    #[serde(default = "uzero_default")]
    pub thread_number: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GA {
    #[serde(default = "population_size_default")]
    pub population_size: usize,
    #[serde(default = "generations_default")]
    pub generations: usize,
    #[serde(default = "base_mutation_rate_default")]
    pub base_mutation_rate: f64,
    #[serde(default = "min_mutation_rate_default")]
    pub min_mutation_rate: f64,
    #[serde(default = "max_mutation_rate_default")]
    pub max_mutation_rate: f64,
    #[serde(default = "tournament_size_default")]
    pub tournament_size: usize,
    #[serde(default = "elite_count_default")]
    pub elite_count: usize,
    /// Diversity below this boosts mutation to escape premature convergence
    #[serde(default = "low_diversity_default")]
    pub low_diversity: f64,
    /// Diversity above this damps mutation to exploit good solutions
    #[serde(default = "high_diversity_default")]
    pub high_diversity: f64,
    #[serde(default = "diversity_boost_default")]
    pub diversity_boost: f64,
    #[serde(default = "diversity_damp_default")]
    pub diversity_damp: f64,
    /// Upper bound of the parsimony penalty; an accuracy gap larger than
    /// this can never be inverted by feature-count differences
    #[serde(default = "sparsity_weight_default")]
    pub sparsity_weight: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CV {
    #[serde(default = "folds_default")]
    pub folds: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Importance {
    #[serde(default = "n_permutations_default")]
    pub n_permutations: usize,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for GA {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for CV {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Importance {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Load parameters from a YAML file and validate them.
pub fn get(param_file: String) -> Result<Param, Box<dyn Error>> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let config: Param = serde_yaml::from_reader(param_reader)?;
    validate(&config)?;

    Ok(config)
}

/// Reject configurations that cannot produce a meaningful run. Called once
/// before any evolution starts; a failure here is fatal.
pub fn validate(param: &Param) -> Result<(), CoreError> {
    if param.ga.population_size < 2 {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid population_size={}. Must be >= 2.",
            param.ga.population_size
        )));
    }
    if param.ga.generations < 1 {
        return Err(CoreError::InvalidConfig(
            "Invalid generations=0. Must be >= 1.".to_string(),
        ));
    }
    if param.ga.base_mutation_rate <= 0.0 || param.ga.base_mutation_rate > 1.0 {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid base_mutation_rate={:.3}. Must be in range (0, 1].",
            param.ga.base_mutation_rate
        )));
    }
    if param.ga.min_mutation_rate <= 0.0
        || param.ga.min_mutation_rate > param.ga.max_mutation_rate
        || param.ga.max_mutation_rate > 1.0
    {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid mutation rate band [{:.3}, {:.3}]. Must satisfy 0 < min <= max <= 1.",
            param.ga.min_mutation_rate, param.ga.max_mutation_rate
        )));
    }
    if param.ga.elite_count >= param.ga.population_size {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid elite_count={}. Must be < population_size={}.",
            param.ga.elite_count, param.ga.population_size
        )));
    }
    if param.ga.tournament_size < 2 {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid tournament_size={}. Must be >= 2.",
            param.ga.tournament_size
        )));
    }
    if param.ga.sparsity_weight < 0.0 {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid sparsity_weight={:.3}. Must be >= 0.",
            param.ga.sparsity_weight
        )));
    }
    if param.ga.low_diversity > param.ga.high_diversity {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid diversity thresholds: low={:.3} > high={:.3}.",
            param.ga.low_diversity, param.ga.high_diversity
        )));
    }
    if param.cv.folds < 2 {
        return Err(CoreError::InvalidConfig(format!(
            "Invalid folds={}. Must be >= 2.",
            param.cv.folds
        )));
    }
    if param.importance.n_permutations == 0 {
        return Err(CoreError::InvalidConfig(
            "Invalid n_permutations=0. Must be >= 1.".to_string(),
        ));
    }
    Ok(())
}

// Default value definitions

fn seed_default() -> u64 {
    4815162342
}
fn uzero_default() -> usize {
    0
}
fn population_size_default() -> usize {
    60
}
fn generations_default() -> usize {
    50
}
fn base_mutation_rate_default() -> f64 {
    0.15
}
fn min_mutation_rate_default() -> f64 {
    0.01
}
fn max_mutation_rate_default() -> f64 {
    0.3
}
fn tournament_size_default() -> usize {
    5
}
fn elite_count_default() -> usize {
    2
}
fn low_diversity_default() -> f64 {
    0.2
}
fn high_diversity_default() -> f64 {
    0.4
}
fn diversity_boost_default() -> f64 {
    1.5
}
fn diversity_damp_default() -> f64 {
    0.7
}
fn sparsity_weight_default() -> f64 {
    0.05
}
fn folds_default() -> usize {
    5
}
fn n_permutations_default() -> usize {
    10
}
