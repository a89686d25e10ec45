use crate::analyzer::PerformanceReport;
use crate::ga::EvolutionRecord;
use crate::param::Param;
use serde::{Deserialize, Serialize};

/// Complete record of one selection run, handed to the caller by value.
/// Everything the transport layer needs for display or charting is here:
/// the winning mask, the per-generation history and the derived metrics.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Experiment {
    pub version: String,
    pub timestamp: String,

    /// Names of the selected features, original column order
    pub selected_features: Vec<String>,
    pub selected_indices: Vec<usize>,
    pub best_mask: Vec<bool>,
    pub feature_count: usize,
    pub total_features: usize,

    /// Cross-validated accuracy of the best individual
    pub accuracy: f64,
    /// Combined fitness of the best individual
    pub fit: f64,

    pub history: Vec<EvolutionRecord>,
    pub report: PerformanceReport,

    /// Individuals discounted to worst fitness because their evaluation
    /// failed; informational only, never fatal
    pub evaluation_failures: usize,
    pub execution_time: f64,
    pub parameters: Param,
}
