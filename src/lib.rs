pub mod analyzer;
pub mod classifier;
pub mod cv;
pub mod data;
pub mod error;
pub mod experiment;
pub mod ga;
pub mod individual;
pub mod param;
pub mod population;
pub mod utils;

use crate::analyzer::PerformanceAnalyzer;
use crate::classifier::Classifier;
use crate::data::Dataset;
use crate::error::CoreError;
use crate::experiment::Experiment;
use crate::ga::GaOutcome;
use crate::param::Param;
use chrono::Local;
use log::info;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Run the full pipeline on a caller-supplied dataset: genetic feature
/// selection followed by performance analysis of the winning mask.
///
/// The `running` flag allows cooperative cancellation between generations;
/// a cancelled run still returns a complete [`Experiment`] built from the
/// generations that did finish.
pub fn run(
    data: &Dataset,
    backend: &dyn Classifier,
    param: &Param,
    running: Arc<AtomicBool>,
) -> Result<Experiment, CoreError> {
    let start = std::time::Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    param::validate(param)?;
    data.validate()?;
    info!("{:?}", data);

    let outcome = if param.general.thread_number > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(param.general.thread_number)
            .build()
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        pool.install(|| ga::ga(data, backend, param, running))?
    } else {
        ga::ga(data, backend, param, running)?
    };

    let GaOutcome {
        best,
        history,
        evaluation_failures,
    } = outcome;

    info!("Computing performance report for the best mask...");
    let analyzer = PerformanceAnalyzer::new(data, backend);
    let report = analyzer.analyze(&best, param.importance.n_permutations, param.general.seed)?;

    let selected_indices = best.selected_indices();
    let selected_features = selected_indices
        .iter()
        .map(|&i| data.features[i].clone())
        .collect();

    Ok(Experiment {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp,
        selected_features,
        selected_indices,
        best_mask: best.mask.clone(),
        feature_count: best.k,
        total_features: data.feature_len,
        accuracy: best.accuracy,
        fit: best.fit,
        history,
        report,
        evaluation_failures,
        execution_time: start.elapsed().as_secs_f64(),
        parameters: param.clone(),
    })
}
