use thiserror::Error;

/// Error taxonomy for a selection run.
///
/// `InvalidConfig`, `EmptyDataset` and `ShapeMismatch` are fatal and abort a
/// run before any generation is evaluated. `EmptyMask` and `Evaluation` are
/// recovered locally by the optimizer and never abort a run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dataset contains no samples or no features")]
    EmptyDataset,

    #[error("Feature matrix has {x_rows} rows but label vector has {y_len} entries")]
    ShapeMismatch { x_rows: usize, y_len: usize },

    #[error("Mask selects no feature")]
    EmptyMask,

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}
