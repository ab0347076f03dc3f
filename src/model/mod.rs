//! Batch-predict capability and the LightGBM binding that provides it.

mod booster;
mod text;

pub use booster::{Booster, Header, Objective, Tree};
pub use text::ModelError;

use crate::features::FeatureTable;

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("feature count mismatch: table has {got} columns, model was trained on {expected}")]
    FeatureCount { got: usize, expected: usize },
    #[error("model produced {got} predictions for {expected} rows")]
    OutputCount { got: usize, expected: usize },
    #[error("prediction for row {row} is not a finite number ({value})")]
    NonFinite { row: usize, value: f64 },
}

/// Anything that can score a whole feature table in one call.
///
/// Implementations return exactly one value per row, in row order.
pub trait Predictor {
    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, PredictError>;
}
