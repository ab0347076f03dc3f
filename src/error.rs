use std::path::PathBuf;

use crate::model::{ModelError, PredictError};

/// Every way a run can fail. None of them are recovered from.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("cannot locate the adapter's install directory")]
    InstallDir(#[source] std::io::Error),
    #[error("failed to load model artifact {}", path.display())]
    ArtifactLoad {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
    #[error("failed to read standard input")]
    Input(#[source] std::io::Error),
    #[error("standard input is not a well-formed JSON array")]
    InputParse(#[source] serde_json::Error),
    #[error("record {index} does not match the expected schema")]
    Schema {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("prediction failed")]
    Prediction(#[from] PredictError),
    #[error("failed to write predictions")]
    Output(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
