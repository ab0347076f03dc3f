//! Wildfire risk inference adapter: weather/fire-index records in on stdin,
//! gradient-boosted tree predictions out on stdout.

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod types;

pub use error::{AdapterError, Result};
pub use features::{FeatureTable, FEATURE_COLUMNS};
pub use model::{Booster, PredictError, Predictor};
pub use types::{InputRecord, OutputRecord, WeatherFeatures};
