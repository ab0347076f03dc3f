use serde::{Deserialize, Serialize};
use serde_json::Number;

/// One location of the uploaded batch.
#[derive(Debug, Deserialize)]
pub struct InputRecord {
    pub lat: Number,
    pub lon: Number,
    pub data: WeatherFeatures,
}

/// Weather readings and Canadian fire-weather indices for one location.
/// Every field is required; extra keys (e.g. a leftover `forest_fire` label) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherFeatures {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub wind_speed_10m: f64,
    pub precipitation: f64,
    #[serde(rename = "FFMC")]
    pub ffmc: f64,
    #[serde(rename = "DMC")]
    pub dmc: f64,
    #[serde(rename = "DC")]
    pub dc: f64,
    #[serde(rename = "ISI")]
    pub isi: f64,
    #[serde(rename = "BUI")]
    pub bui: f64,
    #[serde(rename = "FWI")]
    pub fwi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub lat: Number,
    pub lon: Number,
    pub prediction: i64,
}
