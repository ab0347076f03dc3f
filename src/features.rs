use crate::types::{InputRecord, WeatherFeatures};

/// Column order the model was trained on. Shared with the training pipeline.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "temperature_2m",
    "relative_humidity_2m",
    "wind_speed_10m",
    "precipitation",
    "FFMC",
    "DMC",
    "DC",
    "ISI",
    "BUI",
    "FWI",
];

pub const NUM_FEATURES: usize = FEATURE_COLUMNS.len();

impl WeatherFeatures {
    /// Values laid out in `FEATURE_COLUMNS` order.
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [
            self.temperature_2m,
            self.relative_humidity_2m,
            self.wind_speed_10m,
            self.precipitation,
            self.ffmc,
            self.dmc,
            self.dc,
            self.isi,
            self.bui,
            self.fwi,
        ]
    }
}

/// Dense row-major feature matrix with labelled columns.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Vec<f64>,
    n_rows: usize,
}

impl FeatureTable {
    /// Build a table from raw rows. Every row must have `columns.len()` values.
    pub fn new(columns: Vec<String>, rows: &[Vec<f64>]) -> Self {
        let mut values = Vec::with_capacity(rows.len() * columns.len());
        for row in rows {
            debug_assert_eq!(row.len(), columns.len());
            values.extend_from_slice(row);
        }
        Self {
            columns,
            values,
            n_rows: rows.len(),
        }
    }

    /// One row per record, same order as `records`.
    pub fn from_records(records: &[InputRecord]) -> Self {
        let mut values = Vec::with_capacity(records.len() * NUM_FEATURES);
        for rec in records {
            values.extend_from_slice(&rec.data.to_row());
        }
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            values,
            n_rows: records.len(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let w = self.n_cols();
        &self.values[i * w..(i + 1) * w]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Non-zero count and mean over all cells, for debug logging.
    pub fn summary(&self) -> (usize, f64) {
        let nz = self.values.iter().filter(|x| **x != 0.0).count();
        let mean = if self.values.is_empty() {
            0.0
        } else {
            self.values.iter().sum::<f64>() / (self.values.len() as f64)
        };
        (nz, mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> InputRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn rows_follow_training_column_order() {
        let rec = record(
            r#"{"lat": 1, "lon": 2, "data": {
                "temperature_2m": 1, "relative_humidity_2m": 2, "wind_speed_10m": 3,
                "precipitation": 4, "FFMC": 5, "DMC": 6, "DC": 7, "ISI": 8, "BUI": 9, "FWI": 10
            }}"#,
        );
        let table = FeatureTable::from_records(&[rec]);
        assert_eq!(table.n_rows(), 1);
        assert_eq!(table.n_cols(), NUM_FEATURES);
        assert_eq!(table.row(0), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(table.columns()[4], "FFMC");
    }

    #[test]
    fn key_order_in_data_does_not_matter() {
        let a = record(
            r#"{"lat": 0, "lon": 0, "data": {
                "temperature_2m": 21.5, "relative_humidity_2m": 40, "wind_speed_10m": 12.1,
                "precipitation": 0, "FFMC": 88.2, "DMC": 30.1, "DC": 250, "ISI": 7.5, "BUI": 45, "FWI": 14.2
            }}"#,
        );
        let b = record(
            r#"{"data": {
                "FWI": 14.2, "BUI": 45, "ISI": 7.5, "DC": 250, "DMC": 30.1, "FFMC": 88.2,
                "precipitation": 0, "wind_speed_10m": 12.1, "relative_humidity_2m": 40, "temperature_2m": 21.5
            }, "lon": 0, "lat": 0}"#,
        );
        assert_eq!(a.data.to_row(), b.data.to_row());
    }

    #[test]
    fn extra_data_keys_are_ignored() {
        let rec = record(
            r#"{"lat": 0, "lon": 0, "data": {
                "temperature_2m": 1, "relative_humidity_2m": 1, "wind_speed_10m": 1,
                "precipitation": 1, "FFMC": 1, "DMC": 1, "DC": 1, "ISI": 1, "BUI": 1, "FWI": 1,
                "forest_fire": 1
            }}"#,
        );
        assert_eq!(rec.data.to_row(), [1.0; NUM_FEATURES]);
    }

    #[test]
    fn missing_field_is_rejected() {
        let res = serde_json::from_str::<InputRecord>(
            r#"{"lat": 0, "lon": 0, "data": {
                "temperature_2m": 1, "relative_humidity_2m": 1, "wind_speed_10m": 1,
                "precipitation": 1, "FFMC": 1, "DMC": 1, "DC": 1, "ISI": 1, "BUI": 1
            }}"#,
        );
        let err = res.unwrap_err();
        assert!(err.to_string().contains("FWI"));
    }

    #[test]
    fn empty_table() {
        let table = FeatureTable::from_records(&[]);
        assert!(table.is_empty());
        assert_eq!(table.rows().count(), 0);
        assert_eq!(table.summary(), (0, 0.0));
    }
}
