//! load model → parse input → build feature table → predict → recombine → emit.

use std::io::{Read, Write};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AdapterError, Result};
use crate::features::FeatureTable;
use crate::model::{Booster, PredictError, Predictor};
use crate::types::{InputRecord, OutputRecord};

pub fn load_model(path: &Path) -> Result<Booster> {
    let booster = Booster::from_file(path).map_err(|source| AdapterError::ArtifactLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let header = booster.header();
    info!(
        path = %path.display(),
        trees = booster.num_trees(),
        num_class = header.num_class,
        objective = ?header.objective,
        "loaded model"
    );
    Ok(booster)
}

/// Read the whole document, then decode each element as a record.
pub fn parse_input<R: Read>(mut reader: R) -> Result<Vec<InputRecord>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(AdapterError::Input)?;

    let items: Vec<Value> = serde_json::from_slice(&buf).map_err(AdapterError::InputParse)?;
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| AdapterError::Schema { index, source })
        })
        .collect()
}

/// Integer conversion truncates toward zero (2.7 -> 2, -2.7 -> -2).
pub fn truncate_prediction(row: usize, value: f64) -> std::result::Result<i64, PredictError> {
    if !value.is_finite() {
        return Err(PredictError::NonFinite { row, value });
    }
    Ok(value.trunc() as i64)
}

/// Pair prediction `i` with the coordinates of record `i`.
pub fn recombine(records: Vec<InputRecord>, predictions: &[f64]) -> Result<Vec<OutputRecord>> {
    if records.len() != predictions.len() {
        return Err(PredictError::OutputCount {
            got: predictions.len(),
            expected: records.len(),
        }
        .into());
    }
    records
        .into_iter()
        .zip(predictions)
        .enumerate()
        .map(|(i, (rec, &p))| -> Result<OutputRecord> {
            Ok(OutputRecord {
                lat: rec.lat,
                lon: rec.lon,
                prediction: truncate_prediction(i, p)?,
            })
        })
        .collect()
}

/// Serialize compactly and hand the whole array to the writer in one write.
pub fn emit<W: Write>(mut out: W, records: &[OutputRecord]) -> Result<()> {
    let bytes = serde_json::to_vec(records).map_err(|e| AdapterError::Output(e.into()))?;
    out.write_all(&bytes).map_err(AdapterError::Output)?;
    out.flush().map_err(AdapterError::Output)
}

/// Run one batch end to end. Nothing is written unless every step succeeds.
pub fn run<P, R, W>(predictor: &P, input: R, output: W) -> Result<usize>
where
    P: Predictor + ?Sized,
    R: Read,
    W: Write,
{
    let records = parse_input(input)?;
    let table = FeatureTable::from_records(&records);

    let (nz, mean) = table.summary();
    debug!(
        rows = table.n_rows(),
        cols = table.n_cols(),
        nonzero = nz,
        mean,
        "built feature table"
    );

    let predictions = predictor.predict(&table)?;
    let results = recombine(records, &predictions)?;
    emit(output, &results)?;

    info!(rows = results.len(), "wrote predictions");
    Ok(results.len())
}
