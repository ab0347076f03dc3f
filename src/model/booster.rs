//! Tree-ensemble evaluation for LightGBM boosters.

use tracing::debug;

use super::{PredictError, Predictor};
use crate::features::FeatureTable;

/// LightGBM treats magnitudes below this as zero for `missing_type=Zero`.
const ZERO_THRESHOLD: f64 = 1e-35;

const CATEGORICAL_MASK: u8 = 1;
const DEFAULT_LEFT_MASK: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    fn from_decision(decision_type: u8) -> Self {
        match (decision_type >> 2) & 3 {
            1 => MissingType::Zero,
            2 => MissingType::NaN,
            _ => MissingType::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Identity output (regression, regression_l1, huber, quantile, ...).
    Regression,
    /// Log-link regression (poisson, gamma, tweedie): output is `exp(raw)`.
    LogLink,
    Binary { sigmoid: f64 },
    /// Cross-entropy regression on `[0, 1]` labels: output is `sigmoid(raw)`.
    CrossEntropy,
    /// Cross-entropy with lambda parametrisation: output is `ln(1 + exp(raw))`.
    CrossEntropyLambda,
    Multiclass { num_class: usize },
    /// Objective we do not know a transform for; raw scores are returned.
    Other(String),
}

impl Objective {
    /// Parse an objective line such as `binary sigmoid:1` or `multiclass num_class:3`.
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or("");
        let param = |key: &str| {
            s.split_whitespace()
                .find_map(|p| p.strip_prefix(key).and_then(|v| v.strip_prefix(':')))
                .map(str::to_string)
        };

        match name {
            "regression" | "regression_l2" | "regression_l1" | "l1" | "l2" | "mse" | "mae"
            | "huber" | "fair" | "quantile" | "mape" => Objective::Regression,
            "poisson" | "gamma" | "tweedie" => Objective::LogLink,
            "cross_entropy" | "xentropy" => Objective::CrossEntropy,
            "cross_entropy_lambda" | "xentlambda" => Objective::CrossEntropyLambda,
            "binary" => Objective::Binary {
                sigmoid: param("sigmoid").and_then(|v| v.parse().ok()).unwrap_or(1.0),
            },
            "multiclass" | "multiclassova" => Objective::Multiclass {
                num_class: param("num_class").and_then(|v| v.parse().ok()).unwrap_or(2),
            },
            _ => Objective::Other(s.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Header {
    pub num_class: usize,
    pub num_tree_per_iteration: usize,
    pub max_feature_idx: usize,
    pub objective: Objective,
    pub average_output: bool,
    pub feature_names: Vec<String>,
}

impl Header {
    pub fn num_features(&self) -> usize {
        self.max_feature_idx + 1
    }
}

/// One regression tree in LightGBM's array layout.
///
/// Internal nodes are `0..num_leaves-1`; a negative child `c` is leaf `!c`.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(super) split_feature: Vec<usize>,
    pub(super) threshold: Vec<f64>,
    pub(super) decision_type: Vec<u8>,
    pub(super) left_child: Vec<i32>,
    pub(super) right_child: Vec<i32>,
    pub(super) leaf_value: Vec<f64>,
    pub(super) cat_boundaries: Vec<usize>,
    pub(super) cat_threshold: Vec<u32>,
}

impl Tree {
    pub(super) fn constant(value: f64) -> Self {
        Self {
            split_feature: Vec::new(),
            threshold: Vec::new(),
            decision_type: Vec::new(),
            left_child: Vec::new(),
            right_child: Vec::new(),
            leaf_value: vec![value],
            cat_boundaries: Vec::new(),
            cat_threshold: Vec::new(),
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.leaf_value.len()
    }

    /// Index into `cat_boundaries` for a categorical node, `None` for numerical ones.
    pub(super) fn category_slot(&self, node: usize) -> Option<usize> {
        (self.decision_type[node] & CATEGORICAL_MASK != 0).then(|| self.threshold[node] as usize)
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.leaf_value[self.leaf_index(row)]
    }

    fn leaf_index(&self, row: &[f64]) -> usize {
        if self.split_feature.is_empty() {
            return 0;
        }
        let mut node = 0usize;
        loop {
            let fval = row[self.split_feature[node]];
            let next = if self.goes_left(node, fval) {
                self.left_child[node]
            } else {
                self.right_child[node]
            };
            if next < 0 {
                return (!next) as usize;
            }
            node = next as usize;
        }
    }

    fn goes_left(&self, node: usize, fval: f64) -> bool {
        let decision = self.decision_type[node];
        let missing = MissingType::from_decision(decision);
        match self.category_slot(node) {
            Some(slot) => self.categorical_left(slot, missing, fval),
            None => {
                let fval = if fval.is_nan() && missing != MissingType::NaN {
                    0.0
                } else {
                    fval
                };
                let is_missing = match missing {
                    MissingType::Zero => fval.abs() <= ZERO_THRESHOLD,
                    MissingType::NaN => fval.is_nan(),
                    MissingType::None => false,
                };
                if is_missing {
                    decision & DEFAULT_LEFT_MASK != 0
                } else {
                    fval <= self.threshold[node]
                }
            }
        }
    }

    fn categorical_left(&self, slot: usize, missing: MissingType, fval: f64) -> bool {
        let category = if fval.is_nan() {
            if missing == MissingType::NaN {
                return false;
            }
            0
        } else {
            // truncation toward zero, like a C int cast
            let c = fval as i64;
            if c < 0 {
                return false;
            }
            c as usize
        };
        let bits = &self.cat_threshold[self.cat_boundaries[slot]..self.cat_boundaries[slot + 1]];
        bits.get(category / 32)
            .map(|&word| (word >> (category % 32)) & 1 == 1)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct Booster {
    header: Header,
    trees: Vec<Tree>,
}

impl Booster {
    pub(super) fn new(header: Header, trees: Vec<Tree>) -> Self {
        Self { header, trees }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_iterations(&self) -> usize {
        self.trees.len() / self.header.num_tree_per_iteration
    }

    /// Sum of leaf values per output group, before the objective transform.
    pub fn predict_raw(&self, row: &[f64]) -> Vec<f64> {
        let groups = self.header.num_tree_per_iteration;
        let mut scores = vec![0.0; groups];
        for (k, tree) in self.trees.iter().enumerate() {
            scores[k % groups] += tree.predict_row(row);
        }
        if self.header.average_output && self.num_iterations() > 0 {
            let n = self.num_iterations() as f64;
            scores.iter_mut().for_each(|s| *s /= n);
        }
        scores
    }

    /// What the scikit-learn estimator's `predict` returns: class labels for
    /// classifiers, the transformed score for regressors.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let raw = self.predict_raw(row);
        match &self.header.objective {
            Objective::Binary { sigmoid } => {
                let prob = 1.0 / (1.0 + (-sigmoid * raw[0]).exp());
                if prob > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Objective::Multiclass { .. } => argmax(&raw) as f64,
            Objective::LogLink => raw[0].exp(),
            Objective::CrossEntropy => 1.0 / (1.0 + (-raw[0]).exp()),
            Objective::CrossEntropyLambda => raw[0].exp().ln_1p(),
            Objective::Regression | Objective::Other(_) => raw[0],
        }
    }

    fn check_columns(&self, table: &FeatureTable) -> Result<(), PredictError> {
        let expected = self.header.num_features();
        if table.n_cols() != expected {
            return Err(PredictError::FeatureCount {
                got: table.n_cols(),
                expected,
            });
        }
        let names = &self.header.feature_names;
        if !names.is_empty() && names.as_slice() != table.columns() {
            debug!(
                model = ?names,
                table = ?table.columns(),
                "feature names differ from the model's; predicting by position"
            );
        }
        Ok(())
    }
}

impl Predictor for Booster {
    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, PredictError> {
        self.check_columns(table)?;
        Ok(table.rows().map(|row| self.predict_row(row)).collect())
    }
}

/// First index of the largest value.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
