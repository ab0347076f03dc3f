//! LightGBM text model format (`Booster.save_model()` output).
//!
//! The file is line based: a header of `key=value` lines, then one
//! `Tree=N` section per tree, then `end of trees` followed by parameters
//! we do not need.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::booster::{Booster, Header, Objective, Tree};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
    #[error("tree {tree}: {field} has {actual} values, expected {expected}")]
    SizeMismatch {
        tree: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("tree {tree}: {reason}")]
    InvalidTree { tree: usize, reason: String },
    #[error("tree {0} uses linear leaves, which are not supported")]
    LinearTree(usize),
}

type Section<'a> = HashMap<&'a str, &'a str>;

impl Booster {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_text(&content)
    }

    pub fn from_text(content: &str) -> Result<Self, ModelError> {
        let (header_kv, average_output, tree_sections) = split_sections(content);
        let header = parse_header(&header_kv, average_output)?;

        let mut trees = Vec::with_capacity(tree_sections.len());
        for (idx, kv) in tree_sections.iter().enumerate() {
            let tree = parse_tree(idx, kv)?;
            if let Some(&f) = tree.split_feature.iter().find(|&&f| f > header.max_feature_idx) {
                return Err(ModelError::InvalidTree {
                    tree: idx,
                    reason: format!(
                        "split on feature {f} but max_feature_idx is {}",
                        header.max_feature_idx
                    ),
                });
            }
            trees.push(tree);
        }

        if trees.len() % header.num_tree_per_iteration != 0 {
            return Err(ModelError::InvalidValue {
                field: "num_tree_per_iteration",
                value: format!(
                    "{} (model has {} trees)",
                    header.num_tree_per_iteration,
                    trees.len()
                ),
            });
        }

        Ok(Booster::new(header, trees))
    }
}

/// Header key/values, the bare `average_output` flag, and one map per tree.
fn split_sections(content: &str) -> (Section<'_>, bool, Vec<Section<'_>>) {
    let mut header = Section::new();
    let mut average_output = false;
    let mut trees: Vec<Section<'_>> = Vec::new();

    for line in content.lines() {
        let line = line.trim_end();
        if line == "end of trees" {
            break;
        }
        if line.starts_with("Tree=") {
            trees.push(Section::new());
            continue;
        }
        match (line.split_once('='), trees.last_mut()) {
            (Some((k, v)), Some(tree)) => {
                tree.insert(k, v);
            }
            (Some((k, v)), None) => {
                header.insert(k, v);
            }
            (None, None) if line == "average_output" => average_output = true,
            // model type line ("tree") and blank separators
            _ => {}
        }
    }

    (header, average_output, trees)
}

fn parse_header(kv: &Section<'_>, average_output: bool) -> Result<Header, ModelError> {
    let num_class: usize = required(kv, "num_class")?;
    let num_tree_per_iteration: usize = optional(kv, "num_tree_per_iteration")?
        .unwrap_or_else(|| num_class.max(1));
    if num_tree_per_iteration == 0 {
        return Err(ModelError::InvalidValue {
            field: "num_tree_per_iteration",
            value: "0".into(),
        });
    }

    Ok(Header {
        num_class,
        num_tree_per_iteration,
        max_feature_idx: required(kv, "max_feature_idx")?,
        objective: kv
            .get("objective")
            .map(|s| Objective::parse(s))
            .unwrap_or(Objective::Regression),
        average_output,
        feature_names: kv
            .get("feature_names")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
    })
}

fn parse_tree(idx: usize, kv: &Section<'_>) -> Result<Tree, ModelError> {
    let num_leaves: usize = required(kv, "num_leaves")?;
    if num_leaves == 0 {
        return Err(ModelError::InvalidTree {
            tree: idx,
            reason: "num_leaves is 0".into(),
        });
    }
    let is_linear = optional::<i32>(kv, "is_linear")?.unwrap_or(0) != 0;
    if is_linear {
        return Err(ModelError::LinearTree(idx));
    }

    let leaf_value: Vec<f64> = array(kv, "leaf_value")?.ok_or(ModelError::MissingField("leaf_value"))?;
    expect_len(idx, "leaf_value", &leaf_value, num_leaves)?;

    if num_leaves == 1 {
        return Ok(Tree::constant(leaf_value[0]));
    }

    let n_splits = num_leaves - 1;
    let split_feature: Vec<usize> =
        array(kv, "split_feature")?.ok_or(ModelError::MissingField("split_feature"))?;
    let threshold: Vec<f64> = array(kv, "threshold")?.ok_or(ModelError::MissingField("threshold"))?;
    let decision_type: Vec<u8> = array(kv, "decision_type")?.unwrap_or_else(|| vec![0; n_splits]);
    let left_child: Vec<i32> = array(kv, "left_child")?.ok_or(ModelError::MissingField("left_child"))?;
    let right_child: Vec<i32> =
        array(kv, "right_child")?.ok_or(ModelError::MissingField("right_child"))?;

    expect_len(idx, "split_feature", &split_feature, n_splits)?;
    expect_len(idx, "threshold", &threshold, n_splits)?;
    expect_len(idx, "decision_type", &decision_type, n_splits)?;
    expect_len(idx, "left_child", &left_child, n_splits)?;
    expect_len(idx, "right_child", &right_child, n_splits)?;

    // Children always have a larger node index than their parent, so
    // traversal from node 0 terminates.
    for node in 0..n_splits {
        for child in [left_child[node], right_child[node]] {
            let ok = if child < 0 {
                ((!child) as usize) < num_leaves
            } else {
                (child as usize) > node && (child as usize) < n_splits
            };
            if !ok {
                return Err(ModelError::InvalidTree {
                    tree: idx,
                    reason: format!("node {node} has invalid child reference {child}"),
                });
            }
        }
    }

    let num_cat: usize = optional(kv, "num_cat")?.unwrap_or(0);
    let (cat_boundaries, cat_threshold) = if num_cat > 0 {
        let bounds: Vec<usize> =
            array(kv, "cat_boundaries")?.ok_or(ModelError::MissingField("cat_boundaries"))?;
        let bits: Vec<u32> =
            array(kv, "cat_threshold")?.ok_or(ModelError::MissingField("cat_threshold"))?;
        expect_len(idx, "cat_boundaries", &bounds, num_cat + 1)?;
        if bounds.windows(2).any(|w| w[0] > w[1]) || bounds[num_cat] > bits.len() {
            return Err(ModelError::InvalidTree {
                tree: idx,
                reason: "cat_boundaries out of range".into(),
            });
        }
        (bounds, bits)
    } else {
        (Vec::new(), Vec::new())
    };

    let tree = Tree {
        split_feature,
        threshold,
        decision_type,
        left_child,
        right_child,
        leaf_value,
        cat_boundaries,
        cat_threshold,
    };

    for node in 0..n_splits {
        if let Some(cat_idx) = tree.category_slot(node) {
            if cat_idx >= num_cat {
                return Err(ModelError::InvalidTree {
                    tree: idx,
                    reason: format!("node {node} refers to categorical split {cat_idx} of {num_cat}"),
                });
            }
        }
    }

    Ok(tree)
}

fn required<T: FromStr>(kv: &Section<'_>, field: &'static str) -> Result<T, ModelError> {
    optional(kv, field)?.ok_or(ModelError::MissingField(field))
}

fn optional<T: FromStr>(kv: &Section<'_>, field: &'static str) -> Result<Option<T>, ModelError> {
    kv.get(field)
        .map(|raw| {
            raw.trim().parse().map_err(|_| ModelError::InvalidValue {
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn array<T: FromStr>(kv: &Section<'_>, field: &'static str) -> Result<Option<Vec<T>>, ModelError> {
    kv.get(field)
        .map(|raw| {
            raw.split_whitespace()
                .map(|v| {
                    v.parse().map_err(|_| ModelError::InvalidValue {
                        field,
                        value: v.to_string(),
                    })
                })
                .collect()
        })
        .transpose()
}

fn expect_len<T>(tree: usize, field: &'static str, values: &[T], expected: usize) -> Result<(), ModelError> {
    if values.len() != expected {
        return Err(ModelError::SizeMismatch {
            tree,
            field,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}
