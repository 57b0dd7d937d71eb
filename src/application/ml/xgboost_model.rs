//! Evaluator for gradient-boosted tree models saved in XGBoost's JSON format.
//!
//! Only tree boosters with numerical splits and a single output are
//! supported. Leaf values live in `split_conditions`, a left child of `-1`
//! marks a leaf, and a missing (NaN) feature follows `default_left`.

use super::predictor::TreeEnsembleModel;
use crate::domain::errors::{BaseForecastError, ModelLoadError};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct XgbDocument {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: Objective,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    model: Option<GbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    trees: Vec<RawTree>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

/// Older writers emit booleans, newer ones 0/1 integers.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf(f32),
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = features[feature];
                    idx = if x.is_nan() {
                        if default_left { left } else { right }
                    } else if x < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Maps the summed margin back to prediction space.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Link {
    Identity,
    Logistic,
    Log,
}

impl Link {
    fn from_objective(name: &str) -> Option<Self> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:squaredlogerror" | "reg:pseudohubererror"
            | "reg:absoluteerror" | "reg:quantileerror" => Some(Link::Identity),
            "reg:logistic" | "binary:logistic" => Some(Link::Logistic),
            "count:poisson" | "reg:gamma" | "reg:tweedie" => Some(Link::Log),
            _ => None,
        }
    }

    fn to_margin(self, base_score: f32) -> f32 {
        match self {
            Link::Identity => base_score,
            Link::Logistic => (base_score / (1.0 - base_score)).ln(),
            Link::Log => base_score.ln(),
        }
    }

    fn apply(self, margin: f32) -> f32 {
        match self {
            Link::Identity => margin,
            Link::Logistic => 1.0 / (1.0 + (-margin).exp()),
            Link::Log => margin.exp(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct XgbJsonModel {
    trees: Vec<Tree>,
    base_margin: f32,
    link: Link,
    feature_names: Option<Vec<String>>,
    num_features: usize,
}

impl XgbJsonModel {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::parse(&raw, path)?;
        info!(
            "Loaded XGBoost model from {:?} ({} trees, {} features)",
            path,
            model.trees.len(),
            model.num_features
        );
        Ok(model)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, ModelLoadError> {
        let invalid = |reason: String| ModelLoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        };
        let doc: XgbDocument = serde_json::from_str(raw).map_err(|source| ModelLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let learner = doc.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(invalid(format!(
                "unsupported booster '{}'",
                learner.gradient_booster.name
            )));
        }
        let link = Link::from_objective(&learner.objective.name)
            .ok_or_else(|| invalid(format!("unsupported objective '{}'", learner.objective.name)))?;

        let params = &learner.learner_model_param;
        let num_class = parse_param(params.num_class.as_deref().unwrap_or("0"))
            .ok_or_else(|| invalid("num_class is not a number".to_string()))?;
        if num_class > 1.0 {
            return Err(invalid("multi-class models are not supported".to_string()));
        }
        let base_score = parse_param(&params.base_score)
            .ok_or_else(|| invalid(format!("bad base_score '{}'", params.base_score)))?
            as f32;
        let base_margin = link.to_margin(base_score);
        if !base_margin.is_finite() {
            return Err(invalid(format!("base_score {} outside link domain", base_score)));
        }

        let feature_names = (!learner.feature_names.is_empty()).then_some(learner.feature_names);
        let num_features = match (&feature_names, params.num_feature.as_deref()) {
            (Some(names), _) => names.len(),
            (None, Some(n)) => parse_count(n)
                .ok_or_else(|| invalid(format!("bad num_feature '{}'", n)))?,
            (None, None) => return Err(invalid("feature count not declared".to_string())),
        };

        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| invalid("booster has no model".to_string()))?;
        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| build_tree(raw, num_features).map_err(|r| invalid(format!("tree {}: {}", i, r))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            base_margin,
            link,
            feature_names,
            num_features,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Scalars are stored as strings, newer versions wrap them in brackets.
fn parse_param(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse::<f64>()
        .ok()
}

/// Whole, non-negative counts only.
fn parse_count(raw: &str) -> Option<usize> {
    parse_param(raw)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as usize)
}

fn build_tree(raw: RawTree, num_features: usize) -> Result<Tree, String> {
    let n = raw.left_children.len();
    if n == 0 {
        return Err("empty tree".to_string());
    }
    if raw.right_children.len() != n
        || raw.split_indices.len() != n
        || raw.split_conditions.len() != n
        || raw.default_left.len() != n
    {
        return Err("node arrays have different lengths".to_string());
    }
    if raw.split_type.iter().any(|t| *t != 0) {
        return Err("categorical splits are not supported".to_string());
    }

    let mut nodes = Vec::with_capacity(n);
    for id in 0..n {
        let left = raw.left_children[id];
        let right = raw.right_children[id];
        if left == -1 {
            nodes.push(Node::Leaf(raw.split_conditions[id]));
            continue;
        }
        // Children always follow their parent, which rules out cycles
        let child = |c: i32| -> Result<usize, String> {
            usize::try_from(c)
                .ok()
                .filter(|&c| c > id && c < n)
                .ok_or_else(|| format!("node {} has invalid child {}", id, c))
        };
        let feature = raw.split_indices[id] as usize;
        if feature >= num_features {
            return Err(format!(
                "node {} splits on feature {} of {}",
                id, feature, num_features
            ));
        }
        nodes.push(Node::Split {
            feature,
            threshold: raw.split_conditions[id],
            left: child(left)?,
            right: child(right)?,
            default_left: raw.default_left[id].is_set(),
        });
    }
    Ok(Tree { nodes })
}

impl TreeEnsembleModel for XgbJsonModel {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict_row(&self, features: &[f64]) -> Result<f64, BaseForecastError> {
        if features.len() != self.num_features {
            return Err(BaseForecastError::FeatureCountMismatch {
                expected: self.num_features,
                actual: features.len(),
            });
        }
        // Single precision throughout, matching XGBoost
        let features: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let margin = self.trees.iter().fold(self.base_margin, |acc, t| {
            acc + t.leaf_value(&features)
        });
        let value = f64::from(self.link.apply(margin));
        if !value.is_finite() {
            return Err(BaseForecastError::NumericalInstability {
                reason: format!("tree ensemble produced {}", value),
            });
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "XGBoost JSON"
    }
}
