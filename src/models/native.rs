//! JSON-encoded native regressors
//!
//! The secondary model format: a linear model or a gradient-boosted tree
//! ensemble exported as JSON, evaluated without any external runtime.

use crate::error::StrategyError;
use crate::models::loader::DeserializeStrategy;
use crate::models::regressor::Regressor;
use crate::types::features::{Feature, FEATURE_COUNT};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A model document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeModel {
    /// Training column order. Must match the model input order when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,

    #[serde(flatten)]
    pub estimator: Estimator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    GradientBoosting {
        base_score: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    },
}

/// A regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

impl RegressionTree {
    fn validate(&self, tree_index: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree_index));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= FEATURE_COUNT {
                    return Err(format!(
                        "tree {} node {} splits on feature {} (model has {})",
                        tree_index, i, feature, FEATURE_COUNT
                    ));
                }
                // Children after parents keeps every walk finite
                for child in [left, right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!(
                            "tree {} node {} has invalid child index {}",
                            tree_index, i, child
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, row: &[f64; FEATURE_COUNT]) -> Result<f64> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row
                        .get(*feature)
                        .ok_or_else(|| anyhow!("split on unknown feature {}", feature))?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => return Err(anyhow!("node index {} out of bounds", index)),
            }
        }
        Err(anyhow!("tree walk did not reach a leaf"))
    }
}

impl NativeModel {
    /// Linear model with textbook-like sensitivities, shipped for demos
    pub fn demo() -> Self {
        Self {
            feature_names: Some(Feature::ALL.iter().map(|f| f.name().to_string()).collect()),
            estimator: Estimator::Linear {
                intercept: 190.0,
                coefficients: vec![-45.0, 0.05, 80.0, -2.0],
            },
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, StrategyError> {
        let model: NativeModel = serde_json::from_slice(bytes).map_err(|e| {
            if e.is_io() {
                StrategyError::Runtime(format!("failed to read JSON model: {}", e))
            } else {
                StrategyError::Format(format!("not a JSON model document: {}", e))
            }
        })?;
        model.validate().map_err(StrategyError::Format)?;
        Ok(model)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Shape checks that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if let Some(names) = &self.feature_names {
            let expected: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
            if names.iter().map(String::as_str).ne(expected.iter().copied()) {
                return Err(format!(
                    "model was trained on {:?}, expected {:?}",
                    names, expected
                ));
            }
        }

        match &self.estimator {
            Estimator::Linear { coefficients, .. } => {
                if coefficients.len() != FEATURE_COUNT {
                    return Err(format!(
                        "linear model has {} coefficients, expected {}",
                        coefficients.len(),
                        FEATURE_COUNT
                    ));
                }
            }
            Estimator::GradientBoosting { trees, .. } => {
                if trees.is_empty() {
                    return Err("gradient boosting model has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(i)?;
                }
            }
        }
        Ok(())
    }
}

impl Regressor for NativeModel {
    fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>> {
        let value = match &self.estimator {
            Estimator::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(row.iter())
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
            Estimator::GradientBoosting {
                base_score,
                learning_rate,
                trees,
            } => {
                let mut total = 0.0;
                for tree in trees {
                    total += tree.evaluate(row)?;
                }
                base_score + learning_rate * total
            }
        };
        Ok(vec![value])
    }
}

/// Strategy reading [`NativeModel`] JSON documents
#[derive(Debug, Default)]
pub struct JsonStrategy;

impl DeserializeStrategy for JsonStrategy {
    fn name(&self) -> &str {
        "json"
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Regressor>, StrategyError> {
        let model = NativeModel::from_slice(bytes)?;
        Ok(Box::new(model))
    }
}
