use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::PredictError;

pub trait Classifier {
    fn n_features(&self) -> usize;
    fn predict(&self, row: &[f64]) -> String;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNodeArtifact {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeArtifact {
    pub nodes: Vec<TreeNodeArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForestArtifact {
    pub classes: Vec<String>,
    pub n_features: usize,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<TreeArtifact>,
}

impl RandomForest {
    /// Checks every node reference up front so prediction can index freely.
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, String> {
        if artifact.classes.is_empty() {
            return Err("forest has no classes".to_string());
        }
        if artifact.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (t, tree) in artifact.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} is empty"));
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNodeArtifact::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if *feature >= artifact.n_features {
                            return Err(format!("tree {t} node {n} uses feature {feature}"));
                        }
                        // Children must come after their parent, which also rules out cycles.
                        let in_range = |c: usize| c > n && c < tree.nodes.len();
                        if !in_range(*left) || !in_range(*right) {
                            return Err(format!("tree {t} node {n} has bad children"));
                        }
                    }
                    TreeNodeArtifact::Leaf { value } => {
                        if value.len() != artifact.classes.len() {
                            return Err(format!(
                                "tree {t} leaf {n} has {} values for {} classes",
                                value.len(),
                                artifact.classes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(Self {
            classes: artifact.classes,
            n_features: artifact.n_features,
            trees: artifact.trees,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let raw = fs::read_to_string(path).map_err(|source| PredictError::MissingArtifact {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = serde_json::from_str::<ForestArtifact>(&raw).map_err(|err| {
            PredictError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        Self::from_artifact(artifact).map_err(|reason| PredictError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = leaf_for(tree, row);
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (slot, v) in acc.iter_mut().zip(leaf) {
                *slot += v / total;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|p| *p /= n);
        acc
    }
}

fn leaf_for<'a>(tree: &'a TreeArtifact, row: &[f64]) -> &'a [f64] {
    let mut idx = 0;
    loop {
        match &tree.nodes[idx] {
            TreeNodeArtifact::Leaf { value } => return value,
            TreeNodeArtifact::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let x = row.get(*feature).copied().unwrap_or(0.0);
                idx = if x <= *threshold { *left } else { *right };
            }
        }
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    /// Arg-max class; ties go to the earlier class.
    fn predict(&self, row: &[f64]) -> String {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best].clone()
    }
}
