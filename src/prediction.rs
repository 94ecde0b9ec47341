use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::classifier::{Classifier, RandomForest};
use crate::error::PredictError;
use crate::locator::FollowingPlay;
use crate::normalize::{NormalizedPlay, SituationSnapshot};

pub const POSTEAM_PREFIX: &str = "posteam_";
pub const DEFTEAM_PREFIX: &str = "defteam_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let raw = fs::read_to_string(path).map_err(|source| PredictError::MissingArtifact {
            path: path.to_path_buf(),
            source,
        })?;
        let columns = serde_json::from_str::<Vec<String>>(&raw).map_err(|err| {
            PredictError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        if columns.is_empty() {
            return Err(PredictError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: "empty column list".to_string(),
            });
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One-row input in trained column order. Columns the snapshot does not know
/// are zero; the two team dummies are one. Team dummies missing from the
/// schema are dropped, since the model never saw those teams.
pub fn assemble_features(
    schema: &FeatureSchema,
    snapshot: &SituationSnapshot,
    posteam: &str,
    defteam: &str,
) -> Vec<f64> {
    let mut values: HashMap<String, f64> = snapshot
        .features()
        .into_iter()
        .map(|(name, v)| (name.to_string(), v))
        .collect();
    for dummy in [
        format!("{POSTEAM_PREFIX}{posteam}"),
        format!("{DEFTEAM_PREFIX}{defteam}"),
    ] {
        if !schema.columns.contains(&dummy) {
            debug!(column = %dummy, "team dummy not in trained columns");
        }
        values.insert(dummy, 1.0);
    }
    schema
        .columns
        .iter()
        .map(|c| values.get(c).copied().unwrap_or(0.0))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayCategory {
    Run,
    Pass,
    FieldGoal,
    Punt,
    Other(String),
    NotYetHappened,
}

impl PlayCategory {
    /// Accepts both ESPN play type text ("Pass Reception", "Rush") and
    /// nflverse `play_type` values ("pass", "run", "field_goal").
    pub fn from_play_text(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with("Pass") || text == "pass" {
            PlayCategory::Pass
        } else if text.starts_with("Rush") || text == "run" {
            PlayCategory::Run
        } else if text.starts_with("Field ") || text == "field_goal" {
            PlayCategory::FieldGoal
        } else if text.starts_with("Punt") || text == "punt" {
            PlayCategory::Punt
        } else {
            PlayCategory::Other(text.to_string())
        }
    }

    pub fn from_following(following: &FollowingPlay) -> Self {
        match following {
            FollowingPlay::Known(text) => Self::from_play_text(text),
            FollowingPlay::NotYetHappened => PlayCategory::NotYetHappened,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PlayCategory::Run => "run",
            PlayCategory::Pass => "pass",
            PlayCategory::FieldGoal => "field goal",
            PlayCategory::Punt => "punt",
            PlayCategory::Other(text) => text,
            PlayCategory::NotYetHappened => "hasn't happened yet!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Wrong,
    Pending,
}

impl Verdict {
    pub fn judge(predicted: &str, actual: &PlayCategory) -> Self {
        match actual {
            PlayCategory::NotYetHappened => Verdict::Pending,
            other if *other == PlayCategory::from_play_text(predicted) => Verdict::Correct,
            _ => Verdict::Wrong,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Verdict::Correct => "🤘",
            Verdict::Wrong => "🤷",
            Verdict::Pending => "❓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionResult {
    pub label: String,
    pub actual: PlayCategory,
    pub verdict: Verdict,
}

pub struct Predictor {
    schema: FeatureSchema,
    model: Box<dyn Classifier>,
}

impl Predictor {
    pub fn new(schema: FeatureSchema, model: Box<dyn Classifier>) -> Result<Self, PredictError> {
        if model.n_features() != schema.len() {
            return Err(PredictError::WidthMismatch {
                model: model.n_features(),
                columns: schema.len(),
            });
        }
        Ok(Self { schema, model })
    }

    pub fn load(model_path: &Path, features_path: &Path) -> Result<Self, PredictError> {
        let schema = FeatureSchema::load(features_path)?;
        let model = RandomForest::load(model_path)?;
        info!(
            columns = schema.len(),
            classes = ?model.classes(),
            "classifier loaded"
        );
        Self::new(schema, Box::new(model))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn predict_label(&self, play: &NormalizedPlay) -> String {
        let row = assemble_features(
            &self.schema,
            &play.snapshot,
            &play.possessing_team,
            &play.defending_team,
        );
        self.model.predict(&row)
    }

    pub fn predict(&self, play: &NormalizedPlay) -> PredictionResult {
        let label = self.predict_label(play);
        let actual = PlayCategory::from_following(&play.following);
        let verdict = Verdict::judge(&label, &actual);
        info!(play = %play.play_label, %label, actual = actual.label(), ?verdict, "prediction");
        PredictionResult {
            label,
            actual,
            verdict,
        }
    }
}
