use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::derive::{FeatureMap, FeatureValue};
use crate::live::{LiveInput, derive_live};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    GoForIt,
    FieldGoal,
    Punt,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::GoForIt, Action::FieldGoal, Action::Punt];

    pub fn label(self) -> &'static str {
        match self {
            Action::GoForIt => "Go for it",
            Action::FieldGoal => "Field goal",
            Action::Punt => "Punt",
        }
    }
}

/// Normalized distribution over the three 4th-down choices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionProbs {
    pub go_for_it: f64,
    pub field_goal: f64,
    pub punt: f64,
}

impl ActionProbs {
    /// Accepts any non-negative weights in `Action::ALL` order and normalizes them.
    pub fn from_weights(weights: [f64; 3]) -> Result<Self> {
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(anyhow!("scorer returned invalid weights {weights:?}"));
        }
        let sum = weights.iter().sum::<f64>();
        if sum <= 0.0 {
            return Err(anyhow!("scorer returned an all-zero distribution"));
        }
        Ok(Self {
            go_for_it: weights[0] / sum,
            field_goal: weights[1] / sum,
            punt: weights[2] / sum,
        })
    }

    pub fn get(&self, action: Action) -> f64 {
        match action {
            Action::GoForIt => self.go_for_it,
            Action::FieldGoal => self.field_goal,
            Action::Punt => self.punt,
        }
    }

    /// Highest-probability action; ties go to the earlier entry of `Action::ALL`.
    pub fn best(&self) -> Action {
        let mut best = Action::GoForIt;
        for action in Action::ALL {
            if self.get(action) > self.get(best) {
                best = action;
            }
        }
        best
    }
}

/// The trained model, seen from the outside.
pub trait Scorer {
    fn score(&self, features: &FeatureMap) -> Result<ActionProbs>;
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub features: FeatureMap,
    pub probabilities: ActionProbs,
    pub best: Action,
}

pub fn recommend(scorer: &dyn Scorer, input: &LiveInput) -> Result<Recommendation> {
    let state = derive_live(input)?;
    let features = state.features();
    let probabilities = scorer.score(&features)?;
    Ok(Recommendation {
        best: probabilities.best(),
        features,
        probabilities,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionWeights {
    #[serde(default)]
    pub bias: f64,
    /// Numeric features by name; categorical levels as `name=level`.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearScorerArtifact {
    pub version: u32,
    #[serde(default)]
    pub source: Option<String>,
    pub go_for_it: ActionWeights,
    pub field_goal: ActionWeights,
    pub punt: ActionWeights,
}

/// Multinomial logistic model over the feature map.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    artifact: LinearScorerArtifact,
}

impl LinearScorer {
    pub fn from_artifact(artifact: LinearScorerArtifact) -> Self {
        Self { artifact }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read scorer artifact {}", path.display()))?;
        let artifact = serde_json::from_str::<LinearScorerArtifact>(&raw)
            .with_context(|| format!("parse scorer artifact {}", path.display()))?;
        Ok(Self::from_artifact(artifact))
    }

    fn weights(&self, action: Action) -> &ActionWeights {
        match action {
            Action::GoForIt => &self.artifact.go_for_it,
            Action::FieldGoal => &self.artifact.field_goal,
            Action::Punt => &self.artifact.punt,
        }
    }
}

impl Scorer for LinearScorer {
    fn score(&self, features: &FeatureMap) -> Result<ActionProbs> {
        let logits = Action::ALL.map(|action| logit(self.weights(action), features));
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        ActionProbs::from_weights(logits.map(|z| (z - max).exp()))
    }
}

// Categorical levels the artifact has no weight for contribute nothing.
fn logit(weights: &ActionWeights, features: &FeatureMap) -> f64 {
    let mut z = weights.bias;
    for (name, value) in features.iter() {
        match value {
            FeatureValue::Number(v) => {
                if let Some(w) = weights.weights.get(name) {
                    z += w * v;
                }
            }
            FeatureValue::Category(level) => {
                if let Some(w) = weights.weights.get(&format!("{name}={level}")) {
                    z += w;
                }
            }
        }
    }
    z
}
