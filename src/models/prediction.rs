use serde::{Deserialize, Serialize};

use super::record::Outcome;

/// Probability threshold above which the positive class is predicted.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// A named classifier configuration evaluated in every fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub name: String,
    /// Ensemble size.
    pub trees: usize,
}

impl ClassifierConfig {
    pub fn new(name: impl Into<String>, trees: usize) -> Self {
        Self {
            name: name.into(),
            trees,
        }
    }

    /// `rf16`, `rf512`, ...
    pub fn forest(trees: usize) -> Self {
        Self::new(format!("rf{trees}"), trees)
    }
}

/// One config's score for a held-out record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPrediction {
    pub config: String,
    pub probability: f64,
    pub predicted: Outcome,
}

impl ConfigPrediction {
    pub fn from_probability(config: impl Into<String>, probability: f64, positive: Outcome) -> Self {
        let predicted = if probability > DECISION_THRESHOLD {
            positive
        } else {
            positive.opposite()
        };
        Self {
            config: config.into(),
            probability,
            predicted,
        }
    }
}

/// Evaluator output row for one held-out record.
///
/// Configs that failed to fit in this record's fold have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub fold: usize,
    pub record_index: usize,
    pub observed: Outcome,
    pub predictions: Vec<ConfigPrediction>,
}

impl PredictionRecord {
    pub fn prediction(&self, config: &str) -> Option<&ConfigPrediction> {
        self.predictions.iter().find(|p| p.config == config)
    }
}

/// A fold/config pair that produced no predictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitFailureNote {
    pub fold: usize,
    pub config: String,
    pub reason: String,
}
