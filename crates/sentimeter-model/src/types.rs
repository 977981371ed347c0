use std::path::PathBuf;

use sentimeter_core::{AppConfig, LabeledExample};
use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationMetrics;

/// Below this many stored examples the engine fits the bootstrap pair
/// instead of splitting real data.
pub const MIN_TRAINING_EXAMPLES: usize = 10;

/// Which sentiment a pipeline detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub const ALL: [Polarity; 2] = [Polarity::Positive, Polarity::Negative];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
        }
    }

    /// The example's label column for this polarity.
    #[must_use]
    pub fn label(self, example: &LabeledExample) -> bool {
        match self {
            Polarity::Positive => example.positive,
            Polarity::Negative => example.negative,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for training and persisting model generations.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Artifact base path; `_positive.json` / `_negative.json` are appended.
    pub artifact_base: PathBuf,
    pub test_size: f64,
    pub random_state: u64,
    pub max_features: usize,
    pub min_training_examples: usize,
}

impl EngineConfig {
    #[must_use]
    pub fn new(artifact_base: impl Into<PathBuf>) -> Self {
        Self {
            artifact_base: artifact_base.into(),
            test_size: 0.2,
            random_state: 42,
            max_features: 5000,
            min_training_examples: MIN_TRAINING_EXAMPLES,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            artifact_base: config.model_path.clone(),
            test_size: config.test_size,
            random_state: config.random_state,
            max_features: config.max_features,
            min_training_examples: MIN_TRAINING_EXAMPLES,
        }
    }
}

/// What a call to `train` / `retrain` did.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    /// Fitted on a train split and evaluated on the held-out split.
    Evaluated(EvaluationMetrics),
    /// Too little data; fitted on the synthetic bootstrap pair, no metrics.
    Bootstrap,
    /// Another training run was already in flight; this call waited for it.
    Coalesced,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_selects_matching_label_column() {
        let positive_only = LabeledExample::new("good all round", true, false);
        assert!(Polarity::Positive.label(&positive_only));
        assert!(!Polarity::Negative.label(&positive_only));

        let mixed = LabeledExample::new("good and bad", true, true);
        assert!(Polarity::Positive.label(&mixed));
        assert!(Polarity::Negative.label(&mixed));
    }

    #[test]
    fn polarity_serializes_lowercase() {
        let json = serde_json::to_string(&Polarity::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
        assert_eq!(Polarity::Positive.to_string(), "positive");
    }

    #[test]
    fn engine_config_defaults_match_service_defaults() {
        let config = EngineConfig::new("data/sentiment_model");
        assert!((config.test_size - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.min_training_examples, 10);
    }
}
