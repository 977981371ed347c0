//! Held-out quality metrics for a trained generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::ClassifierPipeline;

/// Binary confusion matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl ConfusionCounts {
    #[must_use]
    pub fn from_predictions(predicted: &[bool], actual: &[bool]) -> Self {
        let mut counts = Self::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p, a) {
                (true, true) => counts.tp += 1,
                (true, false) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (false, true) => counts.fn_ += 1,
            }
        }
        counts
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision / recall / F1 for one polarity on the held-out split.
///
/// Undefined ratios (zero denominators) are reported as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarityMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Held-out rows that actually carry this polarity.
    pub support: usize,
    pub confusion: ConfusionCounts,
}

impl PolarityMetrics {
    #[must_use]
    pub fn from_confusion(confusion: ConfusionCounts) -> Self {
        let precision = ratio(confusion.tp, confusion.tp + confusion.fp);
        let recall = ratio(confusion.tp, confusion.tp + confusion.fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: confusion.tp + confusion.fn_,
            confusion,
        }
    }
}

/// Metrics for a whole generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub positive: PolarityMetrics,
    pub negative: PolarityMetrics,
    pub train_size: usize,
    pub test_size: usize,
    /// Matches the `trained_at` stamp of the artifacts it describes.
    pub evaluated_at: DateTime<Utc>,
}

/// Score `pipeline` against `labels` on already-normalised `texts`.
#[must_use]
pub fn evaluate(pipeline: &ClassifierPipeline, texts: &[String], labels: &[bool]) -> PolarityMetrics {
    let predicted = pipeline.predict(texts);
    PolarityMetrics::from_confusion(ConfusionCounts::from_predictions(&predicted, labels))
}
