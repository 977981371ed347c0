//! L2-regularised binary logistic regression over sparse rows.

use serde::{Deserialize, Serialize};

use crate::error::TrainingDataError;
use crate::vectorizer::SparseRow;

/// Floor applied to the class rate when a training set has a single class.
const CONSTANT_RATE_FLOOR: f64 = 1e-3;

/// Optimiser settings.
#[derive(Debug, Clone, Copy)]
pub struct TrainingSettings {
    /// Inverse regularisation strength.
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this.
    pub tolerance: f64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 1.0,
            max_iter: 1000,
            tolerance: 1e-7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    weights: Vec<f64>,
    intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn dot(weights: &[f64], row: &[(usize, f64)]) -> f64 {
    row.iter()
        .map(|&(idx, value)| weights.get(idx).copied().unwrap_or(0.0) * value)
        .sum()
}

impl LogisticClassifier {
    /// Fit on `rows` (each with `n_features` columns) against boolean labels.
    ///
    /// Minimises mean log-loss plus `||w||² / (2·C·n)` by full-batch gradient
    /// descent from zero. The intercept is not penalised. A label vector with
    /// only one class yields a constant classifier.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingDataError`] when inputs are empty or lengths differ.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(
        rows: &[SparseRow],
        labels: &[bool],
        n_features: usize,
        settings: TrainingSettings,
    ) -> Result<Self, TrainingDataError> {
        if rows.len() != labels.len() {
            return Err(TrainingDataError::LengthMismatch {
                texts: rows.len(),
                labels: labels.len(),
            });
        }
        if rows.is_empty() {
            return Err(TrainingDataError::NoExamples);
        }

        let n = rows.len() as f64;
        let positives = labels.iter().filter(|&&l| l).count();

        if positives == 0 || positives == labels.len() {
            let rate = (positives as f64 / n).clamp(CONSTANT_RATE_FLOOR, 1.0 - CONSTANT_RATE_FLOOR);
            return Ok(Self {
                weights: vec![0.0; n_features],
                intercept: (rate / (1.0 - rate)).ln(),
            });
        }

        let mut weights = vec![0.0; n_features];
        let mut intercept = 0.0;
        let mut grad = vec![0.0; n_features];
        let l2 = 1.0 / (settings.c * n);

        for _ in 0..settings.max_iter {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;

            for (row, &label) in rows.iter().zip(labels) {
                let target = if label { 1.0 } else { 0.0 };
                let err = sigmoid(dot(&weights, row) + intercept) - target;
                for &(idx, value) in row {
                    if let Some(g) = grad.get_mut(idx) {
                        *g += err * value;
                    }
                }
                grad_b += err;
            }

            let mut max_grad = (grad_b / n).abs();
            for (g, w) in grad.iter_mut().zip(&weights) {
                *g = *g / n + l2 * w;
                max_grad = max_grad.max(g.abs());
            }

            if max_grad < settings.tolerance {
                break;
            }

            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= settings.learning_rate * g;
            }
            intercept -= settings.learning_rate * grad_b / n;
        }

        Ok(Self { weights, intercept })
    }

    /// Probability of the positive class for one row.
    #[must_use]
    pub fn predict_proba_row(&self, row: &[(usize, f64)]) -> f64 {
        sigmoid(dot(&self.weights, row) + self.intercept)
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.intercept.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}
