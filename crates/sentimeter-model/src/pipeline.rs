use serde::{Deserialize, Serialize};

use crate::classifier::{LogisticClassifier, TrainingSettings};
use crate::error::TrainingDataError;
use crate::vectorizer::TfIdfVectorizer;

/// A fitted vectorizer and classifier for one polarity.
///
/// Inputs are expected to be normalised already; the pipeline itself does not
/// lower-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPipeline {
    vectorizer: TfIdfVectorizer,
    classifier: LogisticClassifier,
}

impl ClassifierPipeline {
    /// Fit a fresh vectorizer and classifier on `texts` / `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingDataError`] for empty input, mismatched lengths, or a
    /// corpus without any tokens.
    pub fn fit(
        texts: &[String],
        labels: &[bool],
        max_features: usize,
    ) -> Result<Self, TrainingDataError> {
        if texts.len() != labels.len() {
            return Err(TrainingDataError::LengthMismatch {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        if texts.is_empty() {
            return Err(TrainingDataError::NoExamples);
        }

        let vectorizer = TfIdfVectorizer::fit(texts, max_features)?;
        let rows = vectorizer.transform(texts);
        let classifier = LogisticClassifier::fit(
            &rows,
            labels,
            vectorizer.n_features(),
            TrainingSettings::default(),
        )?;

        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Probability that each text carries this pipeline's polarity.
    #[must_use]
    pub fn predict_proba(&self, texts: &[String]) -> Vec<f64> {
        texts
            .iter()
            .map(|t| {
                self.classifier
                    .predict_proba_row(&self.vectorizer.transform_one(t))
            })
            .collect()
    }

    /// Hard labels: a text is positive only when its probability exceeds 0.5.
    #[must_use]
    pub fn predict(&self, texts: &[String]) -> Vec<bool> {
        self.predict_proba(texts)
            .into_iter()
            .map(|p| p > 0.5)
            .collect()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.vectorizer.n_features()
    }

    /// Vectorizer and classifier agree on dimensions and hold finite weights.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.vectorizer.is_consistent()
            && self.vectorizer.n_features() == self.classifier.n_features()
            && self.classifier.is_finite()
    }
}
