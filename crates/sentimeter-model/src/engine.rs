//! Scoring engine: owns the current model generation and its lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sentimeter_core::{ExampleStore, LabeledExample};
use tokio::sync::{Mutex, OnceCell, RwLock};

use crate::artifact::{self, ArtifactPaths};
use crate::error::{ArtifactLoadError, EngineError, TrainingDataError};
use crate::evaluation::{evaluate, EvaluationMetrics};
use crate::normalize::normalize_all;
use crate::pipeline::ClassifierPipeline;
use crate::split::train_test_split;
use crate::types::{EngineConfig, Polarity, TrainOutcome};

/// Synthetic pair used when the store holds too few examples.
const BOOTSTRAP_TEXTS: [&str; 2] = ["This is a positive text", "This is a negative text"];

/// A jointly trained pair of pipelines plus their held-out metrics.
#[derive(Debug, Clone)]
pub struct ModelGeneration {
    positive: ClassifierPipeline,
    negative: ClassifierPipeline,
    metrics: Option<EvaluationMetrics>,
    trained_at: DateTime<Utc>,
}

impl ModelGeneration {
    pub(crate) fn new(
        positive: ClassifierPipeline,
        negative: ClassifierPipeline,
        metrics: Option<EvaluationMetrics>,
        trained_at: DateTime<Utc>,
    ) -> Self {
        Self {
            positive,
            negative,
            metrics,
            trained_at,
        }
    }

    /// `P(positive) - P(negative)` for each text, in input order.
    #[must_use]
    pub fn score<S: AsRef<str>>(&self, texts: &[S]) -> Vec<f64> {
        let normalized = normalize_all(texts);
        let positive = self.positive.predict_proba(&normalized);
        let negative = self.negative.predict_proba(&normalized);
        positive.into_iter().zip(negative).map(|(p, n)| p - n).collect()
    }

    /// `None` for bootstrap generations.
    #[must_use]
    pub fn metrics(&self) -> Option<&EvaluationMetrics> {
        self.metrics.as_ref()
    }

    #[must_use]
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}

fn fit_bootstrap(config: &EngineConfig) -> Result<ModelGeneration, TrainingDataError> {
    let texts = normalize_all(BOOTSTRAP_TEXTS);
    let positive = ClassifierPipeline::fit(&texts, &[true, false], config.max_features)?;
    let negative = ClassifierPipeline::fit(&texts, &[false, true], config.max_features)?;
    Ok(ModelGeneration::new(positive, negative, None, Utc::now()))
}

/// Fit both pipelines on one snapshot and one split.
fn fit_generation(
    examples: &[LabeledExample],
    config: &EngineConfig,
) -> Result<(ModelGeneration, TrainOutcome), TrainingDataError> {
    if examples.len() < config.min_training_examples {
        tracing::warn!(
            examples = examples.len(),
            required = config.min_training_examples,
            "model: too few labeled examples; fitting bootstrap pair without evaluation"
        );
        return Ok((fit_bootstrap(config)?, TrainOutcome::Bootstrap));
    }

    let texts = normalize_all(examples.iter().map(|e| e.text.as_str()));
    let split = train_test_split(texts.len(), config.test_size, config.random_state);
    tracing::info!(
        train = split.train.len(),
        test = split.test.len(),
        "model: fitting pipelines"
    );

    let select_texts =
        |idx: &[usize]| -> Vec<String> { idx.iter().map(|&i| texts[i].clone()).collect() };
    let select_labels = |idx: &[usize], polarity: Polarity| -> Vec<bool> {
        idx.iter().map(|&i| polarity.label(&examples[i])).collect()
    };

    let train_texts = select_texts(&split.train);
    let test_texts = select_texts(&split.test);

    let positive = ClassifierPipeline::fit(
        &train_texts,
        &select_labels(&split.train, Polarity::Positive),
        config.max_features,
    )?;
    let negative = ClassifierPipeline::fit(
        &train_texts,
        &select_labels(&split.train, Polarity::Negative),
        config.max_features,
    )?;

    let trained_at = Utc::now();
    let metrics = EvaluationMetrics {
        positive: evaluate(&positive, &test_texts, &select_labels(&split.test, Polarity::Positive)),
        negative: evaluate(&negative, &test_texts, &select_labels(&split.test, Polarity::Negative)),
        train_size: split.train.len(),
        test_size: split.test.len(),
        evaluated_at: trained_at,
    };

    for polarity in Polarity::ALL {
        let m = match polarity {
            Polarity::Positive => &metrics.positive,
            Polarity::Negative => &metrics.negative,
        };
        tracing::info!(
            %polarity,
            precision = m.precision,
            recall = m.recall,
            f1 = m.f1,
            support = m.support,
            "model: held-out evaluation"
        );
    }

    let generation = ModelGeneration::new(positive, negative, Some(metrics.clone()), trained_at);
    Ok((generation, TrainOutcome::Evaluated(metrics)))
}

/// Owns the serving generation and coordinates loading and retraining.
///
/// Construct once per process and share the returned `Arc`.
pub struct ScoringEngine {
    config: EngineConfig,
    paths: ArtifactPaths,
    store: Arc<dyn ExampleStore>,
    init: OnceCell<()>,
    current: RwLock<Option<Arc<ModelGeneration>>>,
    /// Held for a whole training run; records why the last run failed.
    training: Mutex<Option<String>>,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(config: EngineConfig, store: Arc<dyn ExampleStore>) -> Arc<Self> {
        let paths = ArtifactPaths::from_base(&config.artifact_base);
        Arc::new(Self {
            config,
            paths,
            store,
            init: OnceCell::new(),
            current: RwLock::new(None),
            training: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn artifact_paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// The serving generation, loading or training one on first use.
    ///
    /// Concurrent first callers share a single load-or-train run. If that
    /// run fails the next caller tries again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when no generation could be produced.
    pub async fn current(&self) -> Result<Arc<ModelGeneration>, EngineError> {
        self.init.get_or_try_init(|| self.initialize()).await?;

        self.current
            .read()
            .await
            .clone()
            .ok_or(EngineError::NoGeneration)
    }

    /// Install the persisted generation, or train a new one if it is missing
    /// or unusable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only when the fallback training fails.
    pub async fn load_or_train(&self) -> Result<(), EngineError> {
        let paths = self.paths.clone();
        let loaded = tokio::task::spawn_blocking(move || load_generation(&paths)).await;

        match loaded {
            Ok(Ok(generation)) => {
                tracing::info!(
                    trained_at = %generation.trained_at,
                    evaluated = generation.metrics.is_some(),
                    "model: loaded persisted generation"
                );
                self.install(Arc::new(generation)).await;
                Ok(())
            }
            Ok(Err(ArtifactLoadError::Missing(path))) => {
                tracing::info!(path = %path.display(), "model: no persisted generation; training");
                self.train().await.map(|_| ())
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "model: persisted generation unusable; retraining");
                self.train().await.map(|_| ())
            }
            Err(e) => {
                tracing::warn!(error = %e, "model: artifact load task failed; retraining");
                self.train().await.map(|_| ())
            }
        }
    }

    /// Fetch every labeled example, fit a new generation, persist it and
    /// swap it in.
    ///
    /// If another training run is in flight this waits for it without
    /// training again, and reports [`TrainOutcome::Coalesced`] only when that
    /// run succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the store is unreachable or fitting fails,
    /// and [`EngineError::JoinedRunFailed`] when the joined run failed. The
    /// previous generation keeps serving in every case.
    pub async fn train(&self) -> Result<TrainOutcome, EngineError> {
        let Ok(mut last_failure) = self.training.try_lock() else {
            tracing::info!("model: training already in progress; waiting for it");
            let joined = self.training.lock().await;
            return match joined.as_ref() {
                None => Ok(TrainOutcome::Coalesced),
                Some(reason) => Err(EngineError::JoinedRunFailed(reason.clone())),
            };
        };

        let result = self.run_training().await;
        match &result {
            Ok(_) => *last_failure = None,
            Err(e) => {
                tracing::error!(error = %e, "model: training failed; keeping previous generation");
                *last_failure = Some(e.to_string());
            }
        }
        result
    }

    /// Hook for the periodic trigger.
    ///
    /// # Errors
    ///
    /// See [`ScoringEngine::train`].
    pub async fn retrain(&self) -> Result<TrainOutcome, EngineError> {
        self.train().await
    }

    /// Score `texts` against the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when no generation is available.
    pub async fn score<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<f64>, EngineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.current().await?.score(texts))
    }

    /// Held-out metrics of the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when no generation is available.
    pub async fn metrics(&self) -> Result<Option<EvaluationMetrics>, EngineError> {
        Ok(self.current().await?.metrics().cloned())
    }

    async fn initialize(&self) -> Result<(), EngineError> {
        if self.current.read().await.is_none() {
            self.load_or_train().await?;
        }
        if self.current.read().await.is_some() {
            Ok(())
        } else {
            Err(EngineError::NoGeneration)
        }
    }

    async fn run_training(&self) -> Result<TrainOutcome, EngineError> {
        let examples = self.store.fetch_all().await?;
        tracing::info!(examples = examples.len(), "model: training started");

        let config = self.config.clone();
        let (generation, outcome) =
            tokio::task::spawn_blocking(move || fit_generation(&examples, &config))
                .await
                .map_err(|e| EngineError::TrainingAborted(e.to_string()))??;
        let generation = Arc::new(generation);

        let paths = self.paths.clone();
        let to_save = Arc::clone(&generation);
        let saved = tokio::task::spawn_blocking(move || {
            artifact::save_generation(
                &paths,
                &to_save.positive,
                &to_save.negative,
                to_save.metrics.as_ref(),
                to_save.trained_at,
            )
        })
        .await;
        match saved {
            Ok(Ok(())) => {
                tracing::info!(path = %self.config.artifact_base.display(), "model: persisted generation");
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "model: failed to persist generation; serving it from memory");
            }
            Err(e) => {
                tracing::error!(error = %e, "model: persist task failed; serving generation from memory");
            }
        }

        self.install(generation).await;
        tracing::info!(?outcome, "model: training finished");
        Ok(outcome)
    }

    async fn install(&self, generation: Arc<ModelGeneration>) {
        *self.current.write().await = Some(generation);
    }
}

fn load_generation(paths: &ArtifactPaths) -> Result<ModelGeneration, ArtifactLoadError> {
    let pair = artifact::load_pair(paths)?;
    let metrics = match artifact::load_metrics(paths, pair.trained_at) {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::warn!(error = %e, "model: ignoring unreadable evaluation metrics");
            None
        }
    };
    Ok(ModelGeneration::new(
        pair.positive,
        pair.negative,
        metrics,
        pair.trained_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentimeter_core::sample_examples;

    fn config() -> EngineConfig {
        EngineConfig::new("unused/sentiment_model")
    }

    #[test]
    fn bootstrap_branch_below_threshold() {
        let few = sample_examples().into_iter().take(9).collect::<Vec<_>>();
        let (generation, outcome) = fit_generation(&few, &config()).unwrap();
        assert_eq!(outcome, TrainOutcome::Bootstrap);
        assert!(generation.metrics().is_none());

        let scores = generation.score(&["This is a positive text", "This is a negative text"]);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn sample_dataset_splits_twelve_three() {
        let (generation, outcome) = fit_generation(&sample_examples(), &config()).unwrap();
        let TrainOutcome::Evaluated(metrics) = outcome else {
            panic!("expected evaluated outcome, got {outcome:?}");
        };
        assert_eq!(metrics.train_size, 12);
        assert_eq!(metrics.test_size, 3);
        assert_eq!(generation.metrics(), Some(&metrics));
        assert_eq!(metrics.evaluated_at, generation.trained_at());
    }

    #[test]
    fn score_uses_normalized_text() {
        let (generation, _) = fit_generation(&sample_examples(), &config()).unwrap();
        let lower = generation.score(&["i love this product"]);
        let upper = generation.score(&["I LOVE THIS PRODUCT"]);
        assert_eq!(lower, upper);
    }

    #[test]
    fn untokenizable_corpus_is_a_training_error() {
        let junk: Vec<LabeledExample> = (0..12)
            .map(|i| LabeledExample::new("!", i % 2 == 0, i % 2 == 1))
            .collect();
        let err = fit_generation(&junk, &config()).unwrap_err();
        assert!(matches!(err, TrainingDataError::EmptyVocabulary));
    }
}
