//! Sentiment scoring engine for sentimeter.
//!
//! Two independent binary pipelines (TF-IDF features into a logistic
//! classifier) estimate the probability that a tweet carries positive and
//! negative sentiment. A tweet's score is `P(positive) - P(negative)`, which
//! always lies in `[-1.0, 1.0]`.
//!
//! [`ScoringEngine`] owns the current [`ModelGeneration`]: it loads the
//! persisted pair on first use (or trains one), retrains on request, and
//! swaps finished generations in atomically so concurrent scorers never see
//! a half-replaced pair.

pub mod artifact;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod normalize;
pub mod pipeline;
pub mod split;
pub mod types;
pub mod vectorizer;

pub use artifact::ArtifactPaths;
pub use engine::{ModelGeneration, ScoringEngine};
pub use error::{ArtifactLoadError, ArtifactWriteError, EngineError, TrainingDataError};
pub use evaluation::{evaluate, ConfusionCounts, EvaluationMetrics, PolarityMetrics};
pub use normalize::normalize;
pub use pipeline::ClassifierPipeline;
pub use split::{train_test_split, SplitIndices};
pub use types::{EngineConfig, Polarity, TrainOutcome};
