use std::path::PathBuf;

use sentimeter_core::StoreError;
use thiserror::Error;

use crate::types::Polarity;

/// The training data cannot produce a usable pipeline.
#[derive(Debug, Error)]
pub enum TrainingDataError {
    #[error("empty vocabulary: no training text contains a token")]
    EmptyVocabulary,

    #[error("length mismatch: {texts} texts but {labels} labels")]
    LengthMismatch { texts: usize, labels: usize },

    #[error("no training examples")]
    NoExamples,
}

/// A persisted pipeline could not be used. Always recovered by retraining.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("incompatible artifact {}: found {found}, expected {expected}", .path.display())]
    IncompatibleFormat {
        path: PathBuf,
        found: String,
        expected: String,
    },

    #[error("checksum mismatch in artifact {}", .0.display())]
    ChecksumMismatch(PathBuf),

    #[error("artifact {} holds the {found} pipeline", .path.display())]
    WrongPolarity { path: PathBuf, found: Polarity },

    #[error("artifact {} has inconsistent pipeline dimensions", .0.display())]
    Inconsistent(PathBuf),

    #[error("positive and negative artifacts come from different training runs")]
    MismatchedPair,
}

#[derive(Debug, Error)]
pub enum ArtifactWriteError {
    #[error("failed to write artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of a training or initialisation cycle.
///
/// The previously installed generation, if any, keeps serving.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    TrainingData(#[from] TrainingDataError),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("training task aborted: {0}")]
    TrainingAborted(String),

    #[error("no model generation is available")]
    NoGeneration,

    #[error("the training run this call waited for failed: {0}")]
    JoinedRunFailed(String),
}
