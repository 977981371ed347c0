//! On-disk layout for trained generations.
//!
//! Each polarity is stored as a JSON envelope wrapping the serialized
//! pipeline with a format tag, version, polarity, training timestamp and a
//! SHA-256 checksum of the pipeline payload. Metrics live beside them in
//! `evaluation_metrics.json`.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};

use crate::error::{ArtifactLoadError, ArtifactWriteError};
use crate::evaluation::EvaluationMetrics;
use crate::pipeline::ClassifierPipeline;
use crate::types::Polarity;

pub const ARTIFACT_FORMAT: &str = "sentimeter.pipeline";
pub const ARTIFACT_VERSION: u32 = 1;
pub const METRICS_FILE_NAME: &str = "evaluation_metrics.json";

/// File locations derived from the configured artifact base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub positive: PathBuf,
    pub negative: PathBuf,
    pub metrics: PathBuf,
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl ArtifactPaths {
    /// `data/sentiment_model` becomes `data/sentiment_model_positive.json`,
    /// `data/sentiment_model_negative.json` and `data/evaluation_metrics.json`.
    #[must_use]
    pub fn from_base(base: &Path) -> Self {
        let dir = base.parent().unwrap_or_else(|| Path::new(""));
        Self {
            positive: with_suffix(base, "_positive.json"),
            negative: with_suffix(base, "_negative.json"),
            metrics: dir.join(METRICS_FILE_NAME),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    polarity: Polarity,
    trained_at: DateTime<Utc>,
    checksum: String,
    pipeline: Box<RawValue>,
}

fn checksum(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// Write `bytes` to a sibling temp file, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactWriteError> {
    let io_err = |source| ArtifactWriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let tmp = with_suffix(path, ".tmp");
    fs::write(&tmp, bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    fs::read(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ArtifactLoadError::Missing(path.to_path_buf())
        } else {
            ArtifactLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub(crate) fn write_pipeline(
    path: &Path,
    polarity: Polarity,
    pipeline: &ClassifierPipeline,
    trained_at: DateTime<Utc>,
) -> Result<(), ArtifactWriteError> {
    let payload = serde_json::to_string(pipeline)?;
    let envelope = Envelope {
        format: ARTIFACT_FORMAT.to_string(),
        version: ARTIFACT_VERSION,
        polarity,
        trained_at,
        checksum: checksum(&payload),
        pipeline: RawValue::from_string(payload)?,
    };
    let bytes = serde_json::to_vec_pretty(&envelope)?;
    write_atomic(path, &bytes)
}

fn read_pipeline(
    path: &Path,
    expected: Polarity,
) -> Result<(ClassifierPipeline, DateTime<Utc>), ArtifactLoadError> {
    let bytes = read_file(path)?;
    let malformed = |source| ArtifactLoadError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    let envelope: Envelope = serde_json::from_slice(&bytes).map_err(malformed)?;

    if envelope.format != ARTIFACT_FORMAT || envelope.version != ARTIFACT_VERSION {
        return Err(ArtifactLoadError::IncompatibleFormat {
            path: path.to_path_buf(),
            found: format!("{} v{}", envelope.format, envelope.version),
            expected: format!("{ARTIFACT_FORMAT} v{ARTIFACT_VERSION}"),
        });
    }
    if checksum(envelope.pipeline.get()) != envelope.checksum {
        return Err(ArtifactLoadError::ChecksumMismatch(path.to_path_buf()));
    }
    if envelope.polarity != expected {
        return Err(ArtifactLoadError::WrongPolarity {
            path: path.to_path_buf(),
            found: envelope.polarity,
        });
    }

    let pipeline: ClassifierPipeline =
        serde_json::from_str(envelope.pipeline.get()).map_err(malformed)?;
    if !pipeline.is_consistent() {
        return Err(ArtifactLoadError::Inconsistent(path.to_path_buf()));
    }

    Ok((pipeline, envelope.trained_at))
}

/// A pipeline pair read back from disk.
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub positive: ClassifierPipeline,
    pub negative: ClassifierPipeline,
    pub trained_at: DateTime<Utc>,
}

/// Persist both pipelines and the generation's metrics.
///
/// When `metrics` is `None` any existing metrics file is removed so a
/// bootstrap generation never reports an older run's numbers.
///
/// # Errors
///
/// Returns [`ArtifactWriteError`] if serialization or any filesystem step fails.
pub fn save_generation(
    paths: &ArtifactPaths,
    positive: &ClassifierPipeline,
    negative: &ClassifierPipeline,
    metrics: Option<&EvaluationMetrics>,
    trained_at: DateTime<Utc>,
) -> Result<(), ArtifactWriteError> {
    write_pipeline(&paths.positive, Polarity::Positive, positive, trained_at)?;
    write_pipeline(&paths.negative, Polarity::Negative, negative, trained_at)?;

    match metrics {
        Some(metrics) => {
            let bytes = serde_json::to_vec_pretty(metrics)?;
            write_atomic(&paths.metrics, &bytes)
        }
        None => match fs::remove_file(&paths.metrics) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArtifactWriteError::Io {
                path: paths.metrics.clone(),
                source,
            }),
        },
    }
}

/// Load and validate both pipelines.
///
/// # Errors
///
/// Returns the first [`ArtifactLoadError`] encountered, or
/// [`ArtifactLoadError::MismatchedPair`] when the two files were written by
/// different training runs.
pub fn load_pair(paths: &ArtifactPaths) -> Result<LoadedPair, ArtifactLoadError> {
    let (positive, pos_trained) = read_pipeline(&paths.positive, Polarity::Positive)?;
    let (negative, neg_trained) = read_pipeline(&paths.negative, Polarity::Negative)?;

    if pos_trained != neg_trained {
        return Err(ArtifactLoadError::MismatchedPair);
    }

    Ok(LoadedPair {
        positive,
        negative,
        trained_at: pos_trained,
    })
}

/// Metrics written alongside the generation trained at `trained_at`.
///
/// Returns `Ok(None)` when no metrics file exists or it belongs to another run.
///
/// # Errors
///
/// Returns [`ArtifactLoadError`] when the file exists but cannot be read or parsed.
pub fn load_metrics(
    paths: &ArtifactPaths,
    trained_at: DateTime<Utc>,
) -> Result<Option<EvaluationMetrics>, ArtifactLoadError> {
    let bytes = match read_file(&paths.metrics) {
        Ok(bytes) => bytes,
        Err(ArtifactLoadError::Missing(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let metrics: EvaluationMetrics =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactLoadError::Malformed {
            path: paths.metrics.clone(),
            source,
        })?;

    Ok((metrics.evaluated_at == trained_at).then_some(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{ConfusionCounts, PolarityMetrics};

    fn fitted(label_first: bool) -> ClassifierPipeline {
        let texts = vec![
            "this is a positive text".to_string(),
            "this is a negative text".to_string(),
        ];
        ClassifierPipeline::fit(&texts, &[label_first, !label_first], 5000).unwrap()
    }

    fn sample_metrics(at: DateTime<Utc>) -> EvaluationMetrics {
        let m = PolarityMetrics::from_confusion(ConfusionCounts { tp: 1, fp: 0, tn: 2, fn_: 0 });
        EvaluationMetrics {
            positive: m.clone(),
            negative: m,
            train_size: 12,
            test_size: 3,
            evaluated_at: at,
        }
    }

    fn paths_in(dir: &tempfile::TempDir) -> ArtifactPaths {
        ArtifactPaths::from_base(&dir.path().join("models").join("sentiment_model"))
    }

    #[test]
    fn paths_follow_base_name() {
        let paths = ArtifactPaths::from_base(Path::new("data/sentiment_model"));
        assert_eq!(paths.positive, PathBuf::from("data/sentiment_model_positive.json"));
        assert_eq!(paths.negative, PathBuf::from("data/sentiment_model_negative.json"));
        assert_eq!(paths.metrics, PathBuf::from("data/evaluation_metrics.json"));

        let bare = ArtifactPaths::from_base(Path::new("model"));
        assert_eq!(bare.metrics, PathBuf::from("evaluation_metrics.json"));
    }

    #[test]
    fn saved_generation_loads_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        let (pos, neg) = (fitted(true), fitted(false));
        let at = Utc::now();

        save_generation(&paths, &pos, &neg, Some(&sample_metrics(at)), at).unwrap();

        let loaded = load_pair(&paths).unwrap();
        assert_eq!(loaded.positive, pos);
        assert_eq!(loaded.negative, neg);
        assert_eq!(loaded.trained_at, at);
        assert_eq!(load_metrics(&paths, at).unwrap(), Some(sample_metrics(at)));
    }

    #[test]
    fn missing_files_report_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pair(&paths_in(&dir)).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Missing(_)));
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        let at = Utc::now();
        save_generation(&paths, &fitted(true), &fitted(false), None, at).unwrap();

        let mut envelope: serde_json::Value =
            serde_json::from_slice(&fs::read(&paths.positive).unwrap()).unwrap();
        envelope["checksum"] = serde_json::Value::String("0".repeat(64));
        fs::write(&paths.positive, serde_json::to_vec(&envelope).unwrap()).unwrap();

        let err = load_pair(&paths).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::ChecksumMismatch(_)));
    }

    #[test]
    fn unknown_version_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        save_generation(&paths, &fitted(true), &fitted(false), None, Utc::now()).unwrap();

        let mut envelope: serde_json::Value =
            serde_json::from_slice(&fs::read(&paths.negative).unwrap()).unwrap();
        envelope["version"] = serde_json::json!(99);
        fs::write(&paths.negative, serde_json::to_vec(&envelope).unwrap()).unwrap();

        let err = load_pair(&paths).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::IncompatibleFormat { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        save_generation(&paths, &fitted(true), &fitted(false), None, Utc::now()).unwrap();
        fs::write(&paths.positive, b"not json").unwrap();

        let err = load_pair(&paths).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::Malformed { .. }));
    }

    #[test]
    fn swapped_files_report_wrong_polarity() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        save_generation(&paths, &fitted(true), &fitted(false), None, Utc::now()).unwrap();
        fs::copy(&paths.negative, &paths.positive).unwrap();

        let err = load_pair(&paths).unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::WrongPolarity {
                found: Polarity::Negative,
                ..
            }
        ));
    }

    #[test]
    fn pipelines_from_different_runs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        let first = Utc::now();
        save_generation(&paths, &fitted(true), &fitted(false), None, first).unwrap();

        let later = first + chrono::Duration::seconds(5);
        write_pipeline(&paths.negative, Polarity::Negative, &fitted(false), later).unwrap();

        let err = load_pair(&paths).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::MismatchedPair));
    }

    #[test]
    fn stale_metrics_are_ignored_and_bootstrap_removes_them() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(&dir);
        let first = Utc::now();
        save_generation(&paths, &fitted(true), &fitted(false), Some(&sample_metrics(first)), first)
            .unwrap();

        let later = first + chrono::Duration::seconds(1);
        assert_eq!(load_metrics(&paths, later).unwrap(), None);

        save_generation(&paths, &fitted(true), &fitted(false), None, later).unwrap();
        assert!(!paths.metrics.exists());
        assert_eq!(load_metrics(&paths, later).unwrap(), None);
    }
}
