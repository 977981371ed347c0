//! Markdown evaluation report for the persisted model.

use std::fmt::{self, Write as _};
use std::path::Path;

use chrono::{DateTime, Utc};
use sentimeter_model::artifact::{self, ArtifactPaths};
use sentimeter_model::{ArtifactLoadError, EngineConfig, EvaluationMetrics, PolarityMetrics};

use crate::db::connect;

/// What the report reads from disk: the pair's training stamp and the
/// metrics written by that same run.
#[derive(Debug)]
pub(crate) struct PersistedModel {
    pub trained_at: DateTime<Utc>,
    pub metrics: Option<EvaluationMetrics>,
}

/// Read the persisted pair and its metrics without training anything.
///
/// Returns `Ok(None)` when no artifacts have been written yet.
///
/// # Errors
///
/// Returns [`ArtifactLoadError`] when artifacts exist but are unusable.
pub(crate) fn load_persisted(
    paths: &ArtifactPaths,
) -> Result<Option<PersistedModel>, ArtifactLoadError> {
    let pair = match artifact::load_pair(paths) {
        Ok(pair) => pair,
        Err(ArtifactLoadError::Missing(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let metrics = artifact::load_metrics(paths, pair.trained_at)?;
    Ok(Some(PersistedModel {
        trained_at: pair.trained_at,
        metrics,
    }))
}

/// Overall verdict from the mean F1 of both polarities.
fn assessment(metrics: &EvaluationMetrics) -> &'static str {
    let mean_f1 = (metrics.positive.f1 + metrics.negative.f1) / 2.0;
    if mean_f1 > 0.8 {
        "excellent"
    } else if mean_f1 > 0.6 {
        "good"
    } else {
        "satisfactory"
    }
}

fn write_polarity(out: &mut impl fmt::Write, title: &str, m: &PolarityMetrics) -> fmt::Result {
    let c = &m.confusion;
    writeln!(out, "### {title} Sentiment Model\n")?;
    writeln!(out, "- Precision: {:.4}", m.precision)?;
    writeln!(out, "- Recall: {:.4}", m.recall)?;
    writeln!(out, "- F1-Score: {:.4}", m.f1)?;
    writeln!(out, "- Support: {}\n", m.support)?;
    writeln!(out, "| | Predicted no | Predicted yes |")?;
    writeln!(out, "|---|---|---|")?;
    writeln!(out, "| **Actual no** | {} | {} |", c.tn, c.fp)?;
    writeln!(out, "| **Actual yes** | {} | {} |\n", c.fn_, c.tp)
}

/// Render the report body.
///
/// # Errors
///
/// Propagates formatter errors from the underlying writer.
pub(crate) fn render_report(
    total_examples: i64,
    model: &PersistedModel,
    generated_at: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "# Sentiment Analysis Model Evaluation Report\n")?;
    writeln!(out, "**Generated**: {}", generated_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out, "**Model trained**: {}\n", model.trained_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out, "---\n")?;
    writeln!(out, "## Data Overview\n")?;
    writeln!(out, "- Annotated tweets: {total_examples}")?;

    let Some(metrics) = &model.metrics else {
        writeln!(
            out,
            "\nMetrics not available: the persisted model was trained on the bootstrap pair \
             because too few annotated tweets were stored."
        )?;
        return Ok(out);
    };

    writeln!(out, "- Training set size: {} tweets", metrics.train_size)?;
    writeln!(out, "- Test set size: {} tweets\n", metrics.test_size)?;
    writeln!(out, "## Performance Metrics\n")?;
    write_polarity(&mut out, "Positive", &metrics.positive)?;
    write_polarity(&mut out, "Negative", &metrics.negative)?;
    writeln!(out, "## Conclusion\n")?;
    writeln!(
        out,
        "The current model provides {} performance on the held-out tweets.",
        assessment(metrics)
    )?;
    Ok(out)
}

/// Print or write the report for the persisted generation.
///
/// Never trains: without artifacts it tells the operator to run `retrain`.
///
/// # Errors
///
/// Returns an error if the database is unreachable, the artifacts are
/// unusable, or the output file cannot be written.
pub(crate) async fn run_report(output: Option<&Path>) -> anyhow::Result<()> {
    let (config, pool) = connect().await?;
    let paths = ArtifactPaths::from_base(&EngineConfig::from_app_config(&config).artifact_base);

    let Some(model) = load_persisted(&paths)? else {
        println!(
            "no trained model at {}; run `sentimeter-cli retrain` first",
            paths.positive.display()
        );
        return Ok(());
    };

    let total = sentimeter_db::count_examples(&pool).await?;
    let report = render_report(total, &model, Utc::now())?;

    match output {
        Some(path) => {
            std::fs::write(path, &report)?;
            println!("report written to {}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}
