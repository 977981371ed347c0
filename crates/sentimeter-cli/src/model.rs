//! Commands that drive the scoring engine directly against the database.

use std::sync::Arc;

use sentimeter_core::{ExampleStore, LabeledExample};
use sentimeter_db::PgExampleStore;
use sentimeter_model::{EngineConfig, ScoringEngine, TrainOutcome};

use crate::db::connect;
use crate::demo::category;

async fn build_engine() -> anyhow::Result<(Arc<ScoringEngine>, Arc<PgExampleStore>)> {
    let (config, pool) = connect().await?;
    sentimeter_db::run_migrations(&pool).await?;
    let store = Arc::new(PgExampleStore::new(pool));
    let dyn_store: Arc<dyn ExampleStore> = store.clone();
    let engine = ScoringEngine::new(EngineConfig::from_app_config(&config), dyn_store);
    Ok((engine, store))
}

/// Append one annotation to the store.
///
/// # Errors
///
/// Returns an error if the store cannot be reached.
pub(crate) async fn run_annotate(text: String, positive: bool, negative: bool) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("tweet text must not be empty");
    }
    let (_, store) = build_engine().await?;
    let example = LabeledExample::new(text, positive, negative);
    store.append(&example).await?;
    println!(
        "stored annotation (positive: {}, negative: {})",
        example.positive, example.negative
    );
    Ok(())
}

/// Retrain both pipelines and print the outcome.
///
/// # Errors
///
/// Returns an error if the store is unreachable or training fails.
pub(crate) async fn run_retrain() -> anyhow::Result<()> {
    let (engine, _) = build_engine().await?;
    println!("starting model retraining...");

    match engine.retrain().await? {
        TrainOutcome::Evaluated(metrics) => {
            println!(
                "trained on {} tweets, evaluated on {}",
                metrics.train_size, metrics.test_size
            );
            println!("{:<10}{:<12}{:<10}F1", "MODEL", "PRECISION", "RECALL");
            for (label, m) in [("positive", &metrics.positive), ("negative", &metrics.negative)] {
                println!(
                    "{:<10}{:<12.4}{:<10.4}{:.4}",
                    label, m.precision, m.recall, m.f1
                );
            }
        }
        TrainOutcome::Bootstrap => {
            println!("fewer than 10 annotated tweets; trained the bootstrap model without evaluation");
        }
        TrainOutcome::Coalesced => println!("joined a training run already in progress"),
    }

    println!("model retraining completed");
    Ok(())
}

/// Score tweets in-process.
///
/// # Errors
///
/// Returns an error if no model generation can be loaded or trained.
pub(crate) async fn run_analyze(texts: &[String]) -> anyhow::Result<()> {
    let (engine, _) = build_engine().await?;
    let scores = engine.score(texts).await?;

    println!("{:<10}{:<16}TWEET", "SCORE", "SENTIMENT");
    for (text, score) in texts.iter().zip(scores) {
        println!("{score:<10.4}{:<16}{text}", category(score));
    }
    Ok(())
}
