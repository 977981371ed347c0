//! Shared types and configuration for sentimeter.
//!
//! Holds the labeled-example domain type, the [`ExampleStore`] seam the
//! scoring engine trains from, and the env-driven [`AppConfig`].

pub mod app_config;
pub mod config;
pub mod example;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, log_level_from_env};
pub use example::{
    sample_examples, ExampleStore, InMemoryExampleStore, LabeledExample, StoreError,
    SAMPLE_EXAMPLES,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
