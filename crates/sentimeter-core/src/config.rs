use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const LOG_LEVEL_VAR: &str = "SENTIMETER_LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Log filter directive from `SENTIMETER_LOG_LEVEL`, defaulting to `info`.
///
/// For binaries whose commands may run without a full configuration.
#[must_use]
pub fn log_level_from_env() -> String {
    log_level_with(|key| std::env::var(key))
}

fn log_level_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup(LOG_LEVEL_VAR).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SENTIMETER_ENV", "development"));
    let bind_addr = parse_addr("SENTIMETER_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = log_level_with(&lookup);

    let db_max_connections = parse_u32("SENTIMETER_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SENTIMETER_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SENTIMETER_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let model_path = PathBuf::from(or_default("SENTIMETER_MODEL_PATH", "data/sentiment_model"));

    let retrain_interval_days = parse_u64("SENTIMETER_RETRAIN_INTERVAL_DAYS", "7")?;
    if retrain_interval_days == 0 {
        return Err(invalid(
            "SENTIMETER_RETRAIN_INTERVAL_DAYS",
            "must be at least 1".to_string(),
        ));
    }

    let test_size = parse_f64("SENTIMETER_TEST_SIZE", "0.2")?;
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(invalid(
            "SENTIMETER_TEST_SIZE",
            format!("{test_size} is outside (0, 1)"),
        ));
    }

    let random_state = parse_u64("SENTIMETER_RANDOM_STATE", "42")?;

    let max_features = parse_usize("SENTIMETER_MAX_FEATURES", "5000")?;
    if max_features == 0 {
        return Err(invalid(
            "SENTIMETER_MAX_FEATURES",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        model_path,
        retrain_interval_days,
        test_size,
        random_state,
        max_features,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
