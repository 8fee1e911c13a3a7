use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
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

    let database_url = lookup("DATABASE_URL").ok().filter(|url| !url.is_empty());
    let env = parse_environment(&or_default("PMATCH_ENV", "development"))?;
    let log_level = or_default("PMATCH_LOG_LEVEL", "info");
    let dataset_path = PathBuf::from(or_default("PMATCH_DATASET_PATH", "./config/dataset.yaml"));

    let db_max_connections = parse_u32("PMATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PMATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PMATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(invalid(
            "PMATCH_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds PMATCH_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }

    let weight_sum_tolerance = or_default("PMATCH_WEIGHT_SUM_TOLERANCE", "0.01")
        .parse::<f64>()
        .map_err(|e| invalid("PMATCH_WEIGHT_SUM_TOLERANCE", e.to_string()))?;
    if !weight_sum_tolerance.is_finite() || weight_sum_tolerance < 0.0 {
        return Err(invalid(
            "PMATCH_WEIGHT_SUM_TOLERANCE",
            "must be a finite, non-negative number".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        dataset_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        weight_sum_tolerance,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PMATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
