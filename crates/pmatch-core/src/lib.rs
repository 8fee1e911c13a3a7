//! Shared domain records and configuration for the profile matching workspace.

pub mod app_config;
pub mod config;
pub mod dataset;
pub mod model;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use dataset::{fits_stored_scale, load_dataset, Dataset, RoleDataset, STORED_DECIMALS};
pub use model::{ActualValue, Aspect, Candidate, Criterion, Role, Target};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read dataset file {path}: {source}")]
    DatasetFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dataset file: {0}")]
    DatasetFileParse(#[source] serde_yaml::Error),

    #[error("dataset validation failed: {0}")]
    Validation(String),
}
