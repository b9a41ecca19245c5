pub mod app_config;
pub mod bulk_edit;
pub mod config;
pub mod shop;

pub use app_config::{AppConfig, Environment};
pub use bulk_edit::{
    decode_nullable, Batch, ChangeDescriptor, ChangeItem, ChangeType, NewBatch, OperationType,
    ResourceType, NULL_SENTINEL,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use shop::normalize_shop_domain;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unrecognized operation type: {0}")]
    InvalidOperationType(String),

    #[error("unrecognized change type: {0}")]
    InvalidChangeType(String),

    #[error("invalid shop domain \"{domain}\": {reason}")]
    InvalidShopDomain { domain: String, reason: String },

    #[error("{0}")]
    Validation(String),
}
