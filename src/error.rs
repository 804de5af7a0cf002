use crate::config::ConfigError;
use crate::scoring::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("invalid log level: {0}")]
    LogLevel(String),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
