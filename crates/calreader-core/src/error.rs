use thiserror::Error;

/// Core-level errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimeZone(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
