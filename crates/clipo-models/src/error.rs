//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid job parameters: {0}")]
    InvalidJobParameters(String),

    #[error("Invalid source locator: {0}")]
    InvalidLocator(String),

    #[error("Unknown value for {field}: {value}")]
    UnknownValue { field: &'static str, value: String },
}

impl ModelError {
    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJobParameters(msg.into())
    }

    pub fn invalid_locator(msg: impl Into<String>) -> Self {
        Self::InvalidLocator(msg.into())
    }

    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            field,
            value: value.into(),
        }
    }
}
