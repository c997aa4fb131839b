//! Error types for protocol conversion.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid content format: {0}")]
    InvalidContent(String),

    #[error("Invalid generation setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
