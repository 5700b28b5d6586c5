use thiserror::Error;

use crate::types::TxId;

/// Errors raised by the inventory engine.
///
/// [`EngineError::Value`] signals a malformed transaction; the Portfolio is
/// guaranteed untouched. [`EngineError::Inconsistent`] signals a well-formed
/// transaction the current Portfolio state cannot satisfy (missing pocket,
/// sign conflict, tolerance breach); the Portfolio is likewise untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Value(String),

    #[error("transaction {uniqueid} inconsistent: {message}")]
    Inconsistent { uniqueid: TxId, message: String },

    #[error("unknown transaction variant")]
    UnknownVariant,
}

impl EngineError {
    pub(crate) fn inconsistent(uniqueid: &TxId, message: impl Into<String>) -> Self {
        EngineError::Inconsistent {
            uniqueid: uniqueid.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        EngineError::Value(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
