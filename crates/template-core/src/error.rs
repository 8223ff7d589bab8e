//! Template assembly error types.

use thiserror::Error;

/// Errors produced while building or mutating block templates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// Missing or malformed block data from the daemon.
    #[error("Invalid block data: {0}")]
    Validation(String),

    /// Pool configuration cannot be used (bad address, unsupported family).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Zero or malformed difficulty target.
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// A transaction could not be read from the blob.
    #[error("Malformed transaction at byte {offset}: {reason}")]
    MalformedTransaction {
        /// Absolute offset in the buffer where parsing failed.
        offset: usize,
        /// What was being read.
        reason: String,
    },
}

impl TemplateError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        TemplateError::MalformedTransaction {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for template operations.
pub type Result<T> = core::result::Result<T, TemplateError>;
