//! Error types for the lopdf backend.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`BackendError`]
//! that wraps backend-specific errors and converts them to [`FormError`].

use formfill_core::FormError;
use thiserror::Error;

/// Error type for form backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// The document is encrypted and could not be decrypted.
    #[error("decryption error: {0}")]
    Decrypt(String),

    /// A form object could not be updated.
    #[error("form update error: {0}")]
    Update(String),

    /// Error writing the document.
    #[error("write error: {0}")]
    Write(String),
}

impl From<BackendError> for FormError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => FormError::ParseError(msg),
            BackendError::Decrypt(msg) => FormError::DecryptionFailed(msg),
            BackendError::Update(msg) => FormError::Fill(msg),
            BackendError::Write(msg) => FormError::Serialization(msg),
        }
    }
}
