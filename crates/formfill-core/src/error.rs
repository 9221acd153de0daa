//! Error types for formfill-rs.
//!
//! Provides [`FormError`] for stage-fatal errors that stop (or divert) a
//! pipeline run, and [`FieldError`] for per-field failures that are collected
//! into a [`FillReport`](crate::FillReport) instead of being propagated.

use std::fmt;
use std::path::PathBuf;

use crate::FieldKind;

/// Stage-fatal error types.
///
/// These errors abort the current pipeline stage. Errors raised after the
/// source has been decrypted ([`FormError::Fill`], [`FormError::Serialization`])
/// send the pipeline down its fallback path instead of failing the run.
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    /// The source PDF does not exist.
    MissingInput(PathBuf),
    /// The external decryption tool is not installed on this host.
    DecryptionToolUnavailable {
        /// Name of the tool that could not be started.
        tool: String,
        /// Remediation text (install instructions, manual command line).
        hint: String,
    },
    /// The decryption tool ran and reported failure (wrong password, corrupt file).
    DecryptionFailed(String),
    /// The bytes are not a PDF, need a user password, or carry no interactive form.
    ParseError(String),
    /// The caller-supplied value map violates its contract (overlapping names).
    InvalidValueMap(String),
    /// The form could not be updated at all (structural failure, not a per-field one).
    Fill(String),
    /// Structural corruption detected while writing the output document.
    Serialization(String),
    /// I/O error reading or writing pipeline files.
    IoError(String),
}

impl FormError {
    /// Whether the pipeline may recover from this error by copying the
    /// decrypted source to the output location.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, FormError::Fill(_) | FormError::Serialization(_))
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MissingInput(path) => {
                write!(f, "source PDF not found: {}", path.display())
            }
            FormError::DecryptionToolUnavailable { tool, hint } => {
                write!(f, "decryption tool '{tool}' is not available\n{hint}")
            }
            FormError::DecryptionFailed(msg) => write!(f, "decryption failed: {msg}"),
            FormError::ParseError(msg) => write!(f, "parse error: {msg}"),
            FormError::InvalidValueMap(msg) => write!(f, "invalid value map: {msg}"),
            FormError::Fill(msg) => write!(f, "fill error: {msg}"),
            FormError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            FormError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for FormError {}

impl From<std::io::Error> for FormError {
    fn from(err: std::io::Error) -> Self {
        FormError::IoError(err.to_string())
    }
}

/// Why a single field entry of the value map could not be applied.
///
/// Never fatal: the filler records it and moves on to the next entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum FieldError {
    /// No field with this name exists in the form.
    NotFound,
    /// A field with this name exists but has a different kind.
    TypeMismatch {
        /// Kind implied by the value map entry.
        expected: FieldKind,
        /// Kind found in the document.
        actual: FieldKind,
    },
    /// The field refused the value (read-only, too long, broken object).
    ValueRejected(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::NotFound => write!(f, "field not found"),
            FieldError::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, found {actual}")
            }
            FieldError::ValueRejected(reason) => write!(f, "value rejected: {reason}"),
        }
    }
}

impl std::error::Error for FieldError {}
