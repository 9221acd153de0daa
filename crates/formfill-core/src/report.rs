//! Per-field outcomes of a fill pass.
//!
//! Partial success is the normal case: a [`FillReport`] records every entry
//! of the value map with either a [`FillSuccess`] or a [`FieldError`], plus
//! any non-fatal [`FillWarning`]s raised while verifying writes.

use std::fmt;

use crate::{FieldError, FieldKind, FieldValue};

/// What was written into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillSuccess {
    /// The value the field holds after the write.
    pub value: FieldValue,
}

/// Outcome for a single entry of the value map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldResult {
    pub name: String,
    /// The kind implied by the entry's value.
    pub expected: FieldKind,
    pub outcome: Result<FillSuccess, FieldError>,
}

impl FieldResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// A non-fatal problem noticed after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum FillWarning {
    /// A checkbox read back a different state than the one just set.
    Verification {
        name: String,
        expected: bool,
        actual: bool,
    },
}

impl fmt::Display for FillWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillWarning::Verification {
                name,
                expected,
                actual,
            } => write!(
                f,
                "checkbox '{name}' reads back {actual} after being set to {expected}"
            ),
        }
    }
}

/// Aggregate result of filling a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillReport {
    pub results: Vec<FieldResult>,
    pub warnings: Vec<FillWarning>,
}

impl FillReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: FieldResult) {
        self.results.push(result);
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &FieldResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FieldResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// True when every entry was applied and verified.
    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0 && self.warnings.is_empty()
    }

    /// Look up the result for a field name.
    pub fn get(&self, name: &str) -> Option<&FieldResult> {
        self.results.iter().find(|r| r.name == name)
    }
}
