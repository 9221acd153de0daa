//! Caller-supplied field values.

use std::collections::{BTreeMap, BTreeSet};

use crate::{FieldKind, FormError};

/// The values to write into a form.
///
/// Text entries map a field name to its new content; an empty string clears
/// the field, which is different from leaving the name out. Checkbox names go
/// into exactly one of `check` or `uncheck`. Fields not mentioned anywhere are
/// left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct FieldValueMap {
    pub text: BTreeMap<String, String>,
    pub check: BTreeSet<String>,
    pub uncheck: BTreeSet<String>,
}

/// The value a single entry asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredValue {
    Text(String),
    Checked(bool),
}

impl DesiredValue {
    /// The field kind this value can be written to.
    pub fn expected_kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Checked(_) => FieldKind::Checkbox,
        }
    }
}

/// One entry of a [`FieldValueMap`], in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillEntry<'a> {
    pub name: &'a str,
    pub value: DesiredValue,
}

impl FieldValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a text entry.
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(name.into(), value.into());
        self
    }

    /// Add a checkbox name to the check set.
    pub fn with_checked(mut self, name: impl Into<String>) -> Self {
        self.check.insert(name.into());
        self
    }

    /// Add a checkbox name to the uncheck set.
    pub fn with_unchecked(mut self, name: impl Into<String>) -> Self {
        self.uncheck.insert(name.into());
        self
    }

    /// Merge `other` into `self`; entries of `other` win.
    ///
    /// A name moved between collections is removed from the one it left, so
    /// merging never creates an overlap on its own.
    pub fn merge(&mut self, other: FieldValueMap) {
        for (name, value) in other.text {
            self.check.remove(&name);
            self.uncheck.remove(&name);
            self.text.insert(name, value);
        }
        for name in other.check {
            self.text.remove(&name);
            self.uncheck.remove(&name);
            self.check.insert(name);
        }
        for name in other.uncheck {
            self.text.remove(&name);
            self.check.remove(&name);
            self.uncheck.insert(name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.check.is_empty() && self.uncheck.is_empty()
    }

    /// Number of entries across all three collections.
    pub fn len(&self) -> usize {
        self.text.len() + self.check.len() + self.uncheck.len()
    }

    /// Reject names that appear in more than one collection.
    pub fn validate(&self) -> Result<(), FormError> {
        let mut overlaps: BTreeSet<&str> = self
            .check
            .intersection(&self.uncheck)
            .map(String::as_str)
            .collect();
        overlaps.extend(
            self.text
                .keys()
                .filter(|name| self.check.contains(*name) || self.uncheck.contains(*name))
                .map(String::as_str),
        );
        if overlaps.is_empty() {
            Ok(())
        } else {
            let names: Vec<&str> = overlaps.into_iter().collect();
            Err(FormError::InvalidValueMap(format!(
                "names listed more than once: {}",
                names.join(", ")
            )))
        }
    }

    /// Entries in application order: text entries, then checks, then unchecks.
    pub fn entries(&self) -> impl Iterator<Item = FillEntry<'_>> {
        let text = self.text.iter().map(|(name, value)| FillEntry {
            name,
            value: DesiredValue::Text(value.clone()),
        });
        let check = self.check.iter().map(|name| FillEntry {
            name,
            value: DesiredValue::Checked(true),
        });
        let uncheck = self.uncheck.iter().map(|name| FillEntry {
            name,
            value: DesiredValue::Checked(false),
        });
        text.chain(check).chain(uncheck)
    }
}
