//! PDF form field types for AcroForm filling.
//!
//! Provides [`FormField`], [`FieldKind`] and [`FieldValue`] for representing
//! the interactive fields of a form. The kind is decided once, when the form
//! is catalogued, and everything downstream matches on it.

use std::fmt;

/// Field flag bit 1 (`/Ff`): the field may not be changed.
pub const FLAG_READ_ONLY: u32 = 1;
/// Field flag bit 13 (`/Ff`, text fields): multi-line text.
pub const FLAG_MULTILINE: u32 = 1 << 12;
/// Field flag bit 16 (`/Ff`, button fields): radio button.
pub const FLAG_RADIO: u32 = 1 << 15;
/// Field flag bit 17 (`/Ff`, button fields): push button.
pub const FLAG_PUSHBUTTON: u32 = 1 << 16;

/// The fillable kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    /// Text field (`/FT /Tx`).
    Text,
    /// Two-state button (`/FT /Btn` that is neither radio nor push button).
    Checkbox,
    /// Anything else: choice lists, signatures, radio groups, push buttons.
    /// Not fillable.
    Other,
}

impl FieldKind {
    /// Classify a field from its `/FT` name and `/Ff` flags.
    ///
    /// `field_type` is the (possibly inherited) `/FT` value, `None` when the
    /// field tree carries no type at all.
    pub fn classify(field_type: Option<&str>, flags: u32) -> Self {
        match field_type {
            Some("Tx") => Self::Text,
            Some("Btn") if flags & (FLAG_RADIO | FLAG_PUSHBUTTON) == 0 => Self::Checkbox,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Checkbox => write!(f, "Checkbox"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// The current value of a field, shaped by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum FieldValue {
    /// Text content of a text field.
    Text(String),
    /// Check state of a checkbox.
    Checked(bool),
    /// No value present (or the kind has no readable value).
    None,
}

impl FieldValue {
    /// The text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The check state, if this is a checkbox value.
    pub fn as_checked(&self) -> Option<bool> {
        match self {
            Self::Checked(state) => Some(*state),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Checked(true) => write!(f, "checked"),
            Self::Checked(false) => write!(f, "unchecked"),
            Self::None => Ok(()),
        }
    }
}

/// A terminal form field from the document's AcroForm tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormField {
    /// Fully qualified name. Hierarchical fields join partial `/T` names with `.`.
    pub name: String,
    /// Fillable kind.
    pub kind: FieldKind,
    /// The raw `/FT` name (`Tx`, `Btn`, `Ch`, `Sig`), if any.
    pub pdf_type: Option<String>,
    /// Current value.
    pub value: FieldValue,
    /// Field flags from `/Ff` (bitmask, inherited).
    pub flags: u32,
    /// Maximum text length from `/MaxLen`.
    pub max_len: Option<usize>,
    /// The 0-based page index of the first widget, if determinable.
    pub page_index: Option<usize>,
}

impl FormField {
    /// Whether the read-only flag is set.
    pub fn is_read_only(&self) -> bool {
        self.flags & FLAG_READ_ONLY != 0
    }
}

/// Field counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSummary {
    pub text: usize,
    pub checkbox: usize,
    pub other: usize,
}

impl FieldSummary {
    /// Count the fields of a catalog by kind.
    pub fn of(fields: &[FormField]) -> Self {
        fields.iter().fold(Self::default(), |mut acc, field| {
            match field.kind {
                FieldKind::Text => acc.text += 1,
                FieldKind::Checkbox => acc.checkbox += 1,
                FieldKind::Other => acc.other += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.text + self.checkbox + self.other
    }
}
