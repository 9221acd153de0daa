//! formfill-core: Backend-independent data types for AcroForm filling.
//!
//! This crate provides the field model ([`FormField`], [`FieldKind`]), the
//! caller input ([`FieldValueMap`]), the fill outcome ([`FillReport`]) and the
//! error types shared by the rest of formfill-rs. It has no required
//! dependencies; `serde` support is behind the `serde` feature.

pub mod error;
pub mod form_field;
pub mod report;
pub mod values;

pub use error::{FieldError, FormError};
pub use form_field::{
    FLAG_MULTILINE, FLAG_PUSHBUTTON, FLAG_RADIO, FLAG_READ_ONLY, FieldKind, FieldSummary,
    FieldValue, FormField,
};
pub use report::{FieldResult, FillReport, FillSuccess, FillWarning};
pub use values::{DesiredValue, FieldValueMap, FillEntry};
