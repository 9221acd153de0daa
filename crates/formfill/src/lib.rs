//! formfill: fill owner-password protected PDF forms.
//!
//! This is the public API facade crate for formfill-rs. It re-exports types
//! from formfill-core and uses formfill-parse for the PDF object model.
//!
//! # Architecture
//!
//! - **formfill-core**: Backend-independent data types (fields, value maps, reports, errors)
//! - **formfill-parse**: lopdf backend (decryption, field catalog, appearances, flattening)
//! - **formfill** (this crate): Decryptor, Field Filler, Finalizer and the Pipeline Driver
//!
//! # Example
//!
//! ```ignore
//! use formfill::{FieldValueMap, Pipeline, PipelineConfig, QpdfBackend};
//!
//! let values = FieldValueMap::new()
//!     .with_text("engSurname", "DOE")
//!     .with_checked("preReside");
//! let config = PipelineConfig::new("ID995A.pdf", "decrypted_ID995A.pdf", "filled_ID995A.pdf")
//!     .with_values(values);
//! let outcome = Pipeline::new(config, QpdfBackend::new()).run()?;
//! ```

mod config;
mod decrypt;
mod document;
mod fill;
mod finalize;
mod pipeline;

pub use config::{load_value_map, parse_value_map};
pub use decrypt::{BuiltinBackend, DecryptBackend, Decryptor, QpdfBackend};
pub use document::{Form, FormDocument};
pub use fill::fill;
pub use finalize::finalize;
pub use pipeline::{Pipeline, PipelineConfig, RunOutcome, Stage};

pub use formfill_core;
pub use formfill_core::{
    FieldError, FieldKind, FieldResult, FieldSummary, FieldValue, FieldValueMap, FillReport,
    FillSuccess, FillWarning, FormError, FormField,
};
pub use formfill_parse;
