//! formfill-parse: lopdf backend for the form filling pipeline.
//!
//! This crate owns everything that touches the PDF object model: removing
//! encryption, walking the AcroForm field tree, writing values, regenerating
//! appearance streams, flattening and serialization. It depends on
//! formfill-core for the shared data types.

mod appearance;
pub mod backend;
pub mod decrypt;
pub mod error;
mod flatten;
pub mod lopdf_backend;
pub mod pdf_string;

pub use backend::{CatalogEntry, FormBackend};
pub use decrypt::decrypt_document;
pub use error::BackendError;
pub use formfill_core;
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfField};
