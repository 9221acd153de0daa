//! Loading field values from JSON.
//!
//! ```json
//! {
//!   "text": { "engSurname": "DOE", "appDate": "31/12/2025" },
//!   "check": ["preReside"],
//!   "uncheck": []
//! }
//! ```
//!
//! Every key is optional.

use std::path::Path;

use formfill_core::{FieldValueMap, FormError};

/// Parse and validate a value map from JSON text.
///
/// # Errors
///
/// [`FormError::InvalidValueMap`] for malformed JSON, unknown keys, or a
/// name listed in more than one collection.
pub fn parse_value_map(json: &str) -> Result<FieldValueMap, FormError> {
    let values: FieldValueMap =
        serde_json::from_str(json).map_err(|e| FormError::InvalidValueMap(e.to_string()))?;
    values.validate()?;
    Ok(values)
}

/// Read a value map from a JSON file.
pub fn load_value_map(path: impl AsRef<Path>) -> Result<FieldValueMap, FormError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| FormError::IoError(format!("{}: {e}", path.display())))?;
    parse_value_map(&json)
}
