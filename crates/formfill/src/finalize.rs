//! Producing the output document.

use formfill_core::FormError;
use formfill_parse::{FormBackend, LopdfBackend};
use tracing::debug;

use crate::document::FormDocument;

/// Regenerate appearances, optionally flatten, and serialize the document.
///
/// Appearance streams are rebuilt for every field written since the form was
/// loaded. Without `flatten` the form stays interactive and viewers are asked
/// to regenerate appearances themselves (`/NeedAppearances`). With `flatten`
/// every widget is drawn into its page and the form is removed, so the
/// document is consumed: there is nothing left to fill.
///
/// # Errors
///
/// [`FormError::Fill`] when the form cannot be updated and
/// [`FormError::Serialization`] when the document cannot be written.
pub fn finalize(doc: FormDocument, flatten: bool) -> Result<Vec<u8>, FormError> {
    let has_form = doc.has_form();
    let mut doc = doc.into_inner();

    let refreshed = LopdfBackend::update_appearances(&mut doc)?;
    debug!(widgets = refreshed, "regenerated appearances");

    if flatten {
        let drawn = LopdfBackend::flatten(&mut doc)?;
        debug!(widgets = drawn, "flattened form");
    } else if has_form {
        LopdfBackend::mark_need_appearances(&mut doc)?;
    }

    Ok(LopdfBackend::save(&mut doc)?)
}
