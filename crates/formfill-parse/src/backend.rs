//! Form backend trait.
//!
//! Defines the [`FormBackend`] trait that abstracts the PDF object model
//! operations the fill pipeline needs: opening a document, cataloguing its
//! AcroForm, writing values, refreshing appearances, flattening and saving.

use formfill_core::{FieldKind, FieldValue, FormError, FormField};

/// A catalogued field together with the backend handle used to update it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry<H> {
    pub field: FormField,
    pub handle: H,
}

/// Trait abstracting the form operations of a PDF library.
///
/// # Associated Types
///
/// - `Document`: The parsed PDF document representation.
/// - `Handle`: Identifies one terminal field (and its widgets) in a document.
/// - `Error`: Backend-specific error type, convertible to [`FormError`].
///
/// # Usage
///
/// ```ignore
/// let mut doc = MyBackend::open(pdf_bytes)?;
/// let entries = MyBackend::catalog(&doc)?;
/// MyBackend::set_text(&mut doc, &entries[0].handle, "DOE")?;
/// MyBackend::update_appearances(&mut doc)?;
/// let bytes = MyBackend::save(&mut doc)?;
/// ```
pub trait FormBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single terminal field within a document.
    type Handle: Clone;

    /// Backend-specific error type, convertible to [`FormError`].
    type Error: std::error::Error + Into<FormError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a PDF or the document needs a
    /// user password.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Whether the document catalog carries an `/AcroForm` with `/Fields`.
    fn has_form(doc: &Self::Document) -> bool;

    /// List the terminal fields in document order.
    ///
    /// Returns an empty list when the document has no form.
    fn catalog(doc: &Self::Document) -> Result<Vec<CatalogEntry<Self::Handle>>, Self::Error>;

    /// Read the current value of a field as the given kind.
    fn read_value(
        doc: &Self::Document,
        handle: &Self::Handle,
        kind: FieldKind,
    ) -> Result<FieldValue, Self::Error>;

    /// Set the text of a text field.
    fn set_text(
        doc: &mut Self::Document,
        handle: &Self::Handle,
        value: &str,
    ) -> Result<(), Self::Error>;

    /// Set the state of a checkbox.
    fn set_checked(
        doc: &mut Self::Document,
        handle: &Self::Handle,
        checked: bool,
    ) -> Result<(), Self::Error>;

    /// Regenerate appearance streams for every field written since the last
    /// call. Returns the number of widgets refreshed.
    fn update_appearances(doc: &mut Self::Document) -> Result<usize, Self::Error>;

    /// Ask viewers to regenerate appearances themselves (`/NeedAppearances`).
    fn mark_need_appearances(doc: &mut Self::Document) -> Result<(), Self::Error>;

    /// Bake widget appearances into page content and remove the form.
    /// Returns the number of widgets flattened.
    fn flatten(doc: &mut Self::Document) -> Result<usize, Self::Error>;

    /// Serialize the document.
    fn save(doc: &mut Self::Document) -> Result<Vec<u8>, Self::Error>;
}
