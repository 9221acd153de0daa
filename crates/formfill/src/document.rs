//! The parsed document and its form view.

use std::collections::BTreeMap;

use formfill_core::{FieldError, FieldKind, FieldSummary, FieldValue, FormError, FormField};
use formfill_parse::{FormBackend, LopdfBackend, LopdfDocument, LopdfField};

/// A decrypted PDF held in memory.
///
/// The document is moved through the pipeline: [`form`](Self::form) borrows
/// it for filling and [`finalize`](crate::finalize) consumes it.
///
/// # Example
///
/// ```ignore
/// let mut doc = FormDocument::load_form(&bytes)?;
/// let mut form = doc.form()?;
/// form.set_text("engSurname", "DOE")?;
/// let out = formfill::finalize(doc, false)?;
/// ```
#[derive(Debug)]
pub struct FormDocument {
    doc: LopdfDocument,
}

impl FormDocument {
    /// Parse PDF bytes. The document may or may not have a form.
    ///
    /// Owner-password documents are opened with the empty user password.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::ParseError`] if the bytes are not a PDF or need a
    /// user password.
    pub fn open(bytes: &[u8]) -> Result<Self, FormError> {
        let doc = LopdfBackend::open(bytes)?;
        Ok(Self { doc })
    }

    /// Parse PDF bytes that must contain an interactive form.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::ParseError`] if the bytes are not a PDF, need a
    /// user password, or the catalog has no `/AcroForm` with a `/Fields` array.
    pub fn load_form(bytes: &[u8]) -> Result<Self, FormError> {
        let doc = Self::open(bytes)?;
        if !doc.has_form() {
            return Err(FormError::ParseError(
                "document has no interactive form (/AcroForm /Fields)".to_string(),
            ));
        }
        Ok(doc)
    }

    /// Whether the catalog carries an interactive form.
    pub fn has_form(&self) -> bool {
        LopdfBackend::has_form(&self.doc)
    }

    /// Snapshot of the terminal fields, in field-tree order.
    pub fn fields(&self) -> Result<Vec<FormField>, FormError> {
        Ok(LopdfBackend::catalog(&self.doc)?
            .into_iter()
            .map(|entry| entry.field)
            .collect())
    }

    /// Build the field catalog and return a view for reading and writing it.
    ///
    /// A flattened document yields a view with no fields.
    pub fn form(&mut self) -> Result<Form<'_>, FormError> {
        let entries = LopdfBackend::catalog(&self.doc)?;
        let mut fields = Vec::with_capacity(entries.len());
        let mut handles = Vec::with_capacity(entries.len());
        let mut index = BTreeMap::new();
        for entry in entries {
            // The first field wins when a malformed tree repeats a name.
            index.entry(entry.field.name.clone()).or_insert(fields.len());
            fields.push(entry.field);
            handles.push(entry.handle);
        }
        Ok(Form {
            doc: self,
            fields,
            handles,
            index,
        })
    }

    pub(crate) fn into_inner(self) -> LopdfDocument {
        self.doc
    }
}

/// The interactive form of a [`FormDocument`].
///
/// Borrows the document mutably, so it cannot outlive it and no other view
/// can exist at the same time.
#[derive(Debug)]
pub struct Form<'doc> {
    doc: &'doc mut FormDocument,
    fields: Vec<FormField>,
    handles: Vec<LopdfField>,
    index: BTreeMap<String, usize>,
}

impl Form<'_> {
    /// All terminal fields, in field-tree order.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Field counts per kind.
    pub fn summary(&self) -> FieldSummary {
        FieldSummary::of(&self.fields)
    }

    /// Look up a field by its fully qualified name, requiring a kind.
    ///
    /// # Errors
    ///
    /// [`FieldError::NotFound`] when no field has this name,
    /// [`FieldError::TypeMismatch`] when it exists with another kind.
    pub fn field(&self, name: &str, expected: FieldKind) -> Result<&FormField, FieldError> {
        self.position(name, expected).map(|i| &self.fields[i])
    }

    fn position(&self, name: &str, expected: FieldKind) -> Result<usize, FieldError> {
        let i = *self.index.get(name).ok_or(FieldError::NotFound)?;
        let actual = self.fields[i].kind;
        if actual != expected {
            return Err(FieldError::TypeMismatch { expected, actual });
        }
        Ok(i)
    }

    /// Write a text field. Returns the value read back from the document.
    ///
    /// # Errors
    ///
    /// Lookup errors as in [`field`](Self::field), and
    /// [`FieldError::ValueRejected`] for read-only fields, values longer than
    /// `/MaxLen`, or a broken field object.
    pub fn set_text(&mut self, name: &str, value: &str) -> Result<FieldValue, FieldError> {
        let i = self.position(name, FieldKind::Text)?;
        let field = &self.fields[i];
        if field.is_read_only() {
            return Err(FieldError::ValueRejected("field is read-only".to_string()));
        }
        if let Some(max_len) = field.max_len {
            let len = value.chars().count();
            if len > max_len {
                return Err(FieldError::ValueRejected(format!(
                    "{len} characters exceed /MaxLen {max_len}"
                )));
            }
        }

        LopdfBackend::set_text(&mut self.doc.doc, &self.handles[i], value)
            .map_err(|e| FieldError::ValueRejected(e.to_string()))?;
        self.refresh(i, FieldKind::Text)
    }

    /// Check or uncheck a checkbox. Returns the value read back from the document.
    ///
    /// # Errors
    ///
    /// Lookup errors as in [`field`](Self::field), and
    /// [`FieldError::ValueRejected`] for read-only fields or a broken widget.
    pub fn set_checked(&mut self, name: &str, checked: bool) -> Result<FieldValue, FieldError> {
        let i = self.position(name, FieldKind::Checkbox)?;
        if self.fields[i].is_read_only() {
            return Err(FieldError::ValueRejected("field is read-only".to_string()));
        }

        LopdfBackend::set_checked(&mut self.doc.doc, &self.handles[i], checked)
            .map_err(|e| FieldError::ValueRejected(e.to_string()))?;
        self.refresh(i, FieldKind::Checkbox)
    }

    /// Read a checkbox state from the document (not from the catalog snapshot).
    pub fn is_checked(&self, name: &str) -> Result<bool, FieldError> {
        let i = self.position(name, FieldKind::Checkbox)?;
        let value = LopdfBackend::read_value(&self.doc.doc, &self.handles[i], FieldKind::Checkbox)
            .map_err(|e| FieldError::ValueRejected(e.to_string()))?;
        Ok(value.as_checked().unwrap_or(false))
    }

    /// Read a text field from the document. An unset field reads as `""`.
    pub fn text(&self, name: &str) -> Result<String, FieldError> {
        let i = self.position(name, FieldKind::Text)?;
        let value = LopdfBackend::read_value(&self.doc.doc, &self.handles[i], FieldKind::Text)
            .map_err(|e| FieldError::ValueRejected(e.to_string()))?;
        Ok(value.as_text().unwrap_or_default().to_string())
    }

    /// Number of written fields whose appearance has not been regenerated yet.
    pub fn pending_appearances(&self) -> usize {
        self.doc.doc.pending_appearances()
    }

    fn refresh(&mut self, i: usize, kind: FieldKind) -> Result<FieldValue, FieldError> {
        let value = LopdfBackend::read_value(&self.doc.doc, &self.handles[i], kind)
            .map_err(|e| FieldError::ValueRejected(e.to_string()))?;
        self.fields[i].value = value.clone();
        Ok(value)
    }
}
