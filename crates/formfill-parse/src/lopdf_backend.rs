//! lopdf-based form backend.
//!
//! Implements [`FormBackend`] using the [lopdf](https://crates.io/crates/lopdf)
//! crate. This is the default backend for formfill-rs.

use std::collections::{BTreeMap, BTreeSet};

use formfill_core::{FLAG_MULTILINE, FieldKind, FieldValue, FormField};
use lopdf::{Dictionary, Object, ObjectId, StringFormat};

use crate::appearance::{self, DefaultAppearance};
use crate::backend::{CatalogEntry, FormBackend};
use crate::error::BackendError;
use crate::flatten;
use crate::pdf_string::{decode_pdf_string, encode_pdf_string};

/// Guard against circular `/Kids` and `/Parent` chains.
pub(crate) const MAX_TREE_DEPTH: usize = 64;

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    /// The underlying lopdf document.
    inner: lopdf::Document,
    /// Fields written since the last appearance refresh.
    dirty: BTreeSet<ObjectId>,
}

impl LopdfDocument {
    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    #[cfg(test)]
    pub(crate) fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.inner
    }

    /// Number of fields waiting for an appearance refresh.
    pub fn pending_appearances(&self) -> usize {
        self.dirty.len()
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("objects", &self.inner.objects.len())
            .field("dirty", &self.dirty.len())
            .finish_non_exhaustive()
    }
}

/// A terminal field within a [`LopdfDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LopdfField {
    /// The field dictionary.
    pub object_id: ObjectId,
    /// Widget annotations. Equals `[object_id]` when field and widget are merged.
    pub widgets: Vec<ObjectId>,
}

/// The lopdf-based form backend.
///
/// # Example
///
/// ```ignore
/// use formfill_parse::{FormBackend, LopdfBackend};
///
/// let mut doc = LopdfBackend::open(pdf_bytes)?;
/// for entry in LopdfBackend::catalog(&doc)? {
///     println!("{} {}", entry.field.kind, entry.field.name);
/// }
/// ```
pub struct LopdfBackend;

impl FormBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Handle = LopdfField;
    type Error = BackendError;

    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "document requires a user password; decrypt it before filling".to_string(),
            ));
        }

        Ok(LopdfDocument {
            inner,
            dirty: BTreeSet::new(),
        })
    }

    fn has_form(doc: &Self::Document) -> bool {
        form_field_ids(&doc.inner).is_some()
    }

    fn catalog(doc: &Self::Document) -> Result<Vec<CatalogEntry<LopdfField>>, Self::Error> {
        let Some(field_ids) = form_field_ids(&doc.inner) else {
            return Ok(Vec::new());
        };
        let widget_pages = widget_page_index(&doc.inner);

        let mut walker = FieldWalker {
            doc: &doc.inner,
            widget_pages: &widget_pages,
            visited: BTreeSet::new(),
            entries: Vec::new(),
        };
        for id in field_ids {
            walker.walk(id, None, &Inherited::default(), 0);
        }
        Ok(walker.entries)
    }

    fn read_value(
        doc: &Self::Document,
        handle: &LopdfField,
        kind: FieldKind,
    ) -> Result<FieldValue, Self::Error> {
        let dict = doc
            .inner
            .get_dictionary(handle.object_id)
            .map_err(|e| BackendError::Parse(format!("field object missing: {e}")))?;
        Ok(field_value(&doc.inner, dict, &handle.widgets, kind))
    }

    fn set_text(
        doc: &mut Self::Document,
        handle: &LopdfField,
        value: &str,
    ) -> Result<(), Self::Error> {
        let dict = doc
            .inner
            .get_dictionary_mut(handle.object_id)
            .map_err(|e| BackendError::Update(format!("field object missing: {e}")))?;
        dict.set(
            "V",
            Object::String(encode_pdf_string(value), StringFormat::Literal),
        );
        doc.dirty.insert(handle.object_id);
        Ok(())
    }

    fn set_checked(
        doc: &mut Self::Document,
        handle: &LopdfField,
        checked: bool,
    ) -> Result<(), Self::Error> {
        let states: Vec<(ObjectId, Vec<u8>)> = handle
            .widgets
            .iter()
            .map(|&id| {
                let state = if checked {
                    on_state_name(&doc.inner, id)
                } else {
                    b"Off".to_vec()
                };
                (id, state)
            })
            .collect();

        for (id, state) in &states {
            let widget = doc
                .inner
                .get_dictionary_mut(*id)
                .map_err(|e| BackendError::Update(format!("widget object missing: {e}")))?;
            widget.set("AS", Object::Name(state.clone()));
        }

        let value = match states.first() {
            Some((_, state)) => state.clone(),
            None if checked => b"Yes".to_vec(),
            None => b"Off".to_vec(),
        };
        let field = doc
            .inner
            .get_dictionary_mut(handle.object_id)
            .map_err(|e| BackendError::Update(format!("field object missing: {e}")))?;
        field.set("V", Object::Name(value));
        doc.dirty.insert(handle.object_id);
        Ok(())
    }

    fn update_appearances(doc: &mut Self::Document) -> Result<usize, Self::Error> {
        let dirty = std::mem::take(&mut doc.dirty);
        let mut refreshed = 0;
        for field_id in dirty {
            refreshed += refresh_field(&mut doc.inner, field_id)?;
        }
        Ok(refreshed)
    }

    fn mark_need_appearances(doc: &mut Self::Document) -> Result<(), Self::Error> {
        let acroform = acroform_mut(&mut doc.inner)?;
        acroform.set("NeedAppearances", Object::Boolean(true));
        Ok(())
    }

    fn flatten(doc: &mut Self::Document) -> Result<usize, Self::Error> {
        let widgets: BTreeSet<ObjectId> = Self::catalog(doc)?
            .into_iter()
            .flat_map(|entry| entry.handle.widgets)
            .collect();
        doc.dirty.clear();
        flatten::flatten_widgets(&mut doc.inner, &widgets)
    }

    fn save(doc: &mut Self::Document) -> Result<Vec<u8>, Self::Error> {
        verify_structure(&doc.inner)?;
        let mut buf = Vec::new();
        doc.inner
            .save_to(&mut buf)
            .map_err(|e| BackendError::Write(format!("failed to save PDF: {e}")))?;
        Ok(buf)
    }
}

/// Values inherited down the field tree.
#[derive(Debug, Clone, Default)]
struct Inherited {
    field_type: Option<String>,
    flags: Option<u32>,
}

/// Depth-first walk over `/AcroForm /Fields`, collecting terminal fields.
struct FieldWalker<'a> {
    doc: &'a lopdf::Document,
    widget_pages: &'a BTreeMap<ObjectId, usize>,
    visited: BTreeSet<ObjectId>,
    entries: Vec<CatalogEntry<LopdfField>>,
}

impl FieldWalker<'_> {
    fn walk(
        &mut self,
        field_id: ObjectId,
        parent_name: Option<&str>,
        inherited: &Inherited,
        depth: usize,
    ) {
        if depth >= MAX_TREE_DEPTH || !self.visited.insert(field_id) {
            return;
        }
        let Ok(dict) = self.doc.get_dictionary(field_id) else {
            return;
        };

        let partial_name = string_entry(self.doc, dict, b"T");
        let full_name = match (parent_name, partial_name) {
            (Some(parent), Some(name)) => format!("{parent}.{name}"),
            (Some(parent), None) => parent.to_string(),
            (None, Some(name)) => name,
            (None, None) => String::new(),
        };

        let inherited = Inherited {
            field_type: match dict.get(b"FT") {
                Ok(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
                _ => inherited.field_type.clone(),
            },
            flags: match dict.get(b"Ff") {
                Ok(Object::Integer(n)) => Some(*n as u32),
                _ => inherited.flags,
            },
        };

        let kids = kid_ids(self.doc, dict);
        // Kids carrying /T are child fields; kids without it are widgets.
        let has_child_fields = kids.iter().any(|&kid| {
            self.doc
                .get_dictionary(kid)
                .is_ok_and(|d| d.has(b"T"))
        });
        if has_child_fields {
            for kid in kids {
                self.walk(kid, Some(full_name.as_str()), &inherited, depth + 1);
            }
            return;
        }

        let widgets = if kids.is_empty() {
            vec![field_id]
        } else {
            kids
        };
        let flags = inherited.flags.unwrap_or(0);
        let kind = FieldKind::classify(inherited.field_type.as_deref(), flags);
        let value = field_value(self.doc, dict, &widgets, kind);
        let max_len = match inherited_entry(self.doc, field_id, b"MaxLen") {
            Some(Object::Integer(n)) if *n >= 0 => Some(*n as usize),
            _ => None,
        };
        let page_index = widgets
            .iter()
            .find_map(|w| self.widget_pages.get(w).copied())
            .or_else(|| page_from_p_entry(self.doc, dict));

        self.entries.push(CatalogEntry {
            field: FormField {
                name: full_name,
                kind,
                pdf_type: inherited.field_type,
                value,
                flags,
                max_len,
                page_index,
            },
            handle: LopdfField {
                object_id: field_id,
                widgets,
            },
        });
    }
}

/// Follow an indirect reference once.
pub(crate) fn resolve<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Read a text string or name entry from a dictionary.
fn string_entry(doc: &lopdf::Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Object IDs listed in a dictionary's `/Kids` array.
fn kid_ids(doc: &lopdf::Document, dict: &Dictionary) -> Vec<ObjectId> {
    dict.get(b"Kids")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| kid.as_reference().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// The catalog's object ID.
pub(crate) fn root_id(doc: &lopdf::Document) -> Result<ObjectId, BackendError> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| BackendError::Parse(format!("trailer has no /Root reference: {e}")))
}

pub(crate) fn acroform(doc: &lopdf::Document) -> Option<&Dictionary> {
    let catalog = doc.get_dictionary(root_id(doc).ok()?).ok()?;
    resolve(doc, catalog.get(b"AcroForm").ok()?)?.as_dict().ok()
}

/// Top-level field references, or `None` when there is no interactive form.
fn form_field_ids(doc: &lopdf::Document) -> Option<Vec<ObjectId>> {
    let fields = resolve(doc, acroform(doc)?.get(b"Fields").ok()?)?
        .as_array()
        .ok()?;
    Some(
        fields
            .iter()
            .filter_map(|f| f.as_reference().ok())
            .collect(),
    )
}

/// Mutable access to the `/AcroForm` dictionary, inline or indirect.
pub(crate) fn acroform_mut(doc: &mut lopdf::Document) -> Result<&mut Dictionary, BackendError> {
    let root = root_id(doc)?;
    let indirect = match doc.get_dictionary(root).map(|c| c.get(b"AcroForm")) {
        Ok(Ok(Object::Reference(id))) => Some(*id),
        Ok(Ok(Object::Dictionary(_))) => None,
        _ => return Err(BackendError::Update("document has no /AcroForm".to_string())),
    };
    match indirect {
        Some(id) => doc
            .get_dictionary_mut(id)
            .map_err(|e| BackendError::Update(format!("invalid /AcroForm object: {e}"))),
        None => doc
            .get_dictionary_mut(root)
            .and_then(|catalog| catalog.get_mut(b"AcroForm"))
            .and_then(Object::as_dict_mut)
            .map_err(|e| BackendError::Update(format!("invalid /AcroForm entry: {e}"))),
    }
}

/// Map every annotation on every page to its 0-based page index.
fn widget_page_index(doc: &lopdf::Document) -> BTreeMap<ObjectId, usize> {
    let mut map = BTreeMap::new();
    for (page_num, page_id) in doc.get_pages() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let annots = page
            .get(b"Annots")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_array().ok());
        for annot in annots.into_iter().flatten() {
            if let Ok(id) = annot.as_reference() {
                // lopdf pages are 1-indexed
                map.entry(id).or_insert(page_num as usize - 1);
            }
        }
    }
    map
}

fn page_from_p_entry(doc: &lopdf::Document, dict: &Dictionary) -> Option<usize> {
    let page_ref = dict.get(b"P").ok()?.as_reference().ok()?;
    doc.get_pages()
        .into_iter()
        .find(|(_, id)| *id == page_ref)
        .map(|(num, _)| num as usize - 1)
}

/// Look up an inheritable key on a field, walking `/Parent` links.
fn inherited_entry<'a>(
    doc: &'a lopdf::Document,
    field_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = field_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Decode the value of a field according to its kind.
fn field_value(
    doc: &lopdf::Document,
    dict: &Dictionary,
    widgets: &[ObjectId],
    kind: FieldKind,
) -> FieldValue {
    let v = dict.get(b"V").ok().and_then(|obj| resolve(doc, obj));
    match kind {
        FieldKind::Checkbox => {
            let state = match v {
                Some(Object::Name(name)) => Some(name.as_slice() != b"Off"),
                _ => None,
            };
            let state = state.or_else(|| {
                let widget = doc.get_dictionary(*widgets.first()?).ok()?;
                match widget.get(b"AS") {
                    Ok(Object::Name(name)) => Some(name.as_slice() != b"Off"),
                    _ => None,
                }
            });
            FieldValue::Checked(state.unwrap_or(false))
        }
        FieldKind::Text | FieldKind::Other => match v {
            Some(Object::String(bytes, _)) => FieldValue::Text(decode_pdf_string(bytes)),
            Some(Object::Name(name)) if kind == FieldKind::Other => {
                FieldValue::Text(String::from_utf8_lossy(name).into_owned())
            }
            _ => FieldValue::None,
        },
    }
}

/// Normal-appearance dictionary of a widget, when it holds named states.
fn normal_appearance_states<'a>(
    doc: &'a lopdf::Document,
    widget_id: ObjectId,
) -> Option<&'a Dictionary> {
    let widget = doc.get_dictionary(widget_id).ok()?;
    let ap = resolve(doc, widget.get(b"AP").ok()?)?.as_dict().ok()?;
    match resolve(doc, ap.get(b"N").ok()?)? {
        Object::Dictionary(states) => Some(states),
        _ => None,
    }
}

/// The "on" appearance state of a checkbox widget (`Yes` unless the widget
/// names another one).
fn on_state_name(doc: &lopdf::Document, widget_id: ObjectId) -> Vec<u8> {
    normal_appearance_states(doc, widget_id)
        .and_then(|states| {
            states
                .iter()
                .map(|(key, _)| key)
                .find(|key| key.as_slice() != b"Off")
                .cloned()
        })
        .unwrap_or_else(|| b"Yes".to_vec())
}

fn widget_rect(doc: &lopdf::Document, widget_id: ObjectId) -> Option<[f32; 4]> {
    let widget = doc.get_dictionary(widget_id).ok()?;
    let rect = resolve(doc, widget.get(b"Rect").ok()?)?.as_array().ok()?;
    flatten::rect_from_array(rect)
}

/// Regenerate the appearance of one field. Returns the widgets refreshed.
fn refresh_field(doc: &mut lopdf::Document, field_id: ObjectId) -> Result<usize, BackendError> {
    let field_type = match inherited_entry(doc, field_id, b"FT") {
        Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    };
    let flags = match inherited_entry(doc, field_id, b"Ff") {
        Some(Object::Integer(n)) => *n as u32,
        _ => 0,
    };
    let dict = doc
        .get_dictionary(field_id)
        .map_err(|e| BackendError::Update(format!("field object missing: {e}")))?;
    let kids = kid_ids(doc, dict);
    let widgets = if kids.is_empty() { vec![field_id] } else { kids };

    match FieldKind::classify(field_type.as_deref(), flags) {
        FieldKind::Text => refresh_text(doc, field_id, &widgets, flags),
        FieldKind::Checkbox => refresh_checkbox(doc, field_id, &widgets),
        FieldKind::Other => Ok(0),
    }
}

fn refresh_text(
    doc: &mut lopdf::Document,
    field_id: ObjectId,
    widgets: &[ObjectId],
    flags: u32,
) -> Result<usize, BackendError> {
    let dict = doc
        .get_dictionary(field_id)
        .map_err(|e| BackendError::Update(format!("field object missing: {e}")))?;
    let text = field_value(doc, dict, widgets, FieldKind::Text)
        .as_text()
        .unwrap_or_default()
        .to_string();
    let da = match inherited_entry(doc, field_id, b"DA") {
        Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => acroform(doc).and_then(|form| match form.get(b"DA") {
            Ok(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }),
    };
    let da = DefaultAppearance::parse(da.as_deref().unwrap_or(appearance::DEFAULT_DA));
    let quadding = match inherited_entry(doc, field_id, b"Q")
        .or_else(|| acroform(doc).and_then(|form| form.get(b"Q").ok()))
    {
        Some(Object::Integer(q)) => *q,
        _ => 0,
    };
    let font = appearance::ensure_font(doc, &da.font)?;

    let mut refreshed = 0;
    for &widget_id in widgets {
        let Some(rect) = widget_rect(doc, widget_id) else {
            continue;
        };
        let (width, height) = flatten::rect_size(&rect);
        let layout = appearance::TextLayout {
            width,
            height,
            quadding,
            multiline: flags & FLAG_MULTILINE != 0,
        };
        let content = appearance::text_content(&text, &da, &layout);
        let stream_id = doc.add_object(appearance::form_xobject(
            width,
            height,
            content,
            Some((da.font.as_str(), font.clone())),
        ));
        let widget = doc
            .get_dictionary_mut(widget_id)
            .map_err(|e| BackendError::Update(format!("widget object missing: {e}")))?;
        widget.set(
            "AP",
            lopdf::dictionary! { "N" => Object::Reference(stream_id) },
        );
        refreshed += 1;
    }
    Ok(refreshed)
}

fn refresh_checkbox(
    doc: &mut lopdf::Document,
    field_id: ObjectId,
    widgets: &[ObjectId],
) -> Result<usize, BackendError> {
    let dict = doc
        .get_dictionary(field_id)
        .map_err(|e| BackendError::Update(format!("field object missing: {e}")))?;
    let checked = field_value(doc, dict, widgets, FieldKind::Checkbox)
        .as_checked()
        .unwrap_or(false);

    let mut refreshed = 0;
    for &widget_id in widgets {
        let on = on_state_name(doc, widget_id);
        let has_on_appearance =
            normal_appearance_states(doc, widget_id).is_some_and(|states| states.has(&on));

        if !has_on_appearance {
            let Some(rect) = widget_rect(doc, widget_id) else {
                continue;
            };
            let (width, height) = flatten::rect_size(&rect);
            let on_id = doc.add_object(appearance::form_xobject(
                width,
                height,
                appearance::check_content(width, height),
                None,
            ));
            let off_id = doc.add_object(appearance::form_xobject(width, height, Vec::new(), None));
            let mut states = Dictionary::new();
            states.set(on.clone(), Object::Reference(on_id));
            states.set("Off", Object::Reference(off_id));
            let widget = doc
                .get_dictionary_mut(widget_id)
                .map_err(|e| BackendError::Update(format!("widget object missing: {e}")))?;
            widget.set("AP", lopdf::dictionary! { "N" => states });
        }

        let state = if checked { on } else { b"Off".to_vec() };
        let widget = doc
            .get_dictionary_mut(widget_id)
            .map_err(|e| BackendError::Update(format!("widget object missing: {e}")))?;
        widget.set("AS", Object::Name(state));
        refreshed += 1;
    }
    Ok(refreshed)
}

/// Check the object graph the writer depends on before serializing.
fn verify_structure(doc: &lopdf::Document) -> Result<(), BackendError> {
    let root = root_id(doc).map_err(|e| BackendError::Write(e.to_string()))?;
    let catalog = doc.get_dictionary(root).map_err(|e| {
        BackendError::Write(format!("catalog object {} {} is broken: {e}", root.0, root.1))
    })?;
    let pages = catalog
        .get(b"Pages")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok());
    if pages.is_none() {
        return Err(BackendError::Write(
            "catalog has no valid /Pages tree".to_string(),
        ));
    }
    Ok(())
}
