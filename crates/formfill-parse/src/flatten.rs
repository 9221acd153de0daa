//! Form flattening.
//!
//! Each widget's normal appearance is drawn into its page's content stream
//! as a form XObject, the widget annotation is removed from `/Annots`, and the
//! `/AcroForm` dictionary is dropped from the catalog. The result has the
//! look of the filled form with no interactive fields left.

use std::collections::BTreeSet;

use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};

use crate::appearance::{Slot, slot};
use crate::error::BackendError;
use crate::lopdf_backend::{MAX_TREE_DEPTH, resolve, root_id};

/// Annotation flag bit for hidden annotations.
const ANNOT_HIDDEN: i64 = 1 << 1;

/// Read a `[x0 y0 x1 y1]` rectangle, normalized so `x0 <= x1` and `y0 <= y1`.
pub fn rect_from_array(values: &[Object]) -> Option<[f32; 4]> {
    if values.len() != 4 {
        return None;
    }
    let mut n = [0.0f32; 4];
    for (slot, value) in n.iter_mut().zip(values) {
        *slot = match value {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            _ => return None,
        };
    }
    Some([n[0].min(n[2]), n[1].min(n[3]), n[0].max(n[2]), n[1].max(n[3])])
}

/// Width and height of a normalized rectangle.
pub fn rect_size(rect: &[f32; 4]) -> (f32, f32) {
    (rect[2] - rect[0], rect[3] - rect[1])
}

/// A widget appearance placed on a page.
struct Placement {
    stream_id: ObjectId,
    /// Widget width and height.
    size: (f32, f32),
    /// `a 0 0 d e f` mapping the appearance BBox onto the widget Rect.
    matrix: [f32; 4],
}

/// Flatten the given widget annotations into page content.
///
/// Widgets that are hidden or have no usable appearance are removed without
/// being drawn. Returns the number of widgets drawn.
pub(crate) fn flatten_widgets(
    doc: &mut lopdf::Document,
    widgets: &BTreeSet<ObjectId>,
) -> Result<usize, BackendError> {
    let mut drawn = 0;
    let mut next_name = 0usize;

    for (_page_num, page_id) in doc.get_pages() {
        let annots = page_annots(doc, page_id);
        let (on_page, remaining): (Vec<Object>, Vec<Object>) = annots
            .into_iter()
            .partition(|a| a.as_reference().is_ok_and(|id| widgets.contains(&id)));
        if on_page.is_empty() {
            continue;
        }

        let placements: Vec<Placement> = on_page
            .iter()
            .filter_map(|a| a.as_reference().ok())
            .filter_map(|id| placement(doc, id))
            .collect();
        for placement in &placements {
            normalize_xobject(doc, placement.stream_id, placement.size);
        }

        let mut ops = String::new();
        if !placements.is_empty() {
            let xobjects = page_xobjects_mut(doc, page_id)?;
            for placement in &placements {
                let name = loop {
                    next_name += 1;
                    let candidate = format!("Flat{next_name}");
                    if !xobjects.has(candidate.as_bytes()) {
                        break candidate;
                    }
                };
                xobjects.set(name.as_str(), Object::Reference(placement.stream_id));
                let [a, d, e, f] = placement.matrix;
                ops.push_str(&format!("q {a} 0 0 {d} {e} {f} cm /{name} Do Q\n"));
            }
            append_content(doc, page_id, ops.into_bytes())?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            page = _page_num,
            drawn = placements.len(),
            removed = on_page.len(),
            "flattened widgets"
        );
        drawn += placements.len();

        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|e| BackendError::Update(format!("page object missing: {e}")))?;
        if remaining.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", remaining);
        }
    }

    let root = root_id(doc)?;
    doc.get_dictionary_mut(root)
        .map_err(|e| BackendError::Update(format!("catalog object missing: {e}")))?
        .remove(b"AcroForm");
    doc.prune_objects();
    Ok(drawn)
}

/// References listed in a page's `/Annots`, inline or indirect.
fn page_annots(doc: &lopdf::Document, page_id: ObjectId) -> Vec<Object> {
    doc.get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .cloned()
        .unwrap_or_default()
}

/// Where to draw a widget, or `None` when it is hidden or has nothing to draw.
fn placement(doc: &lopdf::Document, widget_id: ObjectId) -> Option<Placement> {
    let widget = doc.get_dictionary(widget_id).ok()?;
    if let Ok(Object::Integer(flags)) = widget.get(b"F") {
        if flags & ANNOT_HIDDEN != 0 {
            return None;
        }
    }
    let rect = rect_from_array(resolve(doc, widget.get(b"Rect").ok()?)?.as_array().ok()?)?;
    let stream_id = appearance_stream(doc, widget)?;
    let stream = match doc.get_object(stream_id).ok()? {
        Object::Stream(stream) => stream,
        _ => return None,
    };

    let (width, height) = rect_size(&rect);
    let bbox = stream
        .dict
        .get(b"BBox")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .and_then(|values| rect_from_array(values))
        .unwrap_or([0.0, 0.0, width, height]);
    let (bbox_width, bbox_height) = rect_size(&bbox);
    let sx = if bbox_width > 0.0 { width / bbox_width } else { 1.0 };
    let sy = if bbox_height > 0.0 { height / bbox_height } else { 1.0 };

    Some(Placement {
        stream_id,
        size: (width, height),
        matrix: [sx, sy, rect[0] - bbox[0] * sx, rect[1] - bbox[1] * sy],
    })
}

/// The normal appearance stream matching the widget's `/AS` state.
fn appearance_stream(doc: &lopdf::Document, widget: &Dictionary) -> Option<ObjectId> {
    let ap = resolve(doc, widget.get(b"AP").ok()?)?.as_dict().ok()?;
    match ap.get(b"N").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(*id),
            Object::Dictionary(states) => state_stream(widget, states),
            _ => None,
        },
        Object::Dictionary(states) => state_stream(widget, states),
        _ => None,
    }
}

fn state_stream(widget: &Dictionary, states: &Dictionary) -> Option<ObjectId> {
    let Ok(Object::Name(state)) = widget.get(b"AS") else {
        return None;
    };
    states.get(state).ok()?.as_reference().ok()
}

/// Make sure an appearance stream can be painted with `Do`. A missing BBox
/// defaults to the widget size.
fn normalize_xobject(
    doc: &mut lopdf::Document,
    stream_id: ObjectId,
    (width, height): (f32, f32),
) {
    let Ok(Object::Stream(stream)) = doc.get_object_mut(stream_id) else {
        return;
    };
    stream.dict.set("Type", "XObject");
    stream.dict.set("Subtype", "Form");
    if !stream.dict.has(b"BBox") {
        stream.dict.set(
            "BBox",
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
        );
    }
}

/// `/Resources` inherited from an ancestor `/Pages` node.
fn inherited_resources(doc: &lopdf::Document, page_id: ObjectId) -> Option<Dictionary> {
    let page = doc.get_dictionary(page_id).ok()?;
    let mut current = page.get(b"Parent").ok()?.as_reference().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(current).ok()?;
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(doc, resources)?.as_dict().ok().cloned();
        }
        current = node.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn page_resources_mut(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
) -> Result<&mut Dictionary, BackendError> {
    let page_err = |e: lopdf::Error| BackendError::Update(format!("page object missing: {e}"));
    if !doc.get_dictionary(page_id).map_err(page_err)?.has(b"Resources") {
        let inherited = inherited_resources(doc, page_id).unwrap_or_default();
        doc.get_dictionary_mut(page_id)
            .map_err(page_err)?
            .set("Resources", inherited);
    }
    let resources = slot(doc.get_dictionary_mut(page_id).map_err(page_err)?, "Resources");
    match resources {
        Slot::Indirect(id) => doc
            .get_dictionary_mut(id)
            .map_err(|e| BackendError::Update(format!("invalid /Resources object: {e}"))),
        Slot::Inline => doc
            .get_dictionary_mut(page_id)
            .and_then(|page| page.get_mut(b"Resources"))
            .and_then(Object::as_dict_mut)
            .map_err(|e| BackendError::Update(format!("invalid /Resources entry: {e}"))),
    }
}

fn page_xobjects_mut(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
) -> Result<&mut Dictionary, BackendError> {
    let xobjects = slot(page_resources_mut(doc, page_id)?, "XObject");
    match xobjects {
        Slot::Indirect(id) => doc
            .get_dictionary_mut(id)
            .map_err(|e| BackendError::Update(format!("invalid /XObject object: {e}"))),
        Slot::Inline => page_resources_mut(doc, page_id)?
            .get_mut(b"XObject")
            .and_then(Object::as_dict_mut)
            .map_err(|e| BackendError::Update(format!("invalid /XObject entry: {e}"))),
    }
}

/// Wrap the existing page content in `q`/`Q` and append `ops` after it.
fn append_content(
    doc: &mut lopdf::Document,
    page_id: ObjectId,
    ops: Vec<u8>,
) -> Result<(), BackendError> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| BackendError::Update(format!("page object missing: {e}")))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(parts)) => parts.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(parts)) => parts.clone(),
            _ => Vec::new(),
        }
    };

    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let mut close = b"Q\n".to_vec();
    close.extend_from_slice(&ops);
    let close_id = doc.add_object(Stream::new(dictionary! {}, close));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));
    doc.get_dictionary_mut(page_id)
        .map_err(|e| BackendError::Update(format!("page object missing: {e}")))?
        .set("Contents", contents);
    Ok(())
}
