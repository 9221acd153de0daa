//! Appearance stream generation for text fields and checkboxes.
//!
//! A viewer renders a widget from its `/AP /N` stream, not from `/V`. After a
//! value is written programmatically the stream has to be rebuilt, or the
//! change stays invisible until the field is focused.

use lopdf::{Dictionary, Object, Stream, dictionary};

use crate::error::BackendError;
use crate::lopdf_backend::{acroform, acroform_mut, resolve};
use crate::pdf_string::{escape_literal, to_win_ansi};

/// Used when neither the field nor the AcroForm carries a `/DA`.
pub const DEFAULT_DA: &str = "/Helv 0 Tf 0 g";

/// Inner margin between the widget border and its text.
const PADDING: f32 = 2.0;

/// Parsed `/DA` (default appearance) string.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppearance {
    /// Resource name of the font, without the leading `/`.
    pub font: String,
    /// Font size; `0` means auto-size to the widget.
    pub size: f32,
    /// Colour operator with its operands, e.g. `0 g` or `1 0 0 rg`.
    pub color: String,
}

impl DefaultAppearance {
    pub fn parse(da: &str) -> Self {
        let tokens: Vec<&str> = da.split_whitespace().collect();
        let mut parsed = Self {
            font: "Helv".to_string(),
            size: 0.0,
            color: "0 g".to_string(),
        };
        for (i, token) in tokens.iter().enumerate() {
            match *token {
                "Tf" if i >= 2 => {
                    parsed.font = tokens[i - 2].trim_start_matches('/').to_string();
                    parsed.size = tokens[i - 1].parse().unwrap_or(0.0);
                }
                "g" if i >= 1 => parsed.color = tokens[i - 1..=i].join(" "),
                "rg" if i >= 3 => parsed.color = tokens[i - 3..=i].join(" "),
                "k" if i >= 4 => parsed.color = tokens[i - 4..=i].join(" "),
                _ => {}
            }
        }
        parsed
    }
}

/// Geometry and alignment of a text widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub width: f32,
    pub height: f32,
    /// `/Q`: 0 left, 1 centred, 2 right.
    pub quadding: i64,
    pub multiline: bool,
}

fn auto_font_size(layout: &TextLayout) -> f32 {
    if layout.multiline {
        12.0
    } else {
        ((layout.height - 2.0 * PADDING) * 0.75).clamp(4.0, 12.0)
    }
}

/// Format a number for a content stream: at most two decimals, no trailing zeros.
fn num(value: f32) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Content stream drawing `text` inside a text widget.
pub fn text_content(text: &str, da: &DefaultAppearance, layout: &TextLayout) -> Vec<u8> {
    let mut out = b"/Tx BMC\n".to_vec();
    if text.is_empty() {
        out.extend_from_slice(b"EMC\n");
        return out;
    }

    let size = if da.size > 0.0 {
        da.size
    } else {
        auto_font_size(layout)
    };
    let lines: Vec<String> = if layout.multiline {
        text.lines().map(str::to_string).collect()
    } else {
        vec![text.replace(['\r', '\n'], " ")]
    };
    let leading = size * 1.15;

    out.extend_from_slice(b"q\n");
    out.extend_from_slice(
        format!(
            "{} {} {} {} re W n\n",
            num(PADDING / 2.0),
            num(PADDING / 2.0),
            num(layout.width - PADDING),
            num(layout.height - PADDING)
        )
        .as_bytes(),
    );
    out.extend_from_slice(format!("BT\n/{} {} Tf {}\n", da.font, num(size), da.color).as_bytes());

    let mut y = if layout.multiline {
        layout.height - PADDING - size
    } else {
        ((layout.height - size) / 2.0).max(0.0) + size * 0.22
    };
    let mut previous: Option<(f32, f32)> = None;
    for line in &lines {
        // Helvetica averages roughly half an em per glyph.
        let estimated_width = line.chars().count() as f32 * size * 0.5;
        let x = match layout.quadding {
            1 => (layout.width - estimated_width) / 2.0,
            2 => layout.width - PADDING - estimated_width,
            _ => PADDING,
        }
        .max(PADDING);
        let (dx, dy) = match previous {
            Some((px, py)) => (x - px, y - py),
            None => (x, y),
        };
        out.extend_from_slice(format!("{} {} Td\n", num(dx), num(dy)).as_bytes());
        out.push(b'(');
        out.extend_from_slice(&escape_literal(&to_win_ansi(line)));
        out.extend_from_slice(b") Tj\n");
        previous = Some((x, y));
        y -= leading;
    }
    out.extend_from_slice(b"ET\nQ\nEMC\n");
    out
}

/// Content stream drawing a cross inside a checkbox widget.
pub fn check_content(width: f32, height: f32) -> Vec<u8> {
    let margin = width.min(height) * 0.2;
    let stroke = (width.min(height) * 0.1).max(0.5);
    format!(
        "q\n0 G {} w\n{} {} m {} {} l S\n{} {} m {} {} l S\nQ\n",
        num(stroke),
        num(margin),
        num(margin),
        num(width - margin),
        num(height - margin),
        num(margin),
        num(height - margin),
        num(width - margin),
        num(margin),
    )
    .into_bytes()
}

/// Wrap appearance content in a form XObject of the given size.
pub fn form_xobject(
    width: f32,
    height: f32,
    content: Vec<u8>,
    font: Option<(&str, Object)>,
) -> Stream {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width),
            Object::Real(height),
        ],
    };
    if let Some((name, font)) = font {
        let mut fonts = Dictionary::new();
        fonts.set(name, font);
        dict.set("Resources", dictionary! { "Font" => fonts });
    }
    Stream::new(dict, content)
}

/// Map a `/DA` font resource name to a standard 14 font.
fn standard_base_font(name: &str) -> &'static str {
    match name {
        "Cour" => "Courier",
        "TiRo" => "Times-Roman",
        "HeBo" => "Helvetica-Bold",
        "ZaDb" => "ZapfDingbats",
        _ => "Helvetica",
    }
}

/// Font object registered under `name` in the AcroForm `/DR`, creating a
/// standard font entry when the resources do not define it.
pub(crate) fn ensure_font(doc: &mut lopdf::Document, name: &str) -> Result<Object, BackendError> {
    if let Some(font) = dr_font(doc, name) {
        return Ok(font);
    }
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => standard_base_font(name),
        "Encoding" => "WinAnsiEncoding",
    });
    dr_fonts_mut(doc)?.set(name, Object::Reference(font_id));
    Ok(Object::Reference(font_id))
}

fn dr_font(doc: &lopdf::Document, name: &str) -> Option<Object> {
    let dr = resolve(doc, acroform(doc)?.get(b"DR").ok()?)?.as_dict().ok()?;
    let fonts = resolve(doc, dr.get(b"Font").ok()?)?.as_dict().ok()?;
    fonts.get(name.as_bytes()).ok().cloned()
}

/// Where a sub-dictionary lives: in another object, or inline in its parent.
pub(crate) enum Slot {
    Indirect(lopdf::ObjectId),
    Inline,
}

/// Inspect `parent[key]`, inserting an empty dictionary when absent.
pub(crate) fn slot(parent: &mut Dictionary, key: &str) -> Slot {
    let existing = match parent.get(key.as_bytes()) {
        Ok(Object::Reference(id)) => Some(Slot::Indirect(*id)),
        Ok(Object::Dictionary(_)) => Some(Slot::Inline),
        _ => None,
    };
    existing.unwrap_or_else(|| {
        parent.set(key, Dictionary::new());
        Slot::Inline
    })
}

fn dr_mut(doc: &mut lopdf::Document) -> Result<&mut Dictionary, BackendError> {
    let dr = slot(acroform_mut(doc)?, "DR");
    match dr {
        Slot::Indirect(id) => doc
            .get_dictionary_mut(id)
            .map_err(|e| BackendError::Update(format!("invalid /DR object: {e}"))),
        Slot::Inline => acroform_mut(doc)?
            .get_mut(b"DR")
            .and_then(Object::as_dict_mut)
            .map_err(|e| BackendError::Update(format!("invalid /DR entry: {e}"))),
    }
}

fn dr_fonts_mut(doc: &mut lopdf::Document) -> Result<&mut Dictionary, BackendError> {
    let fonts = slot(dr_mut(doc)?, "Font");
    match fonts {
        Slot::Indirect(id) => doc
            .get_dictionary_mut(id)
            .map_err(|e| BackendError::Update(format!("invalid /DR /Font object: {e}"))),
        Slot::Inline => dr_mut(doc)?
            .get_mut(b"Font")
            .and_then(Object::as_dict_mut)
            .map_err(|e| BackendError::Update(format!("invalid /DR /Font entry: {e}"))),
    }
}
