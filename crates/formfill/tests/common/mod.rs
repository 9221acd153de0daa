//! Shared fixtures for the formfill integration tests.
//!
//! Test PDFs are built programmatically with lopdf.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};

pub const TEXT_FIELDS: [&str; 5] = [
    "engSurname",
    "engName",
    "depEngSurname1",
    "depEngName1",
    "appDate",
];

pub fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<Object> {
    vec![
        Object::Integer(x0),
        Object::Integer(y0),
        Object::Integer(x1),
        Object::Integer(y1),
    ]
}

/// A one-page application form: five text fields, the `preReside` checkbox
/// (on-state `On`), a `district` choice field and the `gender` radio group.
pub fn application_form() -> Vec<u8> {
    application_form_with(|_| {})
}

/// [`application_form`] with the AcroForm dictionary adjusted by `edit`.
pub fn application_form_with(edit: impl FnOnce(&mut Dictionary)) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.6");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let mut fields: Vec<ObjectId> = Vec::new();

    for (i, name) in TEXT_FIELDS.iter().enumerate() {
        let top = 740 - 30 * i as i64;
        fields.push(doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(*name),
            "Rect" => rect(72, top - 18, 300, top),
            "P" => Object::Reference(page_id),
        }));
    }

    let on_id = doc.add_object(Stream::new(
        dictionary! { "BBox" => rect(0, 0, 12, 12) },
        b"0 g 2 2 8 8 re f".to_vec(),
    ));
    let off_id = doc.add_object(Stream::new(
        dictionary! { "BBox" => rect(0, 0, 12, 12) },
        Vec::new(),
    ));
    fields.push(doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("preReside"),
        "Rect" => rect(72, 560, 84, 572),
        "V" => "Off",
        "AS" => "Off",
        "AP" => dictionary! {
            "N" => dictionary! {
                "On" => Object::Reference(on_id),
                "Off" => Object::Reference(off_id),
            },
        },
        "P" => Object::Reference(page_id),
    }));
    fields.push(doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Ch",
        "Ff" => Object::Integer(1 << 17),
        "T" => Object::string_literal("district"),
        "Opt" => vec![
            Object::string_literal("Central"),
            Object::string_literal("Kowloon"),
        ],
        "V" => Object::string_literal("Central"),
        "Rect" => rect(72, 520, 300, 538),
        "P" => Object::Reference(page_id),
    }));
    fields.push(doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "Ff" => Object::Integer(1 << 15),
        "T" => Object::string_literal("gender"),
        "Rect" => rect(72, 490, 84, 502),
        "P" => Object::Reference(page_id),
    }));

    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 14 Tf 72 770 Td (APPLICATION FORM) Tj ET".to_vec(),
    ));
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let annots: Vec<Object> = fields.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => rect(0, 0, 612, 792),
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
            "Annots" => annots,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let mut acroform = dictionary! {
        "Fields" => fields.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    };
    edit(&mut acroform);
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A valid PDF without an interactive form.
pub fn plain_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.6");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => rect(0, 0, 612, 792),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
