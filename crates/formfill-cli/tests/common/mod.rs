//! Shared fixtures for the CLI integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::{Object, Stream, dictionary};

pub fn cmd() -> Command {
    Command::cargo_bin("formfill").unwrap()
}

fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<Object> {
    vec![
        Object::Integer(x0),
        Object::Integer(y0),
        Object::Integer(x1),
        Object::Integer(y1),
    ]
}

/// A one-page form with two text fields and the `preReside` checkbox.
pub fn form_pdf() -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.6");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let surname_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("engSurname"),
        "Rect" => rect(72, 700, 300, 718),
        "P" => Object::Reference(page_id),
    });
    let name_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::string_literal("engName"),
        "V" => Object::string_literal("JOHN"),
        "Rect" => rect(72, 670, 300, 688),
        "P" => Object::Reference(page_id),
    });
    let on_id = doc.add_object(Stream::new(
        dictionary! { "BBox" => rect(0, 0, 12, 12) },
        b"0 g 2 2 8 8 re f".to_vec(),
    ));
    let checkbox_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal("preReside"),
        "Rect" => rect(72, 640, 84, 652),
        "V" => "Off",
        "AS" => "Off",
        "AP" => dictionary! {
            "N" => dictionary! { "Yes" => Object::Reference(on_id) },
        },
        "P" => Object::Reference(page_id),
    });
    let fields = vec![
        Object::Reference(surname_id),
        Object::Reference(name_id),
        Object::Reference(checkbox_id),
    ];

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => rect(0, 0, 612, 792),
            "Annots" => fields.clone(),
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
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => dictionary! {
            "Fields" => fields,
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
        },
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
