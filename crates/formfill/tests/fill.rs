//! Integration tests for the field catalog, filler and finalizer.
//!
//! These tests exercise FormDocument → Form → fill → finalize on PDFs built
//! in memory.

mod common;

use common::{TEXT_FIELDS, application_form, plain_pdf};
use formfill::{
    FieldError, FieldKind, FieldSummary, FieldValue, FieldValueMap, FormDocument, FormError, fill,
    finalize,
};

fn reload(bytes: &[u8]) -> FormDocument {
    FormDocument::open(bytes).unwrap()
}

// --- Field catalog ---

#[test]
fn catalog_lists_every_field_in_tree_order() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let form = doc.form().unwrap();
    let names: Vec<&str> = form.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "engSurname",
            "engName",
            "depEngSurname1",
            "depEngName1",
            "appDate",
            "preReside",
            "district",
            "gender",
        ]
    );
    assert_eq!(
        form.summary(),
        FieldSummary {
            text: 5,
            checkbox: 1,
            other: 2,
        }
    );
}

#[test]
fn field_lookup_checks_kind() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let form = doc.form().unwrap();

    assert_eq!(
        form.field("engSurname", FieldKind::Text).unwrap().page_index,
        Some(0)
    );
    assert_eq!(
        form.field("preReside", FieldKind::Text).unwrap_err(),
        FieldError::TypeMismatch {
            expected: FieldKind::Text,
            actual: FieldKind::Checkbox,
        }
    );
    assert_eq!(
        form.field("nonExistentField", FieldKind::Text).unwrap_err(),
        FieldError::NotFound
    );
}

#[test]
fn load_form_rejects_document_without_form() {
    let err = FormDocument::load_form(&plain_pdf()).unwrap_err();
    assert!(matches!(err, FormError::ParseError(_)));

    let mut doc = FormDocument::open(&plain_pdf()).unwrap();
    assert!(!doc.has_form());
    assert!(doc.form().unwrap().fields().is_empty());
}

#[test]
fn load_form_rejects_garbage() {
    let err = FormDocument::load_form(b"%PDF-1.7 truncated").unwrap_err();
    assert!(matches!(err, FormError::ParseError(_)));
}

// --- Filler ---

#[test]
fn fills_text_and_checkbox() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let mut form = doc.form().unwrap();
    let values = FieldValueMap::new()
        .with_text("engSurname", "DOE")
        .with_checked("preReside");

    let report = fill(&mut form, &values);

    assert!(report.is_complete());
    assert_eq!(report.success_count(), 2);
    assert_eq!(form.text("engSurname").unwrap(), "DOE");
    assert!(form.is_checked("preReside").unwrap());
}

#[test]
fn text_reads_back_exactly_as_written() {
    let samples = ["Ã©", "Café", "杜約", "þÿAB", "O'BRIEN (JR)", ""];
    for sample in samples {
        let mut doc = FormDocument::load_form(&application_form()).unwrap();
        let mut form = doc.form().unwrap();
        let report = fill(&mut form, &FieldValueMap::new().with_text("engSurname", sample));

        assert_eq!(
            report.get("engSurname").unwrap().outcome.as_ref().unwrap().value,
            FieldValue::Text(sample.to_string())
        );
        assert_eq!(form.text("engSurname").unwrap(), sample);
        drop(form);

        let mut saved = reload(&finalize(doc, false).unwrap());
        assert_eq!(saved.form().unwrap().text("engSurname").unwrap(), sample);
    }
}

#[test]
fn unknown_field_is_reported_and_rest_applied() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let mut form = doc.form().unwrap();
    let values = FieldValueMap::new()
        .with_text("nonExistentField", "X")
        .with_text("engName", "JOHN");

    let report = fill(&mut form, &values);

    assert_eq!(report.failure_count(), 1);
    assert_eq!(
        report.get("nonExistentField").unwrap().outcome,
        Err(FieldError::NotFound)
    );
    assert_eq!(form.text("engName").unwrap(), "JOHN");
}

#[test]
fn mismatched_kinds_are_reported() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let mut form = doc.form().unwrap();
    let values = FieldValueMap::new()
        .with_text("preReside", "yes")
        .with_checked("engSurname")
        .with_text("district", "Kowloon");

    let report = fill(&mut form, &values);

    assert_eq!(report.failure_count(), 3);
    assert!(
        report
            .failed()
            .all(|r| matches!(r.outcome, Err(FieldError::TypeMismatch { .. })))
    );
    assert!(!form.is_checked("preReside").unwrap());
    assert_eq!(form.text("engSurname").unwrap(), "");
}

#[test]
fn untouched_fields_keep_their_values() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let before: Vec<_> = doc.form().unwrap().fields().to_vec();

    let mut form = doc.form().unwrap();
    fill(&mut form, &FieldValueMap::new().with_text("appDate", "31/12/2025"));
    let after = form.fields().to_vec();

    for (b, a) in before.iter().zip(&after) {
        if a.name == "appDate" {
            assert_eq!(a.value, FieldValue::Text("31/12/2025".into()));
        } else {
            assert_eq!(a, b, "{} changed", a.name);
        }
    }
}

#[test]
fn filling_twice_is_idempotent() {
    let values = FieldValueMap::new()
        .with_text("engSurname", "DOE")
        .with_text("depEngName1", "JANE")
        .with_checked("preReside");

    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let mut form = doc.form().unwrap();
    fill(&mut form, &values);
    let once = form.fields().to_vec();
    let report = fill(&mut form, &values);
    assert!(report.is_complete());
    assert_eq!(form.fields(), once.as_slice());
}

#[test]
fn check_then_uncheck() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let mut form = doc.form().unwrap();
    fill(&mut form, &FieldValueMap::new().with_checked("preReside"));
    assert!(form.is_checked("preReside").unwrap());
    fill(&mut form, &FieldValueMap::new().with_unchecked("preReside"));
    assert!(!form.is_checked("preReside").unwrap());
}

#[test]
fn non_latin_text_is_stored() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    let mut form = doc.form().unwrap();
    fill(&mut form, &FieldValueMap::new().with_text("engName", "陳大文"));
    assert_eq!(form.text("engName").unwrap(), "陳大文");
}

// --- Finalizer ---

#[test]
fn finalize_keeps_values_and_asks_for_appearances() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    {
        let mut form = doc.form().unwrap();
        let values = FieldValueMap::new()
            .with_text("engSurname", "DOE")
            .with_checked("preReside");
        assert!(fill(&mut form, &values).is_complete());
    }
    let bytes = finalize(doc, false).unwrap();

    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    let root = pdf.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let acroform = pdf
        .get_dictionary(root)
        .unwrap()
        .get(b"AcroForm")
        .unwrap()
        .as_dict()
        .unwrap();
    assert_eq!(
        acroform.get(b"NeedAppearances").unwrap(),
        &lopdf::Object::Boolean(true)
    );

    let mut doc = reload(&bytes);
    let form = doc.form().unwrap();
    assert_eq!(form.text("engSurname").unwrap(), "DOE");
    assert!(form.is_checked("preReside").unwrap());
    assert_eq!(form.fields().len(), 8);
}

#[test]
fn finalize_with_flatten_leaves_no_fields() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    {
        let mut form = doc.form().unwrap();
        fill(&mut form, &FieldValueMap::new().with_text("engSurname", "DOE"));
    }
    let bytes = finalize(doc, true).unwrap();

    let mut doc = reload(&bytes);
    assert!(!doc.has_form());
    let form = doc.form().unwrap();
    assert!(form.fields().is_empty());
    for name in TEXT_FIELDS {
        assert_eq!(
            form.field(name, FieldKind::Text).unwrap_err(),
            FieldError::NotFound
        );
    }
}

#[test]
fn flattened_text_is_drawn_into_page_content() {
    let mut doc = FormDocument::load_form(&application_form()).unwrap();
    {
        let mut form = doc.form().unwrap();
        fill(&mut form, &FieldValueMap::new().with_text("engSurname", "DOE"));
    }
    let bytes = finalize(doc, true).unwrap();

    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    let (_, page_id) = pdf.get_pages().into_iter().next().unwrap();
    let content = pdf.get_page_content(page_id).unwrap();
    let content = String::from_utf8_lossy(&content);
    assert!(content.contains("APPLICATION FORM"));
    assert!(content.contains(" Do Q"));

    // The drawn XObject carries the filled value.
    let xobjects = pdf
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"XObject")
        .unwrap()
        .as_dict()
        .unwrap();
    let drawn: Vec<String> = xobjects
        .iter()
        .filter_map(|(_, obj)| obj.as_reference().ok())
        .filter_map(|id| pdf.get_object(id).ok()?.as_stream().ok())
        .map(|stream| String::from_utf8_lossy(&stream.content).into_owned())
        .collect();
    assert!(drawn.iter().any(|c| c.contains("(DOE) Tj")));
}

#[test]
fn finalize_without_form_still_serializes() {
    let doc = FormDocument::open(&plain_pdf()).unwrap();
    let bytes = finalize(doc, false).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
