use std::path::Path;

use formfill::{FieldSummary, FormDocument, FormField};

use crate::cli::OutputFormat;
use crate::shared::{csv_escape, report_error};

pub fn run(file: &Path, format: OutputFormat, limit: Option<usize>) -> Result<(), i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    let bytes = std::fs::read(file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", file.display());
        1
    })?;

    let doc = FormDocument::load_form(&bytes).map_err(|e| report_error(&e))?;
    let fields = doc.fields().map_err(|e| report_error(&e))?;
    let summary = FieldSummary::of(&fields);
    let shown = &fields[..limit.unwrap_or(fields.len()).min(fields.len())];

    match format {
        OutputFormat::Text => write_text(shown, &summary),
        OutputFormat::Json => write_json(shown, &summary),
        OutputFormat::Csv => write_csv(shown),
    }
}

fn page_label(field: &FormField) -> String {
    field
        .page_index
        .map(|idx| (idx + 1).to_string())
        .unwrap_or_default()
}

fn write_text(fields: &[FormField], summary: &FieldSummary) -> Result<(), i32> {
    println!("page\tname\tkind\ttype\tvalue\tflags");
    for field in fields {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            page_label(field),
            field.name,
            field.kind,
            field.pdf_type.as_deref().unwrap_or(""),
            field.value,
            field.flags,
        );
    }
    println!(
        "{} fields: {} text, {} checkbox, {} other",
        summary.total(),
        summary.text,
        summary.checkbox,
        summary.other
    );
    Ok(())
}

fn field_to_json(field: &FormField) -> serde_json::Value {
    serde_json::json!({
        "page": field.page_index.map(|idx| idx + 1),
        "name": field.name,
        "kind": field.kind.to_string(),
        "type": field.pdf_type,
        "value": field.value.to_string(),
        "flags": field.flags,
        "max_len": field.max_len,
        "read_only": field.is_read_only(),
    })
}

fn write_json(fields: &[FormField], summary: &FieldSummary) -> Result<(), i32> {
    let value = serde_json::json!({
        "fields": fields.iter().map(field_to_json).collect::<Vec<_>>(),
        "summary": {
            "text": summary.text,
            "checkbox": summary.checkbox,
            "other": summary.other,
            "total": summary.total(),
        },
    });

    let json_str = serde_json::to_string(&value).map_err(|e| {
        eprintln!("Error: failed to encode fields: {e}");
        1
    })?;
    println!("{json_str}");
    Ok(())
}

fn write_csv(fields: &[FormField]) -> Result<(), i32> {
    println!("page,name,kind,type,value,flags");
    for field in fields {
        println!(
            "{},{},{},{},{},{}",
            page_label(field),
            csv_escape(&field.name),
            field.kind,
            field.pdf_type.as_deref().unwrap_or(""),
            csv_escape(&field.value.to_string()),
            field.flags,
        );
    }
    Ok(())
}
