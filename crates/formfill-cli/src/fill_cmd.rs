use std::path::Path;

use formfill::{FieldValueMap, FillReport, Pipeline, PipelineConfig, RunOutcome, load_value_map};
use tracing::debug;

use crate::cli::{DecryptorArg, ReportFormat};
use crate::shared::{decrypt_backend, report_error, sibling_path};

/// Arguments of the `fill` subcommand, borrowed from the parsed command line.
pub struct FillArgs<'a> {
    pub source: &'a Path,
    pub cache: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub fallback_output: Option<&'a Path>,
    pub values: Option<&'a Path>,
    pub text: &'a [(String, String)],
    pub check: &'a [String],
    pub uncheck: &'a [String],
    pub flatten: bool,
    pub decryptor: DecryptorArg,
    pub format: ReportFormat,
}

pub fn run(args: &FillArgs<'_>) -> Result<(), i32> {
    let values = build_values(args)?;
    debug!(entries = values.len(), "value map assembled");

    let cache = match args.cache {
        Some(path) => path.to_path_buf(),
        None => sibling_path(args.source, "decrypted")?,
    };
    let output = match args.output {
        Some(path) => path.to_path_buf(),
        None => sibling_path(args.source, "filled")?,
    };
    let mut config = PipelineConfig::new(args.source, cache, output)
        .with_values(values)
        .with_flatten(args.flatten);
    if let Some(path) = args.fallback_output {
        config = config.with_fallback_output(path);
    }

    let outcome = Pipeline::new(config, decrypt_backend(args.decryptor))
        .run()
        .map_err(|e| report_error(&e))?;

    match args.format {
        ReportFormat::Text => write_text(&outcome),
        ReportFormat::Json => write_json(&outcome),
    }
}

/// The `--values` file, overridden entry by entry by `--text`/`--check`/`--uncheck`.
fn build_values(args: &FillArgs<'_>) -> Result<FieldValueMap, i32> {
    let mut values = match args.values {
        Some(path) => load_value_map(path).map_err(|e| report_error(&e))?,
        None => FieldValueMap::new(),
    };

    let mut overrides = FieldValueMap::new();
    for (name, value) in args.text {
        overrides.text.insert(name.clone(), value.clone());
    }
    overrides.check.extend(args.check.iter().cloned());
    overrides.uncheck.extend(args.uncheck.iter().cloned());
    overrides.validate().map_err(|e| report_error(&e))?;

    values.merge(overrides);
    Ok(values)
}

fn write_text(outcome: &RunOutcome) -> Result<(), i32> {
    match outcome {
        RunOutcome::Completed { report, path } => {
            print_report(report);
            println!("wrote {}", path.display());
        }
        RunOutcome::Fallback { cause, path } => {
            eprintln!("Warning: form could not be filled: {cause}");
            println!("wrote unfilled copy {}", path.display());
        }
    }
    Ok(())
}

fn print_report(report: &FillReport) {
    for result in &report.results {
        match &result.outcome {
            Ok(success) => println!("ok\t{}\t{}", result.name, success.value),
            Err(err) => println!("failed\t{}\t{err}", result.name),
        }
    }
    for warning in &report.warnings {
        println!("warning\t{warning}");
    }
    println!(
        "filled {}/{} fields",
        report.success_count(),
        report.results.len()
    );
}

fn write_json(outcome: &RunOutcome) -> Result<(), i32> {
    let encode_err = |e: serde_json::Error| {
        eprintln!("Error: failed to encode report: {e}");
        1
    };
    let value = match outcome {
        RunOutcome::Completed { report, path } => serde_json::json!({
            "outcome": "completed",
            "path": path.display().to_string(),
            "report": report_to_json(report).map_err(encode_err)?,
        }),
        RunOutcome::Fallback { cause, path } => serde_json::json!({
            "outcome": "fallback",
            "path": path.display().to_string(),
            "cause": cause.to_string(),
        }),
    };

    let json_str = serde_json::to_string(&value).map_err(encode_err)?;
    println!("{json_str}");
    Ok(())
}

/// The serialized [`FillReport`] with success and failure counts added.
fn report_to_json(report: &FillReport) -> Result<serde_json::Value, serde_json::Error> {
    let mut value = serde_json::to_value(report)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("succeeded".into(), report.success_count().into());
        object.insert("failed".into(), report.failure_count().into());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formfill::{FieldError, FieldKind, FieldResult, FieldValue, FillSuccess};

    fn args<'a>(
        text: &'a [(String, String)],
        check: &'a [String],
        uncheck: &'a [String],
    ) -> FillArgs<'a> {
        FillArgs {
            source: Path::new("ID995A.pdf"),
            cache: None,
            output: None,
            fallback_output: None,
            values: None,
            text,
            check,
            uncheck,
            flatten: false,
            decryptor: DecryptorArg::Builtin,
            format: ReportFormat::Text,
        }
    }

    #[test]
    fn flags_build_value_map() {
        let text = vec![("engSurname".to_string(), "DOE".to_string())];
        let check = vec!["preReside".to_string()];
        let values = build_values(&args(&text, &check, &[])).unwrap();
        assert_eq!(
            values,
            FieldValueMap::new()
                .with_text("engSurname", "DOE")
                .with_checked("preReside")
        );
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        let check = vec!["preReside".to_string()];
        let uncheck = vec!["preReside".to_string()];
        assert_eq!(build_values(&args(&[], &check, &uncheck)), Err(1));
    }

    #[test]
    fn flags_override_values_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        std::fs::write(
            &path,
            r#"{"text": {"engSurname": "SMITH", "engName": "JOHN"}, "check": ["preReside"]}"#,
        )
        .unwrap();

        let text = vec![("engSurname".to_string(), "DOE".to_string())];
        let uncheck = vec!["preReside".to_string()];
        let mut fill_args = args(&text, &[], &uncheck);
        fill_args.values = Some(&path);

        let values = build_values(&fill_args).unwrap();
        assert_eq!(
            values,
            FieldValueMap::new()
                .with_text("engSurname", "DOE")
                .with_text("engName", "JOHN")
                .with_unchecked("preReside")
        );
    }

    #[test]
    fn report_json_shape() {
        let report = FillReport {
            results: vec![
                FieldResult {
                    name: "engSurname".into(),
                    expected: FieldKind::Text,
                    outcome: Ok(FillSuccess {
                        value: FieldValue::Text("DOE".into()),
                    }),
                },
                FieldResult {
                    name: "nonExistentField".into(),
                    expected: FieldKind::Text,
                    outcome: Err(FieldError::NotFound),
                },
            ],
            warnings: Vec::new(),
        };

        let json = report_to_json(&report).unwrap();
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["results"][0]["outcome"]["Ok"]["value"], "DOE");
        assert_eq!(json["results"][1]["outcome"]["Err"]["type"], "NotFound");
        assert_eq!(json["warnings"], serde_json::json!([]));
    }
}
