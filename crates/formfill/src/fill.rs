//! Applying a [`FieldValueMap`] to a form.

use formfill_core::{
    DesiredValue, FieldError, FieldResult, FieldValueMap, FillReport, FillSuccess, FillWarning,
};
use tracing::{debug, warn};

use crate::document::Form;

/// Write every entry of `values` into `form` and report the outcome per entry.
///
/// Entries are applied in map order: text entries, then the check set, then
/// the uncheck set. Only the named fields are touched. A missing field or a
/// kind mismatch is recorded and the remaining entries are still applied.
/// After each checkbox write the state is read back; a mismatch becomes a
/// [`FillWarning::Verification`] rather than a failure.
pub fn fill(form: &mut Form<'_>, values: &FieldValueMap) -> FillReport {
    let mut report = FillReport::new();

    for entry in values.entries() {
        let expected = entry.value.expected_kind();
        let outcome = match &entry.value {
            DesiredValue::Text(text) => form.set_text(entry.name, text),
            DesiredValue::Checked(checked) => {
                let written = form.set_checked(entry.name, *checked);
                if written.is_ok() {
                    let read_back = form.is_checked(entry.name);
                    if let Some(warning) = verify_checkbox(entry.name, *checked, read_back) {
                        report.warnings.push(warning);
                    }
                }
                written
            }
        };

        match &outcome {
            Ok(value) => debug!(field = entry.name, %value, "field set"),
            Err(e) => warn!(field = entry.name, error = %e, "field not set"),
        }
        report.push(FieldResult {
            name: entry.name.to_string(),
            expected,
            outcome: outcome.map(|value| FillSuccess { value }),
        });
    }

    report
}

/// Compare a checkbox read-back with the state just written.
///
/// The lopdf backend sets `/V` immediately before the read, so through
/// [`fill`] the two agree unless the write silently did not stick.
fn verify_checkbox(
    name: &str,
    expected: bool,
    read_back: Result<bool, FieldError>,
) -> Option<FillWarning> {
    match read_back {
        Ok(actual) if actual != expected => {
            warn!(field = name, expected, actual, "checkbox read-back mismatch");
            Some(FillWarning::Verification {
                name: name.to_string(),
                expected,
                actual,
            })
        }
        Ok(_) => None,
        Err(e) => {
            warn!(field = name, error = %e, "checkbox read-back failed");
            None
        }
    }
}
