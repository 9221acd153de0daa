use std::path::{Path, PathBuf};

use formfill::{BuiltinBackend, DecryptBackend, FormError, QpdfBackend};

use crate::cli::DecryptorArg;

/// Print a pipeline error to stderr and return the process exit code.
pub fn report_error(err: &FormError) -> i32 {
    eprintln!("Error: {err}");
    1
}

/// The decryption backend selected on the command line.
pub fn decrypt_backend(arg: DecryptorArg) -> Box<dyn DecryptBackend> {
    match arg {
        DecryptorArg::Qpdf => Box::new(QpdfBackend::new()),
        DecryptorArg::Builtin => Box::new(BuiltinBackend),
    }
}

/// `dir/<prefix>_<name>` for a source at `dir/<name>`.
///
/// Returns `Err(1)` with a message printed to stderr if `source` has no file name.
pub fn sibling_path(source: &Path, prefix: &str) -> Result<PathBuf, i32> {
    match source.file_name() {
        Some(name) => Ok(source.with_file_name(format!("{prefix}_{}", name.to_string_lossy()))),
        None => {
            eprintln!("Error: source path has no file name: {}", source.display());
            Err(1)
        }
    }
}

/// Escape a string for CSV output.
///
/// If the text contains commas, double quotes, or newlines, wraps it in
/// double quotes and escapes any internal double quotes by doubling them.
pub fn csv_escape(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
