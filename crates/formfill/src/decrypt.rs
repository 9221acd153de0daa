//! Removing the owner-password restriction from the source PDF.
//!
//! The [`Decryptor`] keeps a decrypted copy on disk and reuses it on later
//! runs. How the copy is produced is left to a [`DecryptBackend`]: the `qpdf`
//! command line tool or lopdf in-process.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use formfill_core::FormError;
use tracing::{debug, info};

/// qpdf exits with 3 when the operation succeeded with warnings.
const QPDF_EXIT_WARNINGS: i32 = 3;

/// Produces an unencrypted copy of a PDF file.
pub trait DecryptBackend {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Decrypt `input` and write the plain copy to `output`.
    fn decrypt_file(&self, input: &Path, output: &Path) -> Result<(), FormError>;
}

impl<B: DecryptBackend + ?Sized> DecryptBackend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decrypt_file(&self, input: &Path, output: &Path) -> Result<(), FormError> {
        (**self).decrypt_file(input, output)
    }
}

impl<B: DecryptBackend + ?Sized> DecryptBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decrypt_file(&self, input: &Path, output: &Path) -> Result<(), FormError> {
        (**self).decrypt_file(input, output)
    }
}

/// Runs `qpdf --decrypt <input> <output>`.
#[derive(Debug, Clone)]
pub struct QpdfBackend {
    program: PathBuf,
}

impl QpdfBackend {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("qpdf"),
        }
    }

    /// Use a specific qpdf executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn install_hint(&self, input: &Path, output: &Path) -> String {
        format!(
            "install qpdf first:\n  macOS:   brew install qpdf\n  Linux:   apt-get install qpdf\n  \
             Windows: https://qpdf.sourceforge.io/\nor decrypt the file manually and retry:\n  \
             {} --decrypt {} {}",
            self.program.display(),
            input.display(),
            output.display()
        )
    }
}

impl Default for QpdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DecryptBackend for QpdfBackend {
    fn name(&self) -> &str {
        "qpdf"
    }

    fn decrypt_file(&self, input: &Path, output: &Path) -> Result<(), FormError> {
        let result = Command::new(&self.program)
            .arg("--decrypt")
            .arg(input)
            .arg(output)
            .output();
        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FormError::DecryptionToolUnavailable {
                    tool: self.program.display().to_string(),
                    hint: self.install_hint(input, output),
                });
            }
            Err(e) => return Err(FormError::IoError(format!("failed to run qpdf: {e}"))),
        };

        match out.status.code() {
            Some(0) => Ok(()),
            Some(QPDF_EXIT_WARNINGS) => {
                debug!(
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "qpdf finished with warnings"
                );
                Ok(())
            }
            code => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                let detail = match (code, stderr.is_empty()) {
                    (_, false) => stderr,
                    (Some(code), true) => format!("qpdf exited with status {code}"),
                    (None, true) => "qpdf was terminated by a signal".to_string(),
                };
                Err(FormError::DecryptionFailed(detail))
            }
        }
    }
}

/// Decrypts in-process with lopdf and the empty user password.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBackend;

impl DecryptBackend for BuiltinBackend {
    fn name(&self) -> &str {
        "builtin"
    }

    fn decrypt_file(&self, input: &Path, output: &Path) -> Result<(), FormError> {
        let bytes = fs::read(input)?;
        let plain = formfill_parse::decrypt_document(&bytes)?;
        fs::write(output, plain)?;
        Ok(())
    }
}

/// Produces the decrypted bytes of the source PDF, caching them on disk.
///
/// An existing cache file is used as-is: it is not compared against the
/// source, and the source does not even have to exist.
#[derive(Debug, Clone)]
pub struct Decryptor<B> {
    source: PathBuf,
    cache: PathBuf,
    backend: B,
}

impl<B: DecryptBackend> Decryptor<B> {
    pub fn new(source: impl Into<PathBuf>, cache: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            source: source.into(),
            cache: cache.into(),
            backend,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn cache(&self) -> &Path {
        &self.cache
    }

    /// Whether a decrypted copy is already on disk.
    pub fn is_cached(&self) -> bool {
        self.cache.is_file()
    }

    /// Return the decrypted bytes, running the backend only on a cache miss.
    ///
    /// # Errors
    ///
    /// [`FormError::MissingInput`] when there is no cache and no source,
    /// any backend error, or [`FormError::IoError`] for cache I/O.
    pub fn decrypt(&self) -> Result<Vec<u8>, FormError> {
        if self.is_cached() {
            info!(cache = %self.cache.display(), "using cached decrypted copy");
            return Ok(fs::read(&self.cache)?);
        }
        if !self.source.is_file() {
            return Err(FormError::MissingInput(self.source.clone()));
        }
        if let Some(parent) = self.cache.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        info!(
            backend = self.backend.name(),
            source = %self.source.display(),
            "decrypting source PDF"
        );
        // Write beside the cache and rename, so a failed run leaves no cache behind.
        let partial = partial_path(&self.cache);
        if let Err(e) = self.backend.decrypt_file(&self.source, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &self.cache)?;
        Ok(fs::read(&self.cache)?)
    }
}

fn partial_path(cache: &Path) -> PathBuf {
    let mut name = cache.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    cache.with_file_name(name)
}
