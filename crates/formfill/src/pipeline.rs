//! The end-to-end run: decrypt, load, fill, finalize, with a plain-copy fallback.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use formfill_core::{FieldValueMap, FillReport, FormError};
use tracing::{info, warn};

use crate::decrypt::{DecryptBackend, Decryptor};
use crate::document::FormDocument;
use crate::fill::fill;
use crate::finalize::finalize;

/// Everything a run needs. There is no process-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// The encrypted source PDF.
    pub source: PathBuf,
    /// Where the decrypted copy is cached between runs.
    pub decrypted_cache: PathBuf,
    /// Where the filled document is written.
    pub output: PathBuf,
    /// Where the plain decrypted copy goes when filling fails. Defaults to `output`.
    pub fallback_output: Option<PathBuf>,
    pub flatten: bool,
    pub values: FieldValueMap,
}

impl PipelineConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        decrypted_cache: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            decrypted_cache: decrypted_cache.into(),
            output: output.into(),
            fallback_output: None,
            flatten: false,
            values: FieldValueMap::default(),
        }
    }

    pub fn with_values(mut self, values: FieldValueMap) -> Self {
        self.values = values;
        self
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn with_fallback_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_output = Some(path.into());
        self
    }

    /// The path the fallback copy is written to.
    pub fn fallback_path(&self) -> &Path {
        self.fallback_output.as_deref().unwrap_or(&self.output)
    }
}

/// Pipeline states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    Decrypted,
    FormLoaded,
    Filled,
    Finalized,
    /// Filling or finalizing failed and the decrypted copy was written instead.
    Fallback,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Decrypted => "decrypted",
            Stage::FormLoaded => "form-loaded",
            Stage::Filled => "filled",
            Stage::Finalized => "finalized",
            Stage::Fallback => "fallback",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a run ended when it did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The filled document was written to `path`.
    Completed { report: FillReport, path: PathBuf },
    /// Filling or finalizing failed with `cause`; the decrypted, unfilled
    /// document was copied to `path`.
    Fallback { cause: FormError, path: PathBuf },
}

impl RunOutcome {
    /// The last stage before [`Stage::Done`].
    pub fn stage(&self) -> Stage {
        match self {
            RunOutcome::Completed { .. } => Stage::Finalized,
            RunOutcome::Fallback { .. } => Stage::Fallback,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            RunOutcome::Completed { path, .. } | RunOutcome::Fallback { path, .. } => path,
        }
    }

    pub fn report(&self) -> Option<&FillReport> {
        match self {
            RunOutcome::Completed { report, .. } => Some(report),
            RunOutcome::Fallback { .. } => None,
        }
    }
}

/// Drives one run over a [`PipelineConfig`].
///
/// # Example
///
/// ```ignore
/// let config = PipelineConfig::new("ID995A.pdf", "decrypted_ID995A.pdf", "filled_ID995A.pdf")
///     .with_values(FieldValueMap::new().with_text("engSurname", "DOE"))
///     .with_flatten(true);
/// match Pipeline::new(config, QpdfBackend::new()).run()? {
///     RunOutcome::Completed { report, path } => println!("{} fields -> {}", report.success_count(), path.display()),
///     RunOutcome::Fallback { cause, path } => eprintln!("{cause}; copied to {}", path.display()),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline<B> {
    config: PipelineConfig,
    backend: B,
}

impl<B: DecryptBackend> Pipeline<B> {
    pub fn new(config: PipelineConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Invalid value maps, decryption failures and unparseable documents are
    /// fatal. Errors while filling or finalizing are not: they produce
    /// [`RunOutcome::Fallback`]. Failing to write the output file is fatal.
    pub fn run(&self) -> Result<RunOutcome, FormError> {
        let config = &self.config;
        transition(Stage::Start);
        config.values.validate()?;

        let decryptor = Decryptor::new(&config.source, &config.decrypted_cache, &self.backend);
        let decrypted = decryptor.decrypt()?;
        transition(Stage::Decrypted);

        let doc = FormDocument::load_form(&decrypted)?;
        transition(Stage::FormLoaded);

        let outcome = match fill_and_finalize(doc, &config.values, config.flatten) {
            Ok((report, bytes)) => {
                write_file(&config.output, &bytes)?;
                transition(Stage::Finalized);
                info!(
                    filled = report.success_count(),
                    failed = report.failure_count(),
                    path = %config.output.display(),
                    "wrote filled document"
                );
                RunOutcome::Completed {
                    report,
                    path: config.output.clone(),
                }
            }
            Err(cause) if cause.allows_fallback() => {
                let path = config.fallback_path().to_path_buf();
                warn!(
                    error = %cause,
                    path = %path.display(),
                    "fill failed, writing plain decrypted copy"
                );
                write_file(&path, &decrypted)?;
                transition(Stage::Fallback);
                RunOutcome::Fallback { cause, path }
            }
            Err(e) => return Err(e),
        };

        transition(Stage::Done);
        Ok(outcome)
    }
}

fn fill_and_finalize(
    mut doc: FormDocument,
    values: &FieldValueMap,
    flatten: bool,
) -> Result<(FillReport, Vec<u8>), FormError> {
    let report = {
        let mut form = doc.form()?;
        fill(&mut form, values)
    };
    transition(Stage::Filled);
    let bytes = finalize(doc, flatten)?;
    Ok((report, bytes))
}

fn transition(stage: Stage) {
    info!(%stage, "pipeline stage");
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FormError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
