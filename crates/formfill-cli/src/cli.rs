use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Decrypt, inspect and fill PDF AcroForms.
#[derive(Debug, Parser)]
#[command(name = "formfill", about, version)]
pub struct Cli {
    /// Log more detail (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decrypt the source PDF, fill its form and write the result
    Fill {
        /// The access-restricted source PDF
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        /// Decrypted copy, reused when present. Default: decrypted_<source> beside the source
        #[arg(long, value_name = "FILE")]
        cache: Option<PathBuf>,

        /// Filled output PDF. Default: filled_<source> beside the source
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Where the plain decrypted copy goes if filling fails. Default: the output path
        #[arg(long, value_name = "FILE")]
        fallback_output: Option<PathBuf>,

        /// JSON file with "text", "check" and "uncheck" entries
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Set a text field (repeatable)
        #[arg(long = "text", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        text: Vec<(String, String)>,

        /// Check a checkbox (repeatable)
        #[arg(long, value_name = "NAME")]
        check: Vec<String>,

        /// Uncheck a checkbox (repeatable)
        #[arg(long, value_name = "NAME")]
        uncheck: Vec<String>,

        /// Bake field values into the page content and remove the form
        #[arg(long)]
        flatten: bool,

        /// How to remove the owner-password restriction
        #[arg(long, value_enum, default_value_t = DecryptorArg::Qpdf)]
        decryptor: DecryptorArg,

        /// Output format of the fill report
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// List the form fields of an unencrypted PDF
    Fields {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Show at most this many fields
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Only remove the owner-password restriction
    Decrypt {
        /// The access-restricted source PDF
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        /// Where to write the decrypted copy. Default: decrypted_<source> beside the source
        #[arg(long, value_name = "FILE")]
        cache: Option<PathBuf>,

        /// How to remove the owner-password restriction
        #[arg(long, value_enum, default_value_t = DecryptorArg::Qpdf)]
        decryptor: DecryptorArg,
    },
}

/// Decryption backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecryptorArg {
    /// Run `qpdf --decrypt`
    Qpdf,
    /// Decrypt in-process with the empty user password
    Builtin,
}

/// Output format for field listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated text
    Text,
    /// JSON
    Json,
    /// CSV
    Csv,
}

/// Output format for fill reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One line per field
    Text,
    /// JSON
    Json,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}
