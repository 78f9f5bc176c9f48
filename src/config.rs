//! Configuration types for PDF ⇄ DOCX conversion.
//!
//! All conversion behaviour is controlled through [`ConverterConfig`], built
//! via its [`ConverterConfigBuilder`]. Keeping every knob in one struct means
//! the orchestrator takes no ambient global state: the struct is constructed
//! once at startup and passed down to every conversion.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest, and `build()` is the single place where
//! cross-field validation happens.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A document format docshift can read or produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Pdf,
    Docx,
}

impl Format {
    /// Map a filename extension to a format.
    ///
    /// `.doc` is accepted as DOCX input: every converter in the chain that
    /// reads the file via an external tool handles legacy Word files, and the
    /// ones that do not will fail their attempt and fall through.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Format::Pdf),
            "docx" | "doc" => Some(Format::Docx),
            _ => None,
        }
    }

    /// Canonical extension for files of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
        }
    }

    /// Accepted leading magic bytes: `%PDF` for PDF; for the Word side both
    /// `PK\x03\x04` (the ZIP container a DOCX lives in) and `\xD0\xCF\x11\xE0`
    /// (the OLE2 container of a legacy `.doc`).
    pub fn magics(&self) -> &'static [[u8; 4]] {
        const PDF_MAGICS: [[u8; 4]; 1] = [*b"%PDF"];
        const DOCX_MAGICS: [[u8; 4]; 2] = [*b"PK\x03\x04", [0xD0, 0xCF, 0x11, 0xE0]];
        match self {
            Format::Pdf => &PDF_MAGICS,
            Format::Docx => &DOCX_MAGICS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Pdf => "PDF",
            Format::Docx => "DOCX",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The conversion direction, derived from a request's source/target pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PdfToDocx,
    DocxToPdf,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::PdfToDocx => f.write_str("PDF→DOCX"),
            Direction::DocxToPdf => f.write_str("DOCX→PDF"),
        }
    }
}

/// Configuration for a converter instance.
///
/// Built via [`ConverterConfig::builder()`] or using
/// [`ConverterConfig::default()`].
///
/// # Example
/// ```rust
/// use docshift::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .office_timeout_secs(90)
///     .use_document_cli(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Directory where uploaded source files are staged. Default: `uploads`.
    pub incoming_dir: PathBuf,

    /// Directory where conversion outputs land. Default: `downloads`.
    ///
    /// Output files stay here until an explicit cleanup call or until the
    /// retention sweep removes them; the converter itself never deletes a
    /// successful output.
    pub outgoing_dir: PathBuf,

    /// Maximum accepted source file size in bytes. Default: 16 MiB.
    pub max_source_bytes: u64,

    /// Timeout for the headless office suite process in seconds. Default: 60.
    ///
    /// LibreOffice cold-starts slowly (it spins up a full office process per
    /// invocation), so anything under ~20s produces spurious timeouts on
    /// loaded hosts. 60s covers large documents; raise it for scanned-image
    /// heavy files.
    pub office_timeout_secs: u64,

    /// Timeout for the document-processing CLI (pandoc) in seconds. Default: 60.
    pub cli_timeout_secs: u64,

    /// Insert the `document-cli` (pandoc) strategy into the DOCX→PDF chain,
    /// after the office strategy. Default: false.
    ///
    /// Off by default so the documented three-strategy chain is what runs;
    /// pandoc is a useful extra rung on hosts where it is installed but
    /// LibreOffice is not.
    pub use_document_cli: bool,

    /// Age in seconds after which [`crate::workspace::sweep_older_than`]
    /// deletes staged and output files. Default: 3600 (1 hour).
    pub retention_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            incoming_dir: PathBuf::from("uploads"),
            outgoing_dir: PathBuf::from("downloads"),
            max_source_bytes: 16 * 1024 * 1024,
            office_timeout_secs: 60,
            cli_timeout_secs: 60,
            use_document_cli: false,
            retention_secs: 3600,
        }
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn incoming_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.incoming_dir = dir.into();
        self
    }

    pub fn outgoing_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.outgoing_dir = dir.into();
        self
    }

    pub fn max_source_bytes(mut self, bytes: u64) -> Self {
        self.config.max_source_bytes = bytes;
        self
    }

    pub fn office_timeout_secs(mut self, secs: u64) -> Self {
        self.config.office_timeout_secs = secs;
        self
    }

    pub fn cli_timeout_secs(mut self, secs: u64) -> Self {
        self.config.cli_timeout_secs = secs;
        self
    }

    pub fn use_document_cli(mut self, v: bool) -> Self {
        self.config.use_document_cli = v;
        self
    }

    pub fn retention_secs(mut self, secs: u64) -> Self {
        self.config.retention_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if c.max_source_bytes == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_source_bytes must be ≥ 1".into(),
            ));
        }
        if c.office_timeout_secs == 0 || c.cli_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "process timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.incoming_dir == c.outgoing_dir {
            return Err(ConvertError::InvalidConfig(
                "incoming_dir and outgoing_dir must differ".into(),
            ));
        }
        Ok(self.config)
    }
}
