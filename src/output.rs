//! Request and result types for a single conversion.
//!
//! A [`ConversionRequest`] is created per call and never mutated; the
//! orchestrator produces exactly one [`ConversionResult`] for it. The
//! result keeps the ordered list of failed attempts ([`AttemptReport`])
//! that preceded success, so callers can see how far down the chain the
//! conversion had to degrade.

use crate::config::{Direction, Format};
use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An immutable description of one conversion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// The staged source file (already saved to disk by the caller).
    pub source_path: PathBuf,
    /// Declared format of the source file.
    pub source_format: Format,
    /// Requested output format.
    pub target_format: Format,
    /// Directory strategies write their output into.
    pub working_dir: PathBuf,
}

impl ConversionRequest {
    /// Create a request, rejecting same-format "conversions" up front.
    pub fn new(
        source_path: impl Into<PathBuf>,
        source_format: Format,
        target_format: Format,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConvertError> {
        if source_format == target_format {
            return Err(ConvertError::InvalidInput {
                detail: format!("source and target format are both {source_format}"),
            });
        }
        Ok(Self {
            source_path: source_path.into(),
            source_format,
            target_format,
            working_dir: working_dir.into(),
        })
    }

    /// The conversion direction this request describes.
    pub fn direction(&self) -> Direction {
        match self.target_format {
            Format::Pdf => Direction::DocxToPdf,
            Format::Docx => Direction::PdfToDocx,
        }
    }

    /// Where every strategy is expected to leave its output: the working
    /// directory, named after the source file's stem with the target
    /// extension. Source names carry a unique job prefix (see
    /// [`crate::workspace`]), so concurrent jobs never collide here.
    pub fn expected_output(&self) -> PathBuf {
        let stem = self
            .source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.working_dir
            .join(format!("{stem}.{}", self.target_format.extension()))
    }
}

/// One failed strategy attempt, in chain order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Strategy name, e.g. `"native-office-automation"`.
    pub strategy: String,
    /// Human-readable failure reason.
    pub error: String,
    /// Wall-clock time the attempt took.
    pub duration_ms: u64,
}

/// Timing summary for a completed conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of strategies attempted, including the successful one.
    pub attempts: usize,
    /// Total wall-clock time from request to output validation.
    pub total_duration_ms: u64,
}

/// The outcome of a successful conversion.
///
/// The caller owns deletion of both the source and the output file; see
/// [`crate::workspace::sweep_older_than`] for the time-based cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// The produced output file.
    pub output_path: PathBuf,
    /// Name of the strategy that produced the output.
    pub strategy_used: String,
    /// Ordered failure reports for every strategy tried before this one.
    pub diagnostics: Vec<AttemptReport>,
    /// Timing summary.
    pub stats: ConversionStats,
}

impl ConversionResult {
    /// Filename component of the output, for handing to a download layer.
    pub fn output_file_name(&self) -> &str {
        self.output_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }
}

/// Read the first four bytes of `path` and compare against the format's
/// accepted magics. Returns the observed bytes on mismatch so the error can
/// show what was actually there.
pub(crate) fn check_magic(path: &Path, format: Format) -> Result<(), ConvertError> {
    use std::io::Read;
    let mut f = std::fs::File::open(path).map_err(|_| ConvertError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let mut magic = [0u8; 4];
    if f.read_exact(&mut magic).is_err() || !format.magics().contains(&magic) {
        return Err(ConvertError::WrongMagic {
            path: path.to_path_buf(),
            format: format.name(),
            magic,
        });
    }
    Ok(())
}
