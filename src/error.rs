//! Error types for the docshift library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the conversion cannot complete at all
//!   (bad input file, invalid configuration, every strategy exhausted).
//!   Returned as `Err(ConvertError)` from the top-level `convert*` functions.
//!
//! * [`StrategyError`] — **Non-fatal**: a single strategy attempt failed
//!   (binary missing, process timed out, parse error) but the next strategy
//!   in the chain may still succeed. Recorded inside
//!   [`crate::output::AttemptReport`] so the final error is diagnostic
//!   rather than losing every prior failure to the last one.
//!
//! The separation is what makes the fallback chain degrade gracefully: a
//! strategy failure never aborts the chain, and only exhaustion of every
//! strategy surfaces to the caller.

use crate::output::AttemptReport;
use crate::probe::EnvDiagnostics;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docshift library.
///
/// Per-strategy failures use [`StrategyError`] and are stored in
/// [`crate::output::AttemptReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request itself is malformed (empty filename, wrong extension,
    /// identical source and target format).
    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but its magic bytes match none of the
    /// declared format's containers (`%PDF` for PDF; `PK` zip or OLE2 for
    /// the Word side).
    #[error("File is not a valid {format}: '{path}'\nFirst bytes: {magic:?}")]
    WrongMagic {
        path: PathBuf,
        format: &'static str,
        magic: [u8; 4],
    },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// An individual converter call failed on a direction with no fallback
    /// chain (PDF → DOCX has a single strategy).
    #[error("Conversion tool '{tool}' failed: {detail}")]
    ToolFailure { tool: String, detail: String },

    /// A required external binary could not be found at startup.
    #[error("Required tool '{tool}' was not found on PATH.\n{hint}")]
    ToolUnavailable { tool: String, hint: String },

    /// Every strategy in the chain failed. Carries the full ordered list of
    /// per-attempt diagnostics plus an environment snapshot for operators.
    #[error("{}", render_all_failed(.direction, .attempts, .env))]
    AllStrategiesFailed {
        direction: String,
        attempts: Vec<AttemptReport>,
        env: EnvDiagnostics,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or move the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Render the aggregated failure message: one line per attempt, in chain
/// order, followed by the environment diagnostics.
fn render_all_failed(direction: &str, attempts: &[AttemptReport], env: &EnvDiagnostics) -> String {
    let mut msg = format!("All {} {} strategies failed:\n", attempts.len(), direction);
    for a in attempts {
        msg.push_str(&format!(
            "  - {}: {} ({}ms)\n",
            a.strategy, a.error, a.duration_ms
        ));
    }
    msg.push_str(&format!("Environment: {env}"));
    msg
}

/// A non-fatal error for a single strategy attempt.
///
/// Stored in [`crate::output::AttemptReport`]; the chain continues with the
/// next strategy unless none remain.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StrategyError {
    /// The external binary this strategy needs was not discovered at startup.
    #[error("'{tool}' is not installed or not on PATH")]
    ToolUnavailable { tool: String },

    /// The external process could not be spawned.
    #[error("failed to spawn '{tool}': {detail}")]
    Spawn { tool: String, detail: String },

    /// The external process exceeded its timeout and was killed.
    #[error("'{tool}' timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    /// The external process exited with a non-zero status.
    #[error("'{tool}' exited with status {code:?}: {stderr}")]
    NonZeroExit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process reported success but the expected output file never appeared.
    #[error("expected output '{expected}' was not produced")]
    MissingOutput { expected: String },

    /// The output file exists but is zero bytes.
    #[error("output '{path}' is empty")]
    EmptyOutput { path: String },

    /// The source document could not be parsed.
    #[error("parse error: {detail}")]
    Parse { detail: String },

    /// PDF re-rendering failed.
    #[error("render error: {detail}")]
    Render { detail: String },
}
