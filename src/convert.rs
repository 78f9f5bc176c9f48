//! Conversion entry points and the fallback-chain orchestrator.
//!
//! ## Why a chain?
//!
//! No single DOCX→PDF converter is reliable across environments: LibreOffice
//! gives the best fidelity but may not be installed, pandoc needs a LaTeX
//! engine for PDF output, and a pure-library rewrite is always available but
//! lossy. The orchestrator tries each strategy exactly once, in priority
//! order, and returns as soon as one produces a non-empty output file. Every
//! failure along the way is kept, so a fully failed conversion reports *all*
//! reasons plus an environment snapshot instead of only the last one.

use crate::config::{ConverterConfig, Direction, Format};
use crate::error::{ConvertError, StrategyError};
use crate::output::{
    check_magic, AttemptReport, ConversionRequest, ConversionResult, ConversionStats,
};
use crate::probe::ToolProbe;
use crate::strategy::{docx_to_pdf_chain, pdf_extract::PdfLibraryExtract, Strategy};
use crate::workspace::{SourceGuard, Workspace};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a staged source file.
///
/// This is the primary entry point for the library. The request's source
/// file must already exist on disk; use [`convert_upload`] to go straight
/// from a caller-owned file.
///
/// # Errors
/// Returns `Err(ConvertError)` only for fatal conditions: missing or
/// mis-typed source file, or every strategy in the chain exhausted
/// ([`ConvertError::AllStrategiesFailed`] with per-attempt diagnostics).
pub async fn convert(
    request: &ConversionRequest,
    config: &ConverterConfig,
    probe: &ToolProbe,
) -> Result<ConversionResult, ConvertError> {
    let total_start = Instant::now();
    info!(
        "starting {} conversion: {}",
        request.direction(),
        request.source_path.display()
    );

    // ── Step 1: Validate the source ──────────────────────────────────────
    if !request.source_path.is_file() {
        return Err(ConvertError::FileNotFound {
            path: request.source_path.clone(),
        });
    }
    check_magic(&request.source_path, request.source_format)?;

    std::fs::create_dir_all(&request.working_dir).map_err(|e| {
        ConvertError::OutputWriteFailed {
            path: request.working_dir.clone(),
            source: e,
        }
    })?;

    // ── Step 2: Pick the strategies for this direction ───────────────────
    let strategies = match request.direction() {
        Direction::DocxToPdf => docx_to_pdf_chain(config),
        Direction::PdfToDocx => vec![Box::new(PdfLibraryExtract) as Box<dyn Strategy>],
    };

    // ── Step 3: Walk the chain ───────────────────────────────────────────
    // A single-strategy direction reports its one failure directly instead
    // of wrapping it in an aggregate.
    let mut result = match run_chain(&strategies, request, config, probe).await {
        Ok(r) => r,
        Err(ConvertError::AllStrategiesFailed { mut attempts, .. })
            if request.direction() == Direction::PdfToDocx && attempts.len() == 1 =>
        {
            let a = attempts.remove(0);
            return Err(ConvertError::ToolFailure {
                tool: a.strategy,
                detail: a.error,
            });
        }
        Err(e) => return Err(e),
    };
    result.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "conversion done via '{}' after {} attempt(s) in {}ms",
        result.strategy_used, result.stats.attempts, result.stats.total_duration_ms
    );
    Ok(result)
}

/// Try each strategy in order and return the first validated success.
///
/// Exposed separately so tests can drive the chain with stub strategies;
/// [`convert`] is this plus source validation and direction dispatch.
pub async fn run_chain(
    strategies: &[Box<dyn Strategy>],
    request: &ConversionRequest,
    config: &ConverterConfig,
    probe: &ToolProbe,
) -> Result<ConversionResult, ConvertError> {
    let mut attempts: Vec<AttemptReport> = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        let name = strategy.name();
        debug!("attempting strategy '{name}'");
        let start = Instant::now();

        let outcome = strategy.attempt(request, config, probe).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(path) => match validate_output(&path) {
                Ok(()) => {
                    return Ok(ConversionResult {
                        output_path: path,
                        strategy_used: name.to_string(),
                        stats: ConversionStats {
                            attempts: attempts.len() + 1,
                            total_duration_ms: 0,
                        },
                        diagnostics: attempts,
                    });
                }
                Err(e) => {
                    // A zero-byte or vanished output counts as a failed
                    // attempt, not a success; remove the husk so a later
                    // strategy can write the same path.
                    warn!("strategy '{name}' produced unusable output: {e}");
                    let _ = std::fs::remove_file(&path);
                    attempts.push(AttemptReport {
                        strategy: name.to_string(),
                        error: e.to_string(),
                        duration_ms,
                    });
                }
            },
            Err(e) => {
                warn!("strategy '{name}' failed in {duration_ms}ms: {e}");
                attempts.push(AttemptReport {
                    strategy: name.to_string(),
                    error: e.to_string(),
                    duration_ms,
                });
            }
        }
    }

    // Nothing succeeded; make sure no partial expected output lingers.
    let _ = std::fs::remove_file(request.expected_output());
    Err(ConvertError::AllStrategiesFailed {
        direction: request.direction().to_string(),
        attempts,
        env: probe.diagnostics(),
    })
}

/// A strategy's claimed output must exist and be non-empty.
fn validate_output(path: &Path) -> Result<(), StrategyError> {
    match std::fs::metadata(path) {
        Ok(m) if m.len() > 0 => Ok(()),
        Ok(_) => Err(StrategyError::EmptyOutput {
            path: path.display().to_string(),
        }),
        Err(_) => Err(StrategyError::MissingOutput {
            expected: path.display().to_string(),
        }),
    }
}

/// Blocking wrapper around [`convert`] for synchronous callers.
pub fn convert_sync(
    request: &ConversionRequest,
    config: &ConverterConfig,
    probe: &ToolProbe,
) -> Result<ConversionResult, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert(request, config, probe))
}

/// Full upload-style flow: stage a caller-owned file into the incoming
/// directory under a unique job name, convert it, and delete the staged
/// source whether the conversion succeeded or not.
///
/// Returns the result whose `output_path` lives in the outgoing directory
/// under the same unique job prefix; strip it for display with
/// [`crate::workspace::public_download_name`].
pub async fn convert_upload(
    original: &Path,
    target: Format,
    config: &ConverterConfig,
    probe: &ToolProbe,
) -> Result<ConversionResult, ConvertError> {
    let workspace = Workspace::new(config)?;
    let original_name = original
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConvertError::InvalidInput {
            detail: format!("'{}' has no usable filename", original.display()),
        })?;

    let job = workspace.plan(original_name, target)?;
    workspace.stage(original, &job.source, config.max_source_bytes)?;
    let _guard = SourceGuard::new(&job.source);

    let request = ConversionRequest::new(
        job.source.clone(),
        job.source_format,
        target,
        workspace.outgoing(),
    )?;
    let mut result = convert(&request, config, probe).await?;

    // Strategies write `{prefix}_{stem}.{ext}` into the outgoing dir, which
    // is exactly the planned output path; keep the result honest if a
    // strategy renamed into a different casing of the same stem.
    if result.output_path != job.output && job.output.is_file() {
        result.output_path = job.output;
    }
    Ok(result)
}
