//! Strategy: lossy text-reflow fallback.
//!
//! The last rung, and the only one with no external dependency: parse the
//! DOCX into paragraphs and runs ([`crate::docx`]) and rebuild a generic
//! PDF ([`crate::reflow`]). Preserved: paragraph order, heading levels
//! 1–3, and bold/italic/underline per run. Lost: tables, images, precise
//! layout. That loss is the documented contract of this strategy, not a
//! defect.

use super::Strategy;
use crate::config::ConverterConfig;
use crate::docx;
use crate::error::StrategyError;
use crate::output::ConversionRequest;
use crate::probe::ToolProbe;
use crate::reflow::ReflowPdf;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct TextReflow;

#[async_trait]
impl Strategy for TextReflow {
    fn name(&self) -> &'static str {
        "text-reflow-fallback"
    }

    async fn attempt(
        &self,
        request: &ConversionRequest,
        _config: &ConverterConfig,
        _probe: &ToolProbe,
    ) -> Result<PathBuf, StrategyError> {
        let source = request.source_path.clone();
        let expected = request.expected_output();
        let out = expected.clone();

        tokio::task::spawn_blocking(move || -> Result<(), StrategyError> {
            let document = docx::read_docx(&source)?;
            debug!(
                "reflowing {} paragraphs from {}",
                document.paragraphs.len(),
                source.display()
            );

            let mut pdf = ReflowPdf::new();
            for paragraph in &document.paragraphs {
                pdf.add_paragraph(paragraph.style, &paragraph.runs);
            }
            let bytes = pdf.finish()?;

            std::fs::write(&out, &bytes).map_err(|e| StrategyError::Render {
                detail: format!("cannot write '{}': {e}", out.display()),
            })?;
            info!("reflow wrote {} ({} bytes)", out.display(), bytes.len());
            Ok(())
        })
        .await
        .map_err(|e| StrategyError::Render {
            detail: format!("reflow task failed: {e}"),
        })??;

        Ok(expected)
    }
}
