//! PDF → DOCX: extract text with the PDF library, rebuild a Word document.
//!
//! Single strategy, no fallback chain in this direction. Text comes out of
//! `pdf-extract` in reading order with blank lines between blocks; each
//! block becomes one DOCX paragraph via docx-rs. Layout, images, and fonts
//! are not carried over.
//!
//! pdf-extract is known to panic on malformed files, so the whole
//! extraction runs on a blocking task and a panicked task is mapped to a
//! parse failure instead of taking the process down.

use super::Strategy;
use crate::config::ConverterConfig;
use crate::error::StrategyError;
use crate::output::ConversionRequest;
use crate::probe::ToolProbe;
use async_trait::async_trait;
use docx_rs::{Docx, Paragraph, Run};
use std::path::PathBuf;
use tracing::{debug, info};

pub struct PdfLibraryExtract;

#[async_trait]
impl Strategy for PdfLibraryExtract {
    fn name(&self) -> &'static str {
        "pdf-library-extract"
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

        let join = tokio::task::spawn_blocking(move || -> Result<(), StrategyError> {
            let text = ::pdf_extract::extract_text(&source).map_err(|e| StrategyError::Parse {
                detail: format!("text extraction from '{}' failed: {e}", source.display()),
            })?;
            debug!("extracted {} chars from {}", text.len(), source.display());

            let mut docx = Docx::new();
            for block in paragraph_blocks(&text) {
                docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(block)));
            }

            let mut file =
                std::fs::File::create(&out).map_err(|e| StrategyError::Render {
                    detail: format!("cannot create '{}': {e}", out.display()),
                })?;
            docx.build()
                .pack(&mut file)
                .map_err(|e| StrategyError::Render {
                    detail: format!("cannot write DOCX '{}': {e}", out.display()),
                })?;
            info!("wrote {}", out.display());
            Ok(())
        })
        .await;

        match join {
            Ok(result) => result?,
            // A panic inside pdf-extract surfaces as a join error.
            Err(e) => {
                return Err(StrategyError::Parse {
                    detail: format!("PDF text extraction aborted: {e}"),
                })
            }
        }
        Ok(expected)
    }
}

/// Split extracted text into paragraph blocks on blank lines, collapsing
/// intra-block newlines to spaces.
fn paragraph_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line.trim());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}
