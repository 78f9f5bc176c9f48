//! Strategy: open the DOCX directly with the PDF library and re-save.
//!
//! A deliberately weak rung. lopdf cannot parse a Word container, so this
//! almost always fails at `Document::load`. Still, it costs nothing to
//! try and its failure is non-fatal; callers driving [`run_chain`] with
//! their own inputs may also see it salvage a PDF wearing a `.docx`
//! extension, though the library's own input validation screens those out
//! before the chain starts. Do not read any semantic validity into it.
//!
//! [`run_chain`]: crate::convert::run_chain

use super::Strategy;
use crate::config::ConverterConfig;
use crate::error::StrategyError;
use crate::output::ConversionRequest;
use crate::probe::ToolProbe;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

pub struct PdfLibraryReopen;

#[async_trait]
impl Strategy for PdfLibraryReopen {
    fn name(&self) -> &'static str {
        "pdf-library-reopen"
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

        debug!("reopening {} with lopdf", source.display());
        tokio::task::spawn_blocking(move || -> Result<(), StrategyError> {
            let mut doc = lopdf::Document::load(&source).map_err(|e| StrategyError::Parse {
                detail: format!("lopdf cannot open '{}': {e}", source.display()),
            })?;
            doc.save(&out).map_err(|e| StrategyError::Render {
                detail: format!("lopdf cannot save '{}': {e}", out.display()),
            })?;
            Ok(())
        })
        .await
        .map_err(|e| StrategyError::Render {
            detail: format!("reopen task failed: {e}"),
        })??;

        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;

    #[tokio::test]
    async fn real_docx_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.docx");
        // A ZIP header, which lopdf must refuse.
        std::fs::write(&source, b"PK\x03\x04rest-of-zip").unwrap();

        let request =
            ConversionRequest::new(&source, Format::Docx, Format::Pdf, dir.path()).unwrap();
        let err = PdfLibraryReopen
            .attempt(&request, &ConverterConfig::default(), &ToolProbe::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::Parse { .. }), "got {err}");
    }
}
