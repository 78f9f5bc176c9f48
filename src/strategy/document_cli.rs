//! Opt-in strategy: document-processing CLI (pandoc).
//!
//! Inserted into the chain only when `use_document_cli` is set. pandoc's
//! DOCX reader is solid but its default PDF writer needs a LaTeX engine,
//! so on most hosts this rung fails fast with a clear stderr message
//! telling the operator what to install.

use super::{run_with_timeout, Strategy};
use crate::config::ConverterConfig;
use crate::error::StrategyError;
use crate::output::ConversionRequest;
use crate::probe::ToolProbe;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

pub struct DocumentCli;

#[async_trait]
impl Strategy for DocumentCli {
    fn name(&self) -> &'static str {
        "document-cli"
    }

    async fn attempt(
        &self,
        request: &ConversionRequest,
        config: &ConverterConfig,
        probe: &ToolProbe,
    ) -> Result<PathBuf, StrategyError> {
        let binary = probe
            .pandoc
            .as_ref()
            .ok_or_else(|| StrategyError::ToolUnavailable {
                tool: "pandoc".into(),
            })?;

        let expected = request.expected_output();
        let mut command = Command::new(binary);
        command
            .arg(&request.source_path)
            .arg("-o")
            .arg(&expected);

        debug!("running {} for {}", binary.display(), request.source_path.display());
        let output = run_with_timeout("pandoc", command, config.cli_timeout_secs).await?;

        if !output.status.success() {
            return Err(StrategyError::NonZeroExit {
                tool: "pandoc".into(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !expected.exists() {
            return Err(StrategyError::MissingOutput {
                expected: expected.display().to_string(),
            });
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Format;

    #[tokio::test]
    async fn missing_pandoc_is_tool_unavailable() {
        let request =
            ConversionRequest::new("/tmp/in/x.docx", Format::Docx, Format::Pdf, "/tmp/out")
                .unwrap();
        let err = DocumentCli
            .attempt(&request, &ConverterConfig::default(), &ToolProbe::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::ToolUnavailable { .. }));
    }
}
