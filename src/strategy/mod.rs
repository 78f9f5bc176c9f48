//! Conversion strategies, one module per strategy.
//!
//! Each submodule implements exactly one way of performing a conversion.
//! The orchestrator walks a fixed, ordered chain and takes the first
//! strategy that yields a non-empty output file; a failed attempt is
//! recorded and never blocks the next strategy.
//!
//! ## DOCX→PDF chain order
//!
//! ```text
//! native-office-automation ──▶ [document-cli] ──▶ pdf-library-reopen ──▶ text-reflow-fallback
//!        (soffice)               (pandoc, opt-in)     (lopdf, weak)          (lossy, built-in)
//! ```
//!
//! 1. [`office`]       — headless LibreOffice; full fidelity when installed
//! 2. [`document_cli`] — pandoc, inserted only when configured
//! 3. [`pdf_reopen`]   — open the DOCX with the PDF library and re-save;
//!    kept as a cheap rung even though it almost never parses a DOCX
//! 4. [`text_reflow`]  — rebuild a PDF from extracted paragraphs; always
//!    available, loses tables/images/layout
//!
//! PDF→DOCX has a single strategy, [`pdf_extract`]; its failure is fatal
//! for the request rather than recoverable.

use crate::config::ConverterConfig;
use crate::error::StrategyError;
use crate::output::ConversionRequest;
use crate::probe::ToolProbe;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

pub mod document_cli;
pub mod office;
pub mod pdf_extract;
pub mod pdf_reopen;
pub mod text_reflow;

/// One self-contained conversion method.
///
/// Strategies are stateless: everything an attempt needs arrives through
/// its arguments, so concurrent requests can share the same strategy
/// objects freely.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable name used in logs, results, and attempt reports.
    fn name(&self) -> &'static str;

    /// Try the conversion once. On success, returns the path of the file
    /// written (normally [`ConversionRequest::expected_output`]). The
    /// orchestrator validates non-emptiness; a strategy does not need to.
    async fn attempt(
        &self,
        request: &ConversionRequest,
        config: &ConverterConfig,
        probe: &ToolProbe,
    ) -> Result<PathBuf, StrategyError>;
}

/// Spawn an external converter process and wait for it under a timeout.
///
/// `kill_on_drop` means the child is killed when the timeout fires and the
/// wait future is dropped; there is no other cancellation path once a tool
/// has been launched.
pub(crate) async fn run_with_timeout(
    tool: &str,
    mut command: tokio::process::Command,
    timeout_secs: u64,
) -> Result<std::process::Output, StrategyError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(|e| StrategyError::Spawn {
        tool: tool.into(),
        detail: e.to_string(),
    })?;

    match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(StrategyError::Spawn {
            tool: tool.into(),
            detail: format!("wait failed: {e}"),
        }),
        Err(_) => Err(StrategyError::Timeout {
            tool: tool.into(),
            secs: timeout_secs,
        }),
    }
}

/// Build the DOCX→PDF chain in priority order.
pub fn docx_to_pdf_chain(config: &ConverterConfig) -> Vec<Box<dyn Strategy>> {
    let mut chain: Vec<Box<dyn Strategy>> = vec![Box::new(office::OfficeAutomation)];
    if config.use_document_cli {
        chain.push(Box::new(document_cli::DocumentCli));
    }
    chain.push(Box::new(pdf_reopen::PdfLibraryReopen));
    chain.push(Box::new(text_reflow::TextReflow));
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_order() {
        let config = ConverterConfig::default();
        let names: Vec<&str> = docx_to_pdf_chain(&config).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "native-office-automation",
                "pdf-library-reopen",
                "text-reflow-fallback"
            ]
        );
    }

    #[test]
    fn document_cli_inserted_after_office() {
        let config = ConverterConfig::builder()
            .use_document_cli(true)
            .build()
            .unwrap();
        let names: Vec<&str> = docx_to_pdf_chain(&config).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "native-office-automation",
                "document-cli",
                "pdf-library-reopen",
                "text-reflow-fallback"
            ]
        );
    }
}
