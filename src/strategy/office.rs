//! Strategy 1: headless office suite (`soffice --headless --convert-to pdf`).
//!
//! LibreOffice is the only converter in the chain with real DOCX layout
//! fidelity, so it goes first. The binary location comes from the startup
//! [`ToolProbe`]; a host without it fails this attempt immediately with
//! `ToolUnavailable` and the chain moves on; nothing is installed at
//! request time.

use super::{run_with_timeout, Strategy};
use crate::config::ConverterConfig;
use crate::error::StrategyError;
use crate::output::ConversionRequest;
use crate::probe::ToolProbe;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

pub struct OfficeAutomation;

#[async_trait]
impl Strategy for OfficeAutomation {
    fn name(&self) -> &'static str {
        "native-office-automation"
    }

    async fn attempt(
        &self,
        request: &ConversionRequest,
        config: &ConverterConfig,
        probe: &ToolProbe,
    ) -> Result<PathBuf, StrategyError> {
        let binary = probe
            .office
            .as_ref()
            .ok_or_else(|| StrategyError::ToolUnavailable {
                tool: "soffice".into(),
            })?;

        let expected = request.expected_output();
        let mut command = Command::new(binary);
        command
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg(request.target_format.extension())
            .arg("--outdir")
            .arg(&request.working_dir)
            .arg(&request.source_path);

        debug!("running {} for {}", binary.display(), request.source_path.display());
        let output = run_with_timeout("soffice", command, config.office_timeout_secs).await?;

        if !output.status.success() {
            return Err(StrategyError::NonZeroExit {
                tool: "soffice".into(),
                code: output.status.code(),
                stderr: truncate(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        if expected.exists() {
            info!("office suite wrote {}", expected.display());
            return Ok(expected);
        }

        // The suite names its output after the input file's stem. Normally
        // that coincides with the expected path; when it does not (legacy
        // .doc inputs, odd stems), rename the stem-derived file into place.
        if let Some(found) = find_stem_output(request) {
            std::fs::rename(&found, &expected).map_err(|e| StrategyError::Render {
                detail: format!(
                    "could not move '{}' into place: {e}",
                    found.display()
                ),
            })?;
            info!("renamed {} -> {}", found.display(), expected.display());
            return Ok(expected);
        }

        Err(StrategyError::MissingOutput {
            expected: expected.display().to_string(),
        })
    }
}

/// Look for `{source stem}*.{target ext}` in the working directory.
fn find_stem_output(request: &ConversionRequest) -> Option<PathBuf> {
    let stem = request.source_path.file_stem()?.to_string_lossy().into_owned();
    let ext = request.target_format.extension();
    let entries = std::fs::read_dir(&request.working_dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.extension().map(|x| x.to_string_lossy().eq_ignore_ascii_case(ext)) == Some(true)
                && p.file_stem()
                    .map(|s| s.to_string_lossy().starts_with(&stem))
                    == Some(true)
        })
}

fn truncate(s: &str) -> String {
    const MAX: usize = 400;
    if s.chars().count() > MAX {
        let cut: String = s.chars().take(MAX).collect();
        format!("{cut}…")
    } else {
        s.to_string()
    }
}
