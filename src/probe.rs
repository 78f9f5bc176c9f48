//! Startup-time discovery of the external converter binaries.
//!
//! ## Why probe at startup?
//!
//! The strategies shell out to LibreOffice (`soffice`) and optionally
//! pandoc. Discovering them once at startup gives two things: a fast-fail
//! path for deployments that require the office suite, and an environment
//! snapshot ([`EnvDiagnostics`]) that gets attached to aggregated failure
//! messages so an operator can see at a glance *why* a host degraded to the
//! text-reflow fallback. Nothing here ever attempts to install a missing
//! tool; a hole in the probe simply shows up as a recorded
//! `ToolUnavailable` attempt when that strategy runs.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Candidate binary names for the headless office suite, in preference
/// order. `soffice` is the binary proper; `libreoffice` is the wrapper
/// script most distros also install.
const OFFICE_CANDIDATES: &[&str] = &["soffice", "libreoffice"];

const PANDOC_CANDIDATES: &[&str] = &["pandoc"];

/// Discovered converter binaries plus the PATH they were searched on.
#[derive(Debug, Clone)]
pub struct ToolProbe {
    /// Resolved office suite binary, if any.
    pub office: Option<PathBuf>,
    /// Resolved pandoc binary, if any.
    pub pandoc: Option<PathBuf>,
    /// The PATH variable that was scanned, kept verbatim for diagnostics.
    pub path_var: String,
}

impl ToolProbe {
    /// Scan PATH for every known converter binary.
    pub fn discover() -> Self {
        let path_var = std::env::var("PATH").unwrap_or_default();
        let dirs: Vec<PathBuf> = std::env::split_paths(&path_var).collect();
        let probe = Self {
            office: find_in_dirs(&dirs, OFFICE_CANDIDATES),
            pandoc: find_in_dirs(&dirs, PANDOC_CANDIDATES),
            path_var,
        };
        match &probe.office {
            Some(p) => info!("office suite found: {}", p.display()),
            None => debug!("no office suite on PATH"),
        }
        match &probe.pandoc {
            Some(p) => info!("pandoc found: {}", p.display()),
            None => debug!("no pandoc on PATH"),
        }
        probe
    }

    /// A probe that found nothing. Chains run entirely on built-in
    /// strategies; useful in tests.
    pub fn empty() -> Self {
        Self {
            office: None,
            pandoc: None,
            path_var: String::new(),
        }
    }

    /// Fail fast when a deployment requires the office suite.
    ///
    /// Call this at startup, not per request: a missing binary is a
    /// provisioning problem, and the fix is installing it, not retrying.
    pub fn require_office(&self) -> Result<&Path, ConvertError> {
        self.office
            .as_deref()
            .ok_or_else(|| ConvertError::ToolUnavailable {
                tool: "soffice".into(),
                hint: "Install LibreOffice (e.g. `apt-get install libreoffice`) \
                       or run without --require-office to rely on fallback strategies."
                    .into(),
            })
    }

    /// Snapshot for attaching to error reports.
    pub fn diagnostics(&self) -> EnvDiagnostics {
        EnvDiagnostics {
            os: std::env::consts::OS.to_string(),
            office: self.office.as_ref().map(|p| p.display().to_string()),
            pandoc: self.pandoc.as_ref().map(|p| p.display().to_string()),
            path_var: self.path_var.clone(),
        }
    }
}

/// Operator-facing environment snapshot attached to aggregated failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvDiagnostics {
    pub os: String,
    pub office: Option<String>,
    pub pandoc: Option<String>,
    pub path_var: String,
}

impl fmt::Display for EnvDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "os={} office={} pandoc={} PATH={}",
            self.os,
            self.office.as_deref().unwrap_or("<not found>"),
            self.pandoc.as_deref().unwrap_or("<not found>"),
            self.path_var,
        )
    }
}

/// Return the first existing `dir/name` (with `.exe` tried on Windows)
/// across all candidate names and directories.
fn find_in_dirs(dirs: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
    for name in names {
        for dir in dirs {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            if cfg!(windows) {
                let exe = dir.join(format!("{name}.exe"));
                if exe.is_file() {
                    return Some(exe);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_in_dirs_prefers_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("libreoffice"), b"#!/bin/sh\n").unwrap();
        std::fs::write(dir.path().join("soffice"), b"#!/bin/sh\n").unwrap();

        let found = find_in_dirs(&[dir.path().to_path_buf()], OFFICE_CANDIDATES).unwrap();
        assert_eq!(found.file_name().unwrap(), "soffice");
    }

    #[test]
    fn find_in_dirs_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_in_dirs(&[dir.path().to_path_buf()], &["nonexistent-tool"]).is_none());
    }

    #[test]
    fn empty_probe_requires_office_fails() {
        let probe = ToolProbe::empty();
        let err = probe.require_office().unwrap_err();
        assert!(err.to_string().contains("soffice"));
    }

    #[test]
    fn diagnostics_display_mentions_missing_tools() {
        let d = ToolProbe::empty().diagnostics();
        assert!(d.to_string().contains("<not found>"));
    }
}
