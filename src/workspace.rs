//! Filesystem contract: incoming/outgoing directories, unique job names,
//! source cleanup, and the retention sweep.
//!
//! Every job gets a random unique prefix (`{uuid}_{name}`) on both its
//! staged source and its output so concurrent conversions never collide.
//! The prefix is an internal detail: [`public_download_name`] strips it
//! before a filename is shown to a user.

use crate::config::{ConverterConfig, Format};
use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use uuid::Uuid;

/// The staged paths for one conversion job.
#[derive(Debug, Clone)]
pub struct JobPaths {
    /// Where the source file is staged (incoming dir, uuid-prefixed).
    pub source: PathBuf,
    /// Where the output will land (outgoing dir, same uuid prefix).
    pub output: PathBuf,
    /// The filename to present to the user, prefix stripped.
    pub download_name: String,
    /// Source format inferred from the original filename's extension.
    pub source_format: Format,
}

/// The incoming/outgoing directory pair, created on construction.
#[derive(Debug, Clone)]
pub struct Workspace {
    incoming: PathBuf,
    outgoing: PathBuf,
}

impl Workspace {
    pub fn new(config: &ConverterConfig) -> Result<Self, ConvertError> {
        for dir in [&config.incoming_dir, &config.outgoing_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ConvertError::OutputWriteFailed {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(Self {
            incoming: config.incoming_dir.clone(),
            outgoing: config.outgoing_dir.clone(),
        })
    }

    pub fn incoming(&self) -> &Path {
        &self.incoming
    }

    pub fn outgoing(&self) -> &Path {
        &self.outgoing
    }

    /// Plan paths for a job from the original (user-supplied) filename and
    /// the requested target format.
    ///
    /// Validates the filename the way the upload layer expects: non-empty,
    /// has an extension, and the extension maps to a supported source
    /// format that differs from the target.
    pub fn plan(&self, original_name: &str, target: Format) -> Result<JobPaths, ConvertError> {
        let original_name = sanitize_file_name(original_name);
        if original_name.is_empty() {
            return Err(ConvertError::InvalidInput {
                detail: "empty filename".into(),
            });
        }

        let (stem, ext) = match original_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => {
                return Err(ConvertError::InvalidInput {
                    detail: format!("'{original_name}' has no usable extension"),
                })
            }
        };

        let source_format =
            Format::from_extension(ext).ok_or_else(|| ConvertError::InvalidInput {
                detail: format!("unsupported extension '.{ext}' (expected .pdf, .docx or .doc)"),
            })?;
        if source_format == target {
            return Err(ConvertError::InvalidInput {
                detail: format!("'{original_name}' is already {target}"),
            });
        }

        let id = Uuid::new_v4();
        let download_name = format!("{stem}.{}", target.extension());
        Ok(JobPaths {
            source: self.incoming.join(format!("{id}_{original_name}")),
            output: self
                .outgoing
                .join(format!("{id}_{stem}.{}", target.extension())),
            download_name,
            source_format,
        })
    }

    /// Copy a caller-owned file into the incoming directory under a planned
    /// source path, enforcing the size limit.
    pub fn stage(
        &self,
        original: &Path,
        staged: &Path,
        max_bytes: u64,
    ) -> Result<(), ConvertError> {
        let len = std::fs::metadata(original)
            .map_err(|_| ConvertError::FileNotFound {
                path: original.to_path_buf(),
            })?
            .len();
        if len > max_bytes {
            return Err(ConvertError::InvalidInput {
                detail: format!("file is {len} bytes, limit is {max_bytes}"),
            });
        }
        std::fs::copy(original, staged).map_err(|e| ConvertError::OutputWriteFailed {
            path: staged.to_path_buf(),
            source: e,
        })?;
        debug!("staged {} -> {}", original.display(), staged.display());
        Ok(())
    }
}

/// Strip the unique job prefix from an internal filename.
///
/// `"550e8400-…-440000_report.pdf"` → `"report.pdf"`. Names without a
/// prefix pass through unchanged.
pub fn public_download_name(file_name: &str) -> String {
    match file_name.split_once('_') {
        Some((prefix, rest)) if Uuid::parse_str(prefix).is_ok() => rest.to_string(),
        _ => file_name.to_string(),
    }
}

/// Keep only the final path component and drop characters that could later
/// confuse a shell or a Content-Disposition header.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    base.chars()
        .filter(|c| !matches!(c, '\0' | '"' | '\'' | ';' | '|' | '&'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Deletes the staged source file when dropped.
///
/// The upload contract requires the source to be removed on both the
/// success and the failure path; tying deletion to scope exit keeps that
/// true across every early return.
pub struct SourceGuard {
    path: PathBuf,
    disarmed: bool,
}

impl SourceGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            disarmed: false,
        }
    }

    /// Keep the source file after all (e.g. `--keep-source` in the CLI).
    pub fn disarm(&mut self) {
        self.disarmed = true;
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to delete staged source {}: {e}", self.path.display());
            }
        }
    }
}

/// Delete regular files in `dir` whose modification time is older than
/// `max_age`. Returns how many files were removed. Errors on individual
/// files are logged and skipped so one locked file cannot stall the sweep.
pub fn sweep_older_than(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("sweep: unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => continue,
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("sweep: removed {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("sweep: failed to remove {}: {e}", path.display()),
            }
        }
    }
    Ok(removed)
}
