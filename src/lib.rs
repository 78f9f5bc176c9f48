//! # docshift
//!
//! Convert between PDF and DOCX with a graceful-degradation fallback chain.
//!
//! ## Why this crate?
//!
//! DOCX→PDF conversion quality depends entirely on what is installed on the
//! host: a headless office suite renders faithfully, a document CLI renders
//! acceptably, and a pure-Rust rewrite always works but drops layout. Rather
//! than failing when the best tool is missing, docshift walks an ordered
//! chain of strategies and returns the first non-empty output, keeping a
//! report of every failed attempt along the way.
//!
//! ## Conversion chain
//!
//! ```text
//! DOCX ──▶ native-office-automation   headless LibreOffice (full fidelity)
//!            │ failed
//!            ▼
//!          document-cli               pandoc (opt-in)
//!            │ failed
//!            ▼
//!          pdf-library-reopen         lopdf load + save (weak rung)
//!            │ failed
//!            ▼
//!          text-reflow-fallback ──▶ PDF   paragraphs re-set in Helvetica
//!
//! PDF  ──▶ pdf-library-extract ────▶ DOCX  single strategy, no fallback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docshift::{convert_upload, ConverterConfig, Format, ToolProbe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConverterConfig::default();
//!     let probe = ToolProbe::discover();
//!     let result = convert_upload("report.docx".as_ref(), Format::Pdf, &config, &probe).await?;
//!     println!(
//!         "wrote {} via {}",
//!         result.output_path.display(),
//!         result.strategy_used
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docshift` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docshift = { version = "0.3", default-features = false }
//! ```
//!
//! ## External tools
//!
//! Strategies shell out to `soffice`/`libreoffice` and optionally `pandoc`
//! when they are on PATH; [`ToolProbe::discover`] finds them once at startup.
//! Nothing is ever installed on the caller's behalf, and a missing tool only
//! disables its own rung of the chain.

pub mod config;
pub mod convert;
pub mod docx;
pub mod error;
pub mod output;
pub mod probe;
pub mod reflow;
pub mod strategy;
pub mod workspace;

pub use config::{ConverterConfig, ConverterConfigBuilder, Direction, Format};
pub use convert::{convert, convert_sync, convert_upload, run_chain};
pub use error::{ConvertError, StrategyError};
pub use output::{AttemptReport, ConversionRequest, ConversionResult, ConversionStats};
pub use probe::{EnvDiagnostics, ToolProbe};
pub use strategy::{docx_to_pdf_chain, Strategy};
pub use workspace::{public_download_name, sweep_older_than, JobPaths, SourceGuard, Workspace};
