//! CLI binary for docshift.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docshift::{
    convert, public_download_name, sweep_older_than, ConversionRequest, ConverterConfig, Format,
    SourceGuard, ToolProbe, Workspace,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # DOCX to PDF (direction inferred from the extension)
  docshift report.docx

  # PDF to DOCX, explicit target, custom output location
  docshift paper.pdf --to docx -o paper.docx

  # Insert pandoc into the fallback chain
  docshift report.docx --use-document-cli

  # Fail fast if LibreOffice is missing instead of degrading
  docshift report.docx --require-office

  # Show which converter binaries were found
  docshift --probe-only

  # Delete staged/output files older than the retention window
  docshift --sweep

  # Structured JSON result for scripting
  docshift report.docx --json > result.json

STRATEGIES (DOCX→PDF, tried in order):
  native-office-automation   headless LibreOffice; best fidelity
  document-cli               pandoc; only with --use-document-cli
  pdf-library-reopen         lopdf load + re-save; rarely parses a DOCX
  text-reflow-fallback       paragraphs re-set in Helvetica; always available

  PDF→DOCX uses a single strategy (pdf-library-extract); there is no chain.

ENVIRONMENT VARIABLES:
  DOCSHIFT_INCOMING        Staging directory for source files (default: uploads)
  DOCSHIFT_OUTGOING        Output directory (default: downloads)
  DOCSHIFT_OFFICE_TIMEOUT  LibreOffice timeout in seconds (default: 60)
  RUST_LOG                 Tracing filter, e.g. docshift=debug

SETUP:
  No converter binary is required: the text-reflow fallback is built in.
  For full-fidelity output install LibreOffice (`apt-get install libreoffice`)
  so the first strategy in the chain can run.
"#;

/// Convert between PDF and DOCX with a graceful-degradation fallback chain.
#[derive(Parser, Debug)]
#[command(
    name = "docshift",
    version,
    about = "Convert between PDF and DOCX with a graceful-degradation fallback chain",
    long_about = "Convert DOCX files to PDF through an ordered chain of strategies \
(LibreOffice, optionally pandoc, a PDF-library rewrite, and a built-in text reflow), \
and PDF files to DOCX via text extraction. Missing tools degrade quality, never break \
the conversion.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source file (.docx, .doc or .pdf). Optional with --probe-only/--sweep.
    input: Option<PathBuf>,

    /// Target format: pdf or docx. Inferred from the input extension if omitted.
    #[arg(long, value_enum)]
    to: Option<TargetArg>,

    /// Copy the converted file to this path instead of leaving it in the
    /// outgoing directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Staging directory for source files.
    #[arg(long, env = "DOCSHIFT_INCOMING", default_value = "uploads")]
    incoming: PathBuf,

    /// Directory converted files land in.
    #[arg(long, env = "DOCSHIFT_OUTGOING", default_value = "downloads")]
    outgoing: PathBuf,

    /// LibreOffice process timeout in seconds.
    #[arg(long, env = "DOCSHIFT_OFFICE_TIMEOUT", default_value_t = 60)]
    office_timeout: u64,

    /// pandoc process timeout in seconds.
    #[arg(long, env = "DOCSHIFT_CLI_TIMEOUT", default_value_t = 60)]
    cli_timeout: u64,

    /// Maximum source file size in MiB.
    #[arg(long, env = "DOCSHIFT_MAX_SIZE_MIB", default_value_t = 16)]
    max_size_mib: u64,

    /// Insert the pandoc strategy into the DOCX→PDF chain.
    #[arg(long, env = "DOCSHIFT_USE_DOCUMENT_CLI")]
    use_document_cli: bool,

    /// Exit with an error if LibreOffice is not installed instead of
    /// relying on fallback strategies.
    #[arg(long)]
    require_office: bool,

    /// Keep the staged copy of the source file after conversion.
    #[arg(long)]
    keep_source: bool,

    /// Output the structured result as JSON instead of a summary line.
    #[arg(long, env = "DOCSHIFT_JSON")]
    json: bool,

    /// Report which converter binaries are on PATH, then exit.
    #[arg(long)]
    probe_only: bool,

    /// Delete files older than the retention window from both directories,
    /// then exit.
    #[arg(long)]
    sweep: bool,

    /// Retention window for --sweep, in seconds.
    #[arg(long, env = "DOCSHIFT_RETENTION_SECS", default_value_t = 3600)]
    retention_secs: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCSHIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSHIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSHIFT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    Pdf,
    Docx,
}

impl From<TargetArg> for Format {
    fn from(v: TargetArg) -> Self {
        match v {
            TargetArg::Pdf => Format::Pdf,
            TargetArg::Docx => Format::Docx,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner owns the terminal while a conversion runs; keep library
    // logs at error level unless the user explicitly asks for more.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ConverterConfig::builder()
        .incoming_dir(&cli.incoming)
        .outgoing_dir(&cli.outgoing)
        .max_source_bytes(cli.max_size_mib * 1024 * 1024)
        .office_timeout_secs(cli.office_timeout)
        .cli_timeout_secs(cli.cli_timeout)
        .use_document_cli(cli.use_document_cli)
        .retention_secs(cli.retention_secs)
        .build()
        .context("Invalid configuration")?;

    let probe = ToolProbe::discover();

    // ── Probe-only mode ──────────────────────────────────────────────────
    if cli.probe_only {
        let diag = probe.diagnostics();
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&diag).context("Failed to serialise diagnostics")?
            );
        } else {
            println!("OS:          {}", diag.os);
            println!(
                "LibreOffice: {}",
                diag.office.as_deref().unwrap_or("not found")
            );
            println!(
                "pandoc:      {}",
                diag.pandoc.as_deref().unwrap_or("not found")
            );
        }
        return Ok(());
    }

    // ── Sweep mode ───────────────────────────────────────────────────────
    if cli.sweep {
        let max_age = Duration::from_secs(config.retention_secs);
        let mut removed = 0;
        for dir in [&config.incoming_dir, &config.outgoing_dir] {
            if dir.is_dir() {
                removed += sweep_older_than(dir, max_age)
                    .with_context(|| format!("Failed to sweep {}", dir.display()))?;
            }
        }
        if !cli.quiet {
            eprintln!("{} removed {removed} file(s)", green("✔"));
        }
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .context("An input file is required (or use --probe-only / --sweep)")?;

    if cli.require_office {
        probe.require_office()?;
    }

    // ── Resolve the target format ────────────────────────────────────────
    let source_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("'{}' has no usable filename", input.display()))?;
    let target: Format = match cli.to {
        Some(t) => t.into(),
        None => {
            let ext = input
                .extension()
                .and_then(|e| e.to_str())
                .with_context(|| format!("'{}' has no extension; pass --to", input.display()))?;
            match Format::from_extension(ext) {
                Some(Format::Docx) => Format::Pdf,
                Some(Format::Pdf) => Format::Docx,
                None => anyhow::bail!("Unsupported extension '.{ext}'; pass --to pdf|docx"),
            }
        }
    };

    // ── Stage and convert ────────────────────────────────────────────────
    let workspace = Workspace::new(&config)?;
    let job = workspace.plan(source_name, target)?;
    workspace.stage(input, &job.source, config.max_source_bytes)?;
    let mut guard = SourceGuard::new(&job.source);
    if cli.keep_source {
        guard.disarm();
    }

    let request = ConversionRequest::new(
        job.source.clone(),
        job.source_format,
        target,
        workspace.outgoing(),
    )?;

    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(format!("{} → {}", source_name, job.download_name));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let outcome = convert(&request, &config, &probe).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let mut result = outcome.context("Conversion failed")?;

    if let Some(ref out) = cli.output {
        std::fs::copy(&result.output_path, out)
            .with_context(|| format!("Failed to copy result to {}", out.display()))?;
        std::fs::remove_file(&result.output_path).ok();
        result.output_path = out.clone();
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  →  {}  {}",
            green("✔"),
            source_name,
            bold(&result.output_path.display().to_string()),
            dim(&format!("{}ms", result.stats.total_duration_ms)),
        );
        eprintln!(
            "   strategy: {}   download name: {}",
            cyan(&result.strategy_used),
            public_download_name(result.output_file_name()),
        );
        for attempt in &result.diagnostics {
            eprintln!(
                "   {} {}: {} {}",
                red("✗"),
                attempt.strategy,
                attempt.error,
                dim(&format!("{}ms", attempt.duration_ms)),
            );
        }
    }

    Ok(())
}
