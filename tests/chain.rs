//! End-to-end tests for the conversion fallback chain.
//!
//! These run entirely on built-in strategies: every test uses
//! [`ToolProbe::empty`] so the outcome does not depend on whether
//! LibreOffice or pandoc happen to be installed on the host. The source
//! documents are generated in-process with `docx-rs`, and the produced PDF
//! streams are uncompressed, so assertions can grep the output bytes for
//! the original text.

use docshift::{
    convert, convert_upload, public_download_name, ConversionRequest, ConverterConfig,
    ConvertError, Format, ToolProbe,
};
use std::io::Cursor;
use std::path::Path;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A small real DOCX: one Heading1 and two body paragraphs.
fn sample_docx_bytes() -> Vec<u8> {
    let docx = docx_rs::Docx::new()
        .add_paragraph(
            docx_rs::Paragraph::new()
                .add_run(docx_rs::Run::new().add_text("Quarterly Report"))
                .style("Heading1"),
        )
        .add_paragraph(
            docx_rs::Paragraph::new()
                .add_run(docx_rs::Run::new().add_text("Revenue grew in every region.")),
        )
        .add_paragraph(
            docx_rs::Paragraph::new()
                .add_run(docx_rs::Run::new().add_text("Costs were flat.").bold()),
        );
    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

fn test_config(root: &Path) -> ConverterConfig {
    ConverterConfig::builder()
        .incoming_dir(root.join("uploads"))
        .outgoing_dir(root.join("downloads"))
        .build()
        .unwrap()
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ── DOCX → PDF ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn docx_to_pdf_degrades_to_text_reflow_without_tools() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let original = dir.path().join("report.docx");
    std::fs::write(&original, sample_docx_bytes()).unwrap();

    let result = convert_upload(&original, Format::Pdf, &config, &ToolProbe::empty())
        .await
        .unwrap();

    // Without external tools the built-in reflow is the one that lands.
    assert_eq!(result.strategy_used, "text-reflow-fallback");

    // Earlier rungs must show up as recorded failures, in chain order.
    let tried: Vec<&str> = result.diagnostics.iter().map(|a| a.strategy.as_str()).collect();
    assert_eq!(tried, vec!["native-office-automation", "pdf-library-reopen"]);
    assert!(
        result.diagnostics[0].error.contains("not installed"),
        "got: {}",
        result.diagnostics[0].error
    );

    // Output is a real, non-empty PDF carrying the document text.
    let pdf = std::fs::read(&result.output_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert!(contains_bytes(&pdf, b"Quarterly Report"));
    assert!(contains_bytes(&pdf, b"Revenue grew in every region."));

    // The staged source copy is gone; the caller's original is untouched.
    assert!(original.exists());
    assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);

    // The output keeps its job prefix internally but presents clean.
    assert_eq!(public_download_name(result.output_file_name()), "report.pdf");
}

#[tokio::test]
async fn reflow_preserves_paragraph_order_and_headings() {
    let dir = tempfile::tempdir().unwrap();
    let docx = docx_rs::Docx::new()
        .add_paragraph(
            docx_rs::Paragraph::new()
                .add_run(docx_rs::Run::new().add_text("Title"))
                .style("Heading1"),
        )
        .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Body one")))
        .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Body two")));
    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    let source = dir.path().join("titled.docx");
    std::fs::write(&source, cursor.into_inner()).unwrap();

    let request =
        ConversionRequest::new(&source, Format::Docx, Format::Pdf, dir.path()).unwrap();
    let result = convert(&request, &ConverterConfig::default(), &ToolProbe::empty())
        .await
        .unwrap();

    let pdf = std::fs::read(&result.output_path).unwrap();
    let pos = |needle: &[u8]| {
        pdf.windows(needle.len())
            .position(|w| w == needle)
            .unwrap_or_else(|| panic!("{:?} not found in output", String::from_utf8_lossy(needle)))
    };
    // Paragraphs come out in document order.
    assert!(pos(b"Title") < pos(b"Body one"));
    assert!(pos(b"Body one") < pos(b"Body two"));
    // The heading is set in the bold face, the body in the regular one.
    assert!(contains_bytes(&pdf, b"Helvetica-Bold"));
    assert!(contains_bytes(&pdf, b"/Helvetica"));
}

#[tokio::test]
async fn unparseable_docx_exhausts_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    // Right magic, broken ZIP: every strategy gets its chance and fails.
    let source = dir.path().join("broken.docx");
    std::fs::write(&source, b"PK\x03\x04 this is not a real archive").unwrap();
    let request =
        ConversionRequest::new(&source, Format::Docx, Format::Pdf, dir.path()).unwrap();

    let err = convert(&request, &ConverterConfig::default(), &ToolProbe::empty())
        .await
        .unwrap_err();

    match err {
        ConvertError::AllStrategiesFailed { attempts, env, direction } => {
            let tried: Vec<&str> = attempts.iter().map(|a| a.strategy.as_str()).collect();
            assert_eq!(
                tried,
                vec![
                    "native-office-automation",
                    "pdf-library-reopen",
                    "text-reflow-fallback"
                ]
            );
            assert_eq!(direction, "DOCX→PDF");
            // The environment snapshot names the missing tools.
            assert!(env.office.is_none());
        }
        other => panic!("expected AllStrategiesFailed, got {other}"),
    }
    assert!(!request.expected_output().exists());
}

#[tokio::test]
async fn legacy_doc_upload_reaches_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    // An OLE2 header, the container real .doc files use. Without
    // LibreOffice no strategy can read it, but it must get past input
    // validation and through the whole chain rather than being rejected
    // as a mislabeled upload.
    let original = dir.path().join("legacy.doc");
    std::fs::write(&original, [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]).unwrap();

    let err = convert_upload(&original, Format::Pdf, &config, &ToolProbe::empty())
        .await
        .unwrap_err();
    match err {
        ConvertError::AllStrategiesFailed { attempts, .. } => {
            assert_eq!(attempts.len(), 3, "every strategy should have been tried");
        }
        other => panic!("expected AllStrategiesFailed, got {other}"),
    }
}

#[tokio::test]
async fn document_cli_rung_appears_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.docx");
    std::fs::write(&source, b"PK\x03\x04 junk").unwrap();
    let request =
        ConversionRequest::new(&source, Format::Docx, Format::Pdf, dir.path()).unwrap();
    let config = ConverterConfig::builder()
        .use_document_cli(true)
        .build()
        .unwrap();

    let err = convert(&request, &config, &ToolProbe::empty())
        .await
        .unwrap_err();
    match err {
        ConvertError::AllStrategiesFailed { attempts, .. } => {
            let tried: Vec<&str> = attempts.iter().map(|a| a.strategy.as_str()).collect();
            assert_eq!(tried[1], "document-cli");
            assert_eq!(attempts.len(), 4);
        }
        other => panic!("expected AllStrategiesFailed, got {other}"),
    }
}

#[tokio::test]
async fn concurrent_uploads_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let original = dir.path().join("shared.docx");
    std::fs::write(&original, sample_docx_bytes()).unwrap();
    let probe = ToolProbe::empty();

    let (a, b) = tokio::join!(
        convert_upload(&original, Format::Pdf, &config, &probe),
        convert_upload(&original, Format::Pdf, &config, &probe),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Same original name, but each job carries its own unique prefix.
    assert_ne!(a.output_path, b.output_path);
    assert!(a.output_path.exists() && b.output_path.exists());
    assert_eq!(public_download_name(a.output_file_name()), "shared.pdf");
    assert_eq!(public_download_name(b.output_file_name()), "shared.pdf");
}

// ── PDF → DOCX ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_to_docx_single_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    // Build the source PDF with our own reflow writer so the test does not
    // depend on external fixtures.
    let original_docx = dir.path().join("notes.docx");
    std::fs::write(&original_docx, sample_docx_bytes()).unwrap();
    let probe = ToolProbe::empty();
    let pdf_result = convert_upload(&original_docx, Format::Pdf, &config, &probe)
        .await
        .unwrap();
    let source_pdf = dir.path().join("notes.pdf");
    std::fs::copy(&pdf_result.output_path, &source_pdf).unwrap();

    // There is no fallback for this direction: the outcome is either a
    // non-empty DOCX or the extractor's own failure, never an aggregate.
    match convert_upload(&source_pdf, Format::Docx, &config, &probe).await {
        Ok(result) => {
            assert_eq!(result.strategy_used, "pdf-library-extract");
            assert!(result.diagnostics.is_empty());
            let bytes = std::fs::read(&result.output_path).unwrap();
            assert!(bytes.starts_with(b"PK\x03\x04"));
        }
        Err(e) => assert!(
            matches!(e, ConvertError::ToolFailure { .. }),
            "unexpected error: {e}"
        ),
    }
}

#[tokio::test]
async fn pdf_to_docx_reports_extractor_failure_directly() {
    let dir = tempfile::tempdir().unwrap();
    // Valid magic, truncated body.
    let source = dir.path().join("bad.pdf");
    std::fs::write(&source, b"%PDF-1.7\nnot really a pdf").unwrap();
    let request =
        ConversionRequest::new(&source, Format::Pdf, Format::Docx, dir.path()).unwrap();

    let err = convert(&request, &ConverterConfig::default(), &ToolProbe::empty())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ConvertError::ToolFailure { .. }),
        "unexpected error: {err}"
    );
}

// ── Input validation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn oversized_upload_is_rejected_before_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConverterConfig::builder()
        .incoming_dir(dir.path().join("uploads"))
        .outgoing_dir(dir.path().join("downloads"))
        .max_source_bytes(64)
        .build()
        .unwrap();
    let original = dir.path().join("big.docx");
    std::fs::write(&original, sample_docx_bytes()).unwrap();

    let err = convert_upload(&original, Format::Pdf, &config, &ToolProbe::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::InvalidInput { .. }));
}

#[tokio::test]
async fn mislabeled_upload_is_rejected_by_magic_check() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let original = dir.path().join("textfile.docx");
    std::fs::write(&original, b"just plain text, not a zip container").unwrap();

    let err = convert_upload(&original, Format::Pdf, &config, &ToolProbe::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::WrongMagic { .. }));

    // The failed job's staged copy must not linger.
    assert_eq!(
        std::fs::read_dir(dir.path().join("uploads")).unwrap().count(),
        0
    );
}
