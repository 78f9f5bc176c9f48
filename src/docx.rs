//! Minimal DOCX structure reader for the text-reflow fallback.
//!
//! DOCX files are ZIP archives; all the content this crate cares about
//! lives in `word/document.xml`. Parsing is manual ZIP + streaming XML
//! (docx-rs is writer-only), and deliberately shallow: paragraphs, runs,
//! heading levels 1–3 (`w:pStyle` / `w:outlineLvl`), and per-run
//! bold/italic/underline. Tables (`w:tbl`), images, numbering, and layout
//! are skipped; the reflow strategy is a lossy last resort and documents
//! that loss rather than approximating it.

use crate::error::StrategyError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Paragraph style after mapping: heading levels 1–3 are kept distinct,
/// every other style collapses to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphStyle {
    Heading1,
    Heading2,
    Heading3,
    #[default]
    Normal,
}

impl ParagraphStyle {
    fn from_heading_level(level: u8) -> Self {
        match level {
            1 => ParagraphStyle::Heading1,
            2 => ParagraphStyle::Heading2,
            3 => ParagraphStyle::Heading3,
            _ => ParagraphStyle::Normal,
        }
    }
}

/// A contiguous stretch of text with uniform formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// One paragraph: a style plus its runs, in document order.
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

/// The flattened document: top-level paragraphs in order.
#[derive(Debug, Clone, Default)]
pub struct DocxDocument {
    pub paragraphs: Vec<Paragraph>,
}

/// Read and flatten a DOCX file from disk.
pub fn read_docx(path: &Path) -> Result<DocxDocument, StrategyError> {
    let file = std::fs::File::open(path).map_err(|e| StrategyError::Parse {
        detail: format!("cannot open '{}': {e}", path.display()),
    })?;
    read_archive(ZipArchive::new(file).map_err(|e| StrategyError::Parse {
        detail: format!("'{}' is not a ZIP archive: {e}", path.display()),
    })?)
}

/// Read and flatten a DOCX from an in-memory buffer.
pub fn read_docx_bytes(bytes: &[u8]) -> Result<DocxDocument, StrategyError> {
    read_archive(
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| StrategyError::Parse {
            detail: format!("buffer is not a ZIP archive: {e}"),
        })?,
    )
}

fn read_archive<R: Read + Seek>(mut archive: ZipArchive<R>) -> Result<DocxDocument, StrategyError> {
    let xml = {
        let mut entry =
            archive
                .by_name("word/document.xml")
                .map_err(|e| StrategyError::Parse {
                    detail: format!("missing word/document.xml: {e}"),
                })?;
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| StrategyError::Parse {
                detail: format!("cannot read word/document.xml: {e}"),
            })?;
        content
    };
    walk_document(&xml)
}

/// Extract an attribute value by key from an element.
fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// True if `w:val` explicitly disables the property ("0", "false", "none").
fn val_off(e: &BytesStart) -> bool {
    matches!(
        get_attr(e, b"w:val").as_deref(),
        Some("0") | Some("false") | Some("none")
    )
}

/// Map a `w:pStyle` value like `Heading1` to a heading level.
fn heading_level_from_style(style_id: &str) -> Option<u8> {
    let lower = style_id.to_ascii_lowercase();
    let digits = lower.strip_prefix("heading")?;
    digits.trim().parse::<u8>().ok().filter(|l| (1..=3).contains(l))
}

/// Single streaming pass over `word/document.xml`.
fn walk_document(xml: &str) -> Result<DocxDocument, StrategyError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut doc = DocxDocument::default();
    let mut para: Option<Paragraph> = None;
    let mut run: Option<Run> = None;
    let mut in_run_props = false;
    let mut in_text = false;
    // Paragraphs inside tables are dropped entirely; depth handles nesting.
    let mut table_depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" if table_depth == 0 => para = Some(Paragraph::default()),
                b"w:r" if para.is_some() => run = Some(Run::default()),
                b"w:rPr" if run.is_some() => in_run_props = true,
                b"w:t" if run.is_some() => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:pStyle" => {
                    if let (Some(p), Some(val)) = (para.as_mut(), get_attr(&e, b"w:val")) {
                        if let Some(level) = heading_level_from_style(&val) {
                            p.style = ParagraphStyle::from_heading_level(level);
                        }
                    }
                }
                b"w:outlineLvl" => {
                    // outlineLvl is 0-based; only honour it when no pStyle
                    // already set a heading.
                    if let Some(p) = para.as_mut() {
                        if p.style == ParagraphStyle::Normal {
                            if let Some(lvl) =
                                get_attr(&e, b"w:val").and_then(|v| v.parse::<u8>().ok())
                            {
                                p.style = ParagraphStyle::from_heading_level(lvl + 1);
                            }
                        }
                    }
                }
                b"w:b" | b"w:bCs" if in_run_props => {
                    if let Some(r) = run.as_mut() {
                        r.bold = !val_off(&e);
                    }
                }
                b"w:i" | b"w:iCs" if in_run_props => {
                    if let Some(r) = run.as_mut() {
                        r.italic = !val_off(&e);
                    }
                }
                b"w:u" if in_run_props => {
                    if let Some(r) = run.as_mut() {
                        r.underline = !val_off(&e);
                    }
                }
                b"w:tab" | b"w:br" => {
                    if let Some(r) = run.as_mut() {
                        r.text.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| StrategyError::Parse {
                    detail: format!("bad XML text: {e}"),
                })?;
                if let Some(r) = run.as_mut() {
                    r.text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:rPr" => in_run_props = false,
                b"w:r" => {
                    if let (Some(p), Some(r)) = (para.as_mut(), run.take()) {
                        if !r.text.is_empty() {
                            p.runs.push(r);
                        }
                    }
                }
                b"w:p" => {
                    if let Some(p) = para.take() {
                        doc.paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StrategyError::Parse {
                    detail: format!("XML error in word/document.xml: {e}"),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml_body: &str) -> DocxDocument {
        let xml = format!(
            r#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{xml_body}</w:body></w:document>"#
        );
        walk_document(&xml).unwrap()
    }

    #[test]
    fn plain_paragraphs_in_order() {
        let doc = parse(
            "<w:p><w:r><w:t>first</w:t></w:r></w:p>\
             <w:p><w:r><w:t>second</w:t></w:r></w:p>",
        );
        let texts: Vec<String> = doc.paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn heading_styles_mapped_and_others_collapse() {
        let doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>h1</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Heading3"/></w:pPr><w:r><w:t>h3</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Heading7"/></w:pPr><w:r><w:t>deep</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Quote"/></w:pPr><w:r><w:t>quote</w:t></w:r></w:p>"#,
        );
        let styles: Vec<ParagraphStyle> = doc.paragraphs.iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![
                ParagraphStyle::Heading1,
                ParagraphStyle::Heading3,
                ParagraphStyle::Normal,
                ParagraphStyle::Normal,
            ]
        );
    }

    #[test]
    fn run_formatting_flags() {
        let doc = parse(
            r#"<w:p><w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>bi</w:t></w:r>
               <w:r><w:rPr><w:u w:val="single"/></w:rPr><w:t>u</w:t></w:r>
               <w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>plain</w:t></w:r></w:p>"#,
        );
        let runs = &doc.paragraphs[0].runs;
        assert!(runs[0].bold && runs[0].italic && !runs[0].underline);
        assert!(runs[1].underline && !runs[1].bold);
        assert!(!runs[2].bold);
    }

    #[test]
    fn table_content_is_dropped() {
        let doc = parse(
            "<w:p><w:r><w:t>before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>after</w:t></w:r></w:p>",
        );
        let texts: Vec<String> = doc.paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["before", "after"]);
    }

    #[test]
    fn outline_level_sets_heading_when_no_style() {
        let doc = parse(
            r#"<w:p><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:r><w:t>top</w:t></w:r></w:p>"#,
        );
        assert_eq!(doc.paragraphs[0].style, ParagraphStyle::Heading1);
    }

    #[test]
    fn roundtrip_through_docx_rs_writer() {
        use docx_rs::{Docx, Paragraph as DxParagraph, Run as DxRun};

        let docx = Docx::new()
            .add_paragraph(
                DxParagraph::new()
                    .add_run(DxRun::new().add_text("Title"))
                    .style("Heading1"),
            )
            .add_paragraph(DxParagraph::new().add_run(DxRun::new().add_text("Body one").bold()))
            .add_paragraph(DxParagraph::new().add_run(DxRun::new().add_text("Body two")));

        let mut cursor = Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();

        let doc = read_docx_bytes(cursor.get_ref()).unwrap();
        let texts: Vec<String> = doc
            .paragraphs
            .iter()
            .filter(|p| !p.is_empty())
            .map(Paragraph::text)
            .collect();
        assert_eq!(texts, vec!["Title", "Body one", "Body two"]);

        let title = doc.paragraphs.iter().find(|p| p.text() == "Title").unwrap();
        assert_eq!(title.style, ParagraphStyle::Heading1);
        let body_one = doc
            .paragraphs
            .iter()
            .find(|p| p.text() == "Body one")
            .unwrap();
        assert!(body_one.runs[0].bold);
    }
}
