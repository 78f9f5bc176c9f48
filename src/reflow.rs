//! Generic paragraph-oriented PDF builder for the text-reflow fallback.
//!
//! ## Why build PDFs by hand?
//!
//! The reflow strategy only ever needs paragraphs of styled text: heading
//! sizes, bold/italic/underline runs, and vertical spacing. That is small
//! enough to emit directly as lopdf objects with the standard Helvetica
//! family (no font embedding, no layout engine), which keeps the last-resort
//! strategy dependency-free of any external tool. Content streams are left
//! uncompressed; output size is not a goal for a fallback artifact and the
//! text stays greppable.
//!
//! Line widths use an approximate per-character advance rather than real
//! Helvetica metrics. Wrapping is therefore conservative, not exact.

use crate::docx::{ParagraphStyle, Run};
use crate::error::StrategyError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

// A4 in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

// Approximate Helvetica advance as a fraction of font size.
const CHAR_WIDTH_FACTOR: f32 = 0.5;

/// Font resource names, indexed by (bold, italic).
fn font_name(bold: bool, italic: bool) -> &'static str {
    match (bold, italic) {
        (false, false) => "F1",
        (true, false) => "F2",
        (false, true) => "F3",
        (true, true) => "F4",
    }
}

/// Size and spacing for a paragraph style.
fn style_metrics(style: ParagraphStyle) -> StyleMetrics {
    match style {
        ParagraphStyle::Heading1 => StyleMetrics {
            size: 18.0,
            space_before: 14.0,
            space_after: 8.0,
            force_bold: true,
        },
        ParagraphStyle::Heading2 => StyleMetrics {
            size: 15.0,
            space_before: 12.0,
            space_after: 6.0,
            force_bold: true,
        },
        ParagraphStyle::Heading3 => StyleMetrics {
            size: 13.0,
            space_before: 10.0,
            space_after: 5.0,
            force_bold: true,
        },
        ParagraphStyle::Normal => StyleMetrics {
            size: 11.0,
            space_before: 0.0,
            space_after: 5.0,
            force_bold: false,
        },
    }
}

struct StyleMetrics {
    size: f32,
    space_before: f32,
    space_after: f32,
    force_bold: bool,
}

/// One styled fragment placed on a line.
struct Segment {
    font: &'static str,
    size: f32,
    text: String,
    underline: bool,
    width: f32,
}

/// Incremental PDF document builder: paragraphs in, bytes out.
pub struct ReflowPdf {
    finished_pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    /// Cursor measured from the bottom of the page.
    y: f32,
}

impl Default for ReflowPdf {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflowPdf {
    pub fn new() -> Self {
        Self {
            finished_pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Append a paragraph, wrapping runs greedily at the text width.
    ///
    /// Empty paragraphs become vertical space, matching how Word renders a
    /// paragraph with no text.
    pub fn add_paragraph(&mut self, style: ParagraphStyle, runs: &[Run]) {
        let metrics = style_metrics(style);
        if runs.iter().all(|r| r.text.trim().is_empty()) {
            self.add_spacer(metrics.size * 1.2);
            return;
        }

        self.advance(metrics.space_before);

        let leading = metrics.size * 1.35;
        let mut line: Vec<Segment> = Vec::new();
        let mut line_width = 0.0_f32;

        for run in runs {
            let bold = run.bold || metrics.force_bold;
            let font = font_name(bold, run.italic);
            for word in split_keeping_spaces(&run.text) {
                let width = word.chars().count() as f32 * metrics.size * CHAR_WIDTH_FACTOR;
                if line_width + width > TEXT_WIDTH && !line.is_empty() {
                    self.flush_line(&line, leading);
                    line.clear();
                    line_width = 0.0;
                    // Drop a leading space carried onto the new line.
                    if word.trim().is_empty() {
                        continue;
                    }
                }
                match line.last_mut() {
                    // Merge consecutive words with identical formatting so
                    // the content stream stays compact.
                    Some(seg) if seg.font == font && seg.underline == run.underline => {
                        seg.text.push_str(&word);
                        seg.width += width;
                    }
                    _ => line.push(Segment {
                        font,
                        size: metrics.size,
                        text: word,
                        underline: run.underline,
                        width,
                    }),
                }
                line_width += width;
            }
        }
        if !line.is_empty() {
            self.flush_line(&line, leading);
        }

        self.advance(metrics.space_after);
    }

    /// Insert vertical space.
    pub fn add_spacer(&mut self, points: f32) {
        self.advance(points);
    }

    /// Serialize all pages into a PDF byte buffer.
    pub fn finish(mut self) -> Result<Vec<u8>, StrategyError> {
        if !self.ops.is_empty() || self.finished_pages.is_empty() {
            let ops = std::mem::take(&mut self.ops);
            self.finished_pages.push(ops);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let base_fonts = [
            ("F1", "Helvetica"),
            ("F2", "Helvetica-Bold"),
            ("F3", "Helvetica-Oblique"),
            ("F4", "Helvetica-BoldOblique"),
        ];
        let mut font_dict = lopdf::Dictionary::new();
        for (res_name, base_font) in base_fonts {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base_font,
            });
            font_dict.set(res_name, font_id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => Object::Dictionary(font_dict),
        });

        let mut kids: Vec<Object> = Vec::new();
        let page_count = self.finished_pages.len();
        for operations in self.finished_pages {
            let content = Content { operations };
            let encoded = content.encode().map_err(|e| StrategyError::Render {
                detail: format!("content stream encoding failed: {e}"),
            })?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(|e| StrategyError::Render {
            detail: format!("PDF serialization failed: {e}"),
        })?;
        Ok(out)
    }

    /// Move the cursor down, breaking the page when the bottom margin is hit.
    fn advance(&mut self, points: f32) {
        if self.y - points < MARGIN {
            self.break_page();
        } else {
            self.y -= points;
        }
    }

    fn break_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.finished_pages.push(ops);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Emit one laid-out line at the current cursor.
    fn flush_line(&mut self, segments: &[Segment], leading: f32) {
        if self.y - leading < MARGIN {
            self.break_page();
        }
        self.y -= leading;

        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Td",
            vec![MARGIN.into(), self.y.into()],
        ));
        for seg in segments {
            self.ops.push(Operation::new(
                "Tf",
                vec![seg.font.into(), seg.size.into()],
            ));
            self.ops
                .push(Operation::new("Tj", vec![Object::string_literal(seg.text.clone())]));
        }
        self.ops.push(Operation::new("ET", vec![]));

        // Underlines are plain stroked lines below the baseline; they have
        // to sit outside the BT/ET block.
        let mut x = MARGIN;
        for seg in segments {
            if seg.underline {
                let y = self.y - 2.0;
                self.ops.push(Operation::new("w", vec![0.6_f32.into()]));
                self.ops.push(Operation::new("m", vec![x.into(), y.into()]));
                self.ops
                    .push(Operation::new("l", vec![(x + seg.width).into(), y.into()]));
                self.ops.push(Operation::new("S", vec![]));
            }
            x += seg.width;
        }
    }
}

/// Split text into words, each keeping its trailing spaces, so wrapping
/// never eats inter-word spacing mid-line.
fn split_keeping_spaces(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_space = false;
    for c in text.chars() {
        let is_space = c == ' ';
        if !is_space && in_space && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        in_space = is_space;
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_run(text: &str) -> Run {
        Run {
            text: text.into(),
            ..Run::default()
        }
    }

    #[test]
    fn output_is_a_pdf_with_text() {
        let mut pdf = ReflowPdf::new();
        pdf.add_paragraph(ParagraphStyle::Heading1, &[plain_run("Hello Heading")]);
        pdf.add_paragraph(ParagraphStyle::Normal, &[plain_run("Body text here.")]);
        let bytes = pdf.finish().unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let raw = String::from_utf8_lossy(&bytes);
        assert!(raw.contains("Hello Heading"), "text missing from stream");
        assert!(raw.contains("Body text here."));
        assert!(raw.contains("Helvetica-Bold"), "heading should be bold");
    }

    #[test]
    fn empty_document_still_serializes() {
        let bytes = ReflowPdf::new().finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_text_breaks_pages() {
        let mut pdf = ReflowPdf::new();
        for i in 0..200 {
            pdf.add_paragraph(ParagraphStyle::Normal, &[plain_run(&format!("line {i}"))]);
        }
        let bytes = pdf.finish().unwrap();
        let raw = String::from_utf8_lossy(&bytes);
        // More than one /Page object besides the /Pages tree node.
        let page_nodes = raw.matches("/Type /Page").count();
        assert!(page_nodes > 2, "expected multiple pages, got {page_nodes}");
    }

    #[test]
    fn split_keeps_spaces_attached() {
        assert_eq!(split_keeping_spaces("a b  c"), vec!["a ", "b  ", "c"]);
        assert_eq!(split_keeping_spaces("one"), vec!["one"]);
        assert!(split_keeping_spaces("").is_empty());
    }

    #[test]
    fn underlined_run_strokes_a_line() {
        let mut pdf = ReflowPdf::new();
        pdf.add_paragraph(
            ParagraphStyle::Normal,
            &[Run {
                text: "under".into(),
                underline: true,
                ..Run::default()
            }],
        );
        let bytes = pdf.finish().unwrap();
        let raw = String::from_utf8_lossy(&bytes);
        assert!(raw.contains(" S"), "expected a stroke operator");
    }
}
