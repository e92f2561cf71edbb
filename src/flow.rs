//! Page flow engine – sequential placement of styled text and images onto
//! pages, with automatic pagination.
//!
//! The engine owns the page/cursor state and emits printpdf ops. Text flows
//! word by word: runs are broken into lines against the content width using
//! real glyph advances, each line is placed at the cursor, and a line or
//! image that would overflow the remaining vertical space triggers a page
//! break. Every finished page gets a footer with a centered page number,
//! the only per-page decoration.

use std::fs;

use printpdf::*;

use crate::article::DownloadedImage;
use crate::error::{Error, Result};
use crate::fonts::{face_style, FaceStyle, ResolvedFont};
use crate::inline::StyledRun;

/// A4 page geometry in PDF points (1 pt = 1/72 inch).
pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 841.89;
/// Default page margin in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

pub const BODY_SIZE: f32 = 12.0;
pub const TITLE_SIZE: f32 = 18.0;
pub const META_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

/// Heading sizes for levels 1–6; levels above 6 clamp to the smallest.
const HEADING_SIZES: [f32; 6] = [16.0, 14.0, 13.0, 12.0, 11.0, 11.0];

const LINE_HEIGHT_FACTOR: f32 = 1.45;
const HEADING_SPACE_BEFORE: f32 = 11.0;
const HEADING_SPACE_AFTER: f32 = 6.0;
const PARAGRAPH_SPACING: f32 = 11.0;
const IMAGE_SPACING: f32 = 22.0;
/// Baseline of the page-number footer, measured from the bottom edge.
const FOOTER_BASELINE_PT: f32 = 25.0;

pub const TEXT_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
/// Muted gray for the metadata block.
pub const META_COLOR: [f32; 3] = [0.392, 0.392, 0.392];
const FOOTER_COLOR: [f32; 3] = [0.502, 0.502, 0.502];
/// Fixed accent color for link runs.
const LINK_COLOR: [f32; 3] = [0.0, 0.0, 0.706];

pub(crate) fn heading_size(level: u8) -> f32 {
    HEADING_SIZES[(level.clamp(1, 6) - 1) as usize]
}

/// Downscale-only fit of a `width × height` image into `max_width`,
/// preserving aspect ratio. Input and output units match (points at
/// 1 px = 1 pt).
pub(crate) fn scaled_dimensions(width: f32, height: f32, max_width: f32) -> (f32, f32) {
    let fitted = width.min(max_width);
    let scale = fitted / width;
    (fitted, height * scale)
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Vertical write position on the current page, top-down in points.
///
/// Mutated monotonically within a page; reset to the top margin on each
/// page break.
#[derive(Debug, Clone)]
pub struct PageCursor {
    pub y: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl PageCursor {
    pub fn new(page_width: f32, page_height: f32, margin: f32) -> Self {
        Self {
            y: margin,
            page_width,
            page_height,
            margin,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    fn content_bottom(&self) -> f32 {
        self.page_height - self.margin
    }

    /// Whether `height` more points fit above the bottom margin.
    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.content_bottom()
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn reset(&mut self) {
        self.y = self.margin;
    }
}

// ---------------------------------------------------------------------------
// Line breaking – pure, no page side effects
// ---------------------------------------------------------------------------

/// A styled fragment positioned within one line.
#[derive(Debug, Clone)]
struct Segment {
    text: String,
    style: FaceStyle,
    link: bool,
    /// X offset from the left content edge.
    x: f32,
}

#[derive(Debug, Clone, Default)]
struct Line {
    segments: Vec<Segment>,
}

/// Split text into alternating whitespace / non-whitespace tokens.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_ws: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let ws = c.is_whitespace();
        if prev_ws.is_some_and(|p| p != ws) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_ws = Some(ws);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Greedy word-level line breaking over mixed-style runs.
///
/// A word that would cross the content width wraps to the next line; a word
/// wider than the whole line is written anyway rather than split. Leading
/// whitespace is preserved on the first line (the parser keeps text
/// verbatim) but dropped after automatic wraps.
fn break_into_lines(
    runs: &[StyledRun],
    size: f32,
    content_width: f32,
    font: &ResolvedFont,
) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::default();
    let mut x = 0.0f32;

    for run in runs {
        let style = face_style(run.bold, run.italic);
        let face = font.face(style);
        let link = run.link.is_some();
        let mut seg = Segment {
            text: String::new(),
            style,
            link,
            x,
        };

        for token in tokenize(&run.text) {
            let is_space = token.chars().all(char::is_whitespace);
            let width = face.measure(token, size);

            if !is_space && x > 0.0 && x + width > content_width {
                if !seg.text.is_empty() {
                    line.segments.push(seg);
                }
                lines.push(std::mem::take(&mut line));
                x = 0.0;
                seg = Segment {
                    text: String::new(),
                    style,
                    link,
                    x,
                };
            }

            if is_space && x == 0.0 && seg.text.is_empty() && !lines.is_empty() {
                continue;
            }

            seg.text.push_str(token);
            x += width;
        }

        if !seg.text.is_empty() {
            line.segments.push(seg);
        }
    }

    if !line.segments.is_empty() {
        lines.push(line);
    }
    lines
}

// ---------------------------------------------------------------------------
// Flow engine
// ---------------------------------------------------------------------------

/// Owns one document's page state: the printpdf document, registered font
/// handles, finished pages, and the cursor on the page in progress.
///
/// One instance per render; concurrent renders use independent instances.
pub struct PageFlow<'f> {
    doc: PdfDocument,
    font: &'f ResolvedFont,
    regular_id: FontId,
    bold_id: FontId,
    italic_id: FontId,
    bold_italic_id: FontId,
    cursor: PageCursor,
    ops: Vec<Op>,
    pages: Vec<PdfPage>,
    page_number: usize,
}

impl<'f> PageFlow<'f> {
    /// Start a new document with the resolved font family. Each style's
    /// face is registered with the backend; styles substituting regular
    /// share its handle.
    pub fn new(title: &str, font: &'f ResolvedFont) -> Result<Self> {
        let mut doc = PdfDocument::new(title);

        let regular_id = embed_face(&mut doc, font, FaceStyle::Regular)?;
        let bold_id = if font.has_own_face(FaceStyle::Bold) {
            embed_face(&mut doc, font, FaceStyle::Bold)?
        } else {
            regular_id.clone()
        };
        let italic_id = if font.has_own_face(FaceStyle::Italic) {
            embed_face(&mut doc, font, FaceStyle::Italic)?
        } else {
            regular_id.clone()
        };
        let bold_italic_id = if font.has_own_face(FaceStyle::BoldItalic) {
            embed_face(&mut doc, font, FaceStyle::BoldItalic)?
        } else {
            regular_id.clone()
        };

        Ok(Self {
            doc,
            font,
            regular_id,
            bold_id,
            italic_id,
            bold_italic_id,
            cursor: PageCursor::new(PAGE_WIDTH_PT, PAGE_HEIGHT_PT, PAGE_MARGIN_PT),
            ops: Vec::new(),
            pages: Vec::new(),
            page_number: 1,
        })
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Pages finished so far plus the one in progress.
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    fn font_id(&self, style: FaceStyle) -> FontId {
        match style {
            FaceStyle::Regular => self.regular_id.clone(),
            FaceStyle::Bold => self.bold_id.clone(),
            FaceStyle::Italic => self.italic_id.clone(),
            FaceStyle::BoldItalic => self.bold_italic_id.clone(),
        }
    }

    /// Vertical spacing; collapses at the top of a fresh page because the
    /// next line's overflow check resets the cursor.
    pub fn space(&mut self, dy: f32) {
        self.cursor.advance(dy);
    }

    /// A single-style block of text (title, metadata lines).
    pub fn write_text_block(&mut self, text: &str, style: FaceStyle, size: f32, color: [f32; 3]) {
        let runs = [StyledRun {
            text: text.to_string(),
            bold: matches!(style, FaceStyle::Bold | FaceStyle::BoldItalic),
            italic: matches!(style, FaceStyle::Italic | FaceStyle::BoldItalic),
            link: None,
        }];
        self.flow_runs(&runs, size, color);
    }

    /// Heading: spacing, one bold run at the level-derived size, spacing.
    /// Headings are plain text; no inline markup applies.
    pub fn write_heading(&mut self, text: &str, level: u8) {
        self.space(HEADING_SPACE_BEFORE);
        self.write_text_block(text, FaceStyle::Bold, heading_size(level), TEXT_COLOR);
        self.space(HEADING_SPACE_AFTER);
    }

    /// Body paragraph from resolved styled runs, with trailing spacing.
    /// Link runs take the accent color; the default color returns with the
    /// next run.
    pub fn write_paragraph(&mut self, runs: &[StyledRun]) {
        self.flow_runs(runs, BODY_SIZE, TEXT_COLOR);
        self.space(PARAGRAPH_SPACING);
    }

    fn flow_runs(&mut self, runs: &[StyledRun], size: f32, base_color: [f32; 3]) {
        let line_height = size * LINE_HEIGHT_FACTOR;
        let lines = break_into_lines(runs, size, self.cursor.content_width(), self.font);
        for line in &lines {
            self.emit_line(line, size, line_height, base_color);
        }
    }

    fn emit_line(&mut self, line: &Line, size: f32, line_height: f32, base_color: [f32; 3]) {
        if line.segments.is_empty() {
            self.cursor.advance(line_height);
            return;
        }
        if !self.cursor.fits(line_height) {
            self.finish_page();
        }

        // All segments share one baseline, placed by the tallest ascender.
        let ascender = line
            .segments
            .iter()
            .map(|s| self.font.face(s.style).ascender_pt(size))
            .fold(0.0f32, f32::max);
        let baseline_y = self.cursor.page_height - (self.cursor.y + ascender);

        for seg in &line.segments {
            let font_id = self.font_id(seg.style);
            let color = if seg.link { LINK_COLOR } else { base_color };
            let x = self.cursor.margin + seg.x;

            self.ops.push(Op::StartTextSection);
            self.ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(x),
                    y: Pt(baseline_y),
                },
            });
            self.ops.push(Op::SetFillColor {
                col: Color::Rgb(Rgb {
                    r: color[0],
                    g: color[1],
                    b: color[2],
                    icc_profile: None,
                }),
            });
            self.ops.push(Op::SetFontSize {
                size: Pt(size),
                font: font_id.clone(),
            });
            self.ops.push(Op::SetLineHeight {
                lh: Pt(line_height),
            });
            self.ops.push(Op::WriteText {
                items: vec![TextItem::Text(seg.text.clone())],
                font: font_id,
            });
            self.ops.push(Op::EndTextSection);
        }

        self.cursor.advance(line_height);
    }

    /// Place an image scaled down to `max_width`, centered horizontally,
    /// breaking the page first when its height exceeds the remaining space.
    ///
    /// Any loading or decode failure skips the image and leaves the layout
    /// undisturbed: one bad image never aborts the document.
    pub fn insert_image(&mut self, img: &DownloadedImage, max_width: f32) {
        if let Err(reason) = self.try_insert_image(img, max_width) {
            log::warn!("skipping image '{}' — {reason}", img.path.display());
        }
    }

    fn try_insert_image(&mut self, img: &DownloadedImage, max_width: f32) -> std::result::Result<(), String> {
        let bytes = fs::read(&img.path).map_err(|e| e.to_string())?;

        // Decode with the `image` crate first: validates the file and gives
        // the pixel dimensions the embed transform needs, before any cursor
        // mutation.
        let decoded = ::image::load_from_memory(&bytes).map_err(|e| format!("decode error: {e}"))?;
        let (px_w, px_h) = (decoded.width(), decoded.height());
        if px_w == 0 || px_h == 0 || img.width == 0 || img.height == 0 {
            return Err("image has zero dimension".to_string());
        }

        // Layout math runs on the dimensions the download stage declared.
        let (width_pt, height_pt) =
            scaled_dimensions(img.width as f32, img.height as f32, max_width);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let raw = RawImage::decode_from_bytes(&bytes, &mut warnings)
            .map_err(|e| format!("PDF encode error: {e}"))?;
        let xobj_id = self.doc.add_image(&raw);

        if !self.cursor.fits(height_pt) {
            self.finish_page();
        }

        let x = self.cursor.margin + (self.cursor.content_width() - width_pt) / 2.0;
        // PDF origin is bottom-left; translate to the image's bottom edge.
        let bottom_y = self.cursor.page_height - (self.cursor.y + height_pt);

        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
        self.ops.push(Op::UseXobject {
            id: xobj_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(bottom_y)),
                dpi: Some(72.0),
                scale_x: Some(width_pt / px_w as f32),
                scale_y: Some(height_pt / px_h as f32),
                rotate: None,
            },
        });

        self.cursor.advance(height_pt + IMAGE_SPACING);
        Ok(())
    }

    /// Close the page in progress: footer, push, fresh ops, cursor to top.
    fn finish_page(&mut self) {
        self.render_footer();
        let page = PdfPage::new(
            Mm(self.cursor.page_width * 0.352778),
            Mm(self.cursor.page_height * 0.352778),
            std::mem::take(&mut self.ops),
        );
        self.pages.push(page);
        self.page_number += 1;
        self.cursor.reset();
    }

    fn render_footer(&mut self) {
        let text = format!("Page {}", self.page_number);
        let face = self.font.face(FaceStyle::Regular);
        let width = face.measure(&text, FOOTER_SIZE);
        let x = (self.cursor.page_width - width) / 2.0;

        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(x),
                y: Pt(FOOTER_BASELINE_PT),
            },
        });
        self.ops.push(Op::SetFillColor {
            col: Color::Rgb(Rgb {
                r: FOOTER_COLOR[0],
                g: FOOTER_COLOR[1],
                b: FOOTER_COLOR[2],
                icc_profile: None,
            }),
        });
        self.ops.push(Op::SetFontSize {
            size: Pt(FOOTER_SIZE),
            font: self.regular_id.clone(),
        });
        self.ops.push(Op::WriteText {
            items: vec![TextItem::Text(text)],
            font: self.regular_id.clone(),
        });
        self.ops.push(Op::EndTextSection);
    }

    /// Finalize: footer on the last page, then serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.finish_page();
        let mut doc = self.doc;
        doc.with_pages(self.pages);
        let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
        Ok(bytes)
    }
}

fn embed_face(doc: &mut PdfDocument, font: &ResolvedFont, style: FaceStyle) -> Result<FontId> {
    let face = font.face(style);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let parsed = ParsedFont::from_bytes(&face.bytes, 0, &mut warnings).ok_or_else(|| {
        Error::FontLoadFailure {
            path: face.path.display().to_string(),
            reason: "rendering backend rejected the font file".to_string(),
        }
    })?;
    Ok(doc.add_font(&parsed))
}
