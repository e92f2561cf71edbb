//! Document renderer – ties fonts, inline parsing, and the page flow
//! together into a single render call and persists the result.
//!
//! Order of operations: title block, metadata block, lead image, content
//! blocks with images interleaved between paragraphs, leftover images, then
//! one atomic write of the finished bytes. Font-resolution and output-write
//! failures abort the render; individual bad images are skipped by the flow
//! engine.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::article::{Article, ContentBlock, DownloadedImage, ImagePolicy, RenderOptions};
use crate::error::{Error, Result};
use crate::flow::{PageFlow, META_COLOR, META_SIZE, TEXT_COLOR, TITLE_SIZE};
use crate::fonts::{FaceStyle, ResolvedFont};
use crate::inline::{parse_inline, resolve_runs};
use crate::markdown;

const TITLE_SPACING: f32 = 14.0;
const META_LINE_SPACING: f32 = 3.0;
const META_BLOCK_SPACING: f32 = 28.0;

/// Supported output formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pdf,
    Markdown,
}

impl OutputFormat {
    /// Infer the format from a destination path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(OutputFormat::Pdf),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Interval between image insertions: one image after every `interval`-th
/// paragraph. Zero when there are no images to interleave.
///
/// Deliberately paragraph-count-based, blind to rendered heights; the
/// distribution is deterministic, not typographically balanced.
pub(crate) fn image_interval(paragraphs: usize, images: usize) -> usize {
    if images == 0 {
        0
    } else {
        (paragraphs / (images + 1)).max(1)
    }
}

/// Render an article to a paginated PDF at `output_path`.
///
/// `images` is the download stage's output: the lead image, when present,
/// is index 0 and lands at the top at full content width; the rest are
/// interleaved between paragraphs. Returns the written path.
pub fn render(
    article: &Article,
    images: &[DownloadedImage],
    output_path: &Path,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let font = ResolvedFont::resolve(options.font_family.as_deref())?;
    let title = options.title.as_deref().unwrap_or(&article.title);

    let mut flow = PageFlow::new(title, &font)?;
    let content_width = flow.cursor().content_width();

    // Title block: one large bold run.
    flow.write_text_block(title, FaceStyle::Bold, TITLE_SIZE, TEXT_COLOR);
    flow.space(TITLE_SPACING);

    // Metadata block, muted.
    if !article.authors.is_empty() {
        let line = format!("Authors: {}", article.authors.join(", "));
        flow.write_text_block(&line, FaceStyle::Regular, META_SIZE, META_COLOR);
        flow.space(META_LINE_SPACING);
    }
    let source_line = format!("Source: {}", article.source_url);
    flow.write_text_block(&source_line, FaceStyle::Regular, META_SIZE, META_COLOR);
    if let Some(published) = &article.published {
        flow.space(META_LINE_SPACING);
        let line = format!("Published: {published}");
        flow.write_text_block(&line, FaceStyle::Regular, META_SIZE, META_COLOR);
    }
    flow.space(META_BLOCK_SPACING);

    let mut queue: VecDeque<&DownloadedImage> = match options.images {
        ImagePolicy::Interleave => images.iter().collect(),
        ImagePolicy::Omit => VecDeque::new(),
    };

    // Lead image at full content width.
    if let Some(lead) = queue.pop_front() {
        flow.insert_image(lead, content_width);
    }

    let interval = image_interval(article.paragraph_count(), queue.len());
    let mut paragraph_idx = 0usize;

    for block in &article.blocks {
        match block {
            ContentBlock::Heading { text, level } => flow.write_heading(text, *level),
            ContentBlock::Paragraph { text, html } => {
                let source = html.as_deref().unwrap_or(text);
                let runs = resolve_runs(&parse_inline(source));
                flow.write_paragraph(&runs);

                paragraph_idx += 1;
                if interval > 0 && paragraph_idx % interval == 0 {
                    if let Some(img) = queue.pop_front() {
                        flow.insert_image(img, content_width);
                    }
                }
            }
        }
    }

    // Whatever the interval did not place goes at the very end.
    for img in queue {
        flow.insert_image(img, content_width);
    }

    let bytes = flow.finish()?;
    write_output(output_path, &bytes)?;
    Ok(output_path.to_path_buf())
}

/// Render to the format inferred from the output path's extension.
pub fn render_document(
    article: &Article,
    images: &[DownloadedImage],
    output_path: &Path,
    options: &RenderOptions,
) -> Result<PathBuf> {
    match OutputFormat::from_path(output_path) {
        Some(OutputFormat::Pdf) => render(article, images, output_path, options),
        Some(OutputFormat::Markdown) => markdown::render(article, images, output_path, options),
        None => Err(Error::UnknownOutputFormat {
            path: output_path.display().to_string(),
        }),
    }
}

/// One-shot write of the finished document. The bytes are fully built
/// before this call, so a failure leaves no partial side files behind.
pub(crate) fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| Error::OutputWriteFailure {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_formula() {
        // N=10 paragraphs, K=3 images → max(1, 10 / 4) = 2
        assert_eq!(image_interval(10, 3), 2);
        // More images than paragraphs still yields at least 1.
        assert_eq!(image_interval(2, 9), 1);
        assert_eq!(image_interval(0, 3), 1);
        // No images → no interval logic at all.
        assert_eq!(image_interval(10, 0), 0);
    }

    #[test]
    fn format_inference() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out.pdf")),
            Some(OutputFormat::Pdf)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.MD")),
            Some(OutputFormat::Markdown)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.markdown")),
            Some(OutputFormat::Markdown)
        );
        assert_eq!(OutputFormat::from_path(Path::new("out.epub")), None);
        assert_eq!(OutputFormat::from_path(Path::new("noext")), None);
    }
}
