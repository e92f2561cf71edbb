//! Markdown renderer – the lightweight sibling of the PDF pipeline.
//!
//! Shares the article model and the image interleaving policy with the PDF
//! renderer, but emits plain Markdown: no fonts, no pagination. Useful when
//! the caller wants the extracted article in a form other tools can ingest.

use std::path::{Path, PathBuf};

use crate::article::{Article, ContentBlock, DownloadedImage, ImagePolicy, RenderOptions};
use crate::error::Result;
use crate::inline::{parse_inline, resolve_runs, StyledRun};
use crate::render::{image_interval, write_output};

/// Render an article to a Markdown file at `output_path`.
pub fn render(
    article: &Article,
    images: &[DownloadedImage],
    output_path: &Path,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let text = render_string(article, images, options);
    write_output(output_path, text.as_bytes())?;
    Ok(output_path.to_path_buf())
}

/// Build the full Markdown document as a string.
pub fn render_string(
    article: &Article,
    images: &[DownloadedImage],
    options: &RenderOptions,
) -> String {
    let mut out = String::new();
    let title = options.title.as_deref().unwrap_or(&article.title);
    out.push_str(&format!("# {title}\n\n"));

    if !article.authors.is_empty() {
        out.push_str(&format!("*Authors: {}*\n", article.authors.join(", ")));
    }
    out.push_str(&format!("*Source: {}*\n", article.source_url));
    if let Some(published) = &article.published {
        out.push_str(&format!("*Published: {published}*\n"));
    }
    out.push('\n');

    let mut queue: std::collections::VecDeque<&DownloadedImage> = match options.images {
        ImagePolicy::Interleave => images.iter().collect(),
        ImagePolicy::Omit => Default::default(),
    };

    if let Some(lead) = queue.pop_front() {
        push_image(&mut out, lead);
    }

    let interval = image_interval(article.paragraph_count(), queue.len());
    let mut paragraph_idx = 0usize;

    for block in &article.blocks {
        match block {
            ContentBlock::Heading { text, level } => {
                let hashes = "#".repeat((*level).clamp(1, 6) as usize);
                out.push_str(&format!("{hashes} {text}\n\n"));
            }
            ContentBlock::Paragraph { text, html } => {
                let source = html.as_deref().unwrap_or(text);
                out.push_str(&paragraph_to_markdown(source));
                out.push_str("\n\n");

                paragraph_idx += 1;
                if interval > 0 && paragraph_idx % interval == 0 {
                    if let Some(img) = queue.pop_front() {
                        push_image(&mut out, img);
                    }
                }
            }
        }
    }

    for img in queue {
        push_image(&mut out, img);
    }

    out
}

fn push_image(out: &mut String, img: &DownloadedImage) {
    out.push_str(&format!("![]({})\n\n", img.path.display()));
}

fn paragraph_to_markdown(source: &str) -> String {
    resolve_runs(&parse_inline(source))
        .iter()
        .map(run_to_markdown)
        .collect()
}

/// Map one styled run to Markdown, keeping surrounding whitespace outside
/// the emphasis markers so adjacent runs join cleanly.
fn run_to_markdown(run: &StyledRun) -> String {
    let trimmed = run.text.trim();
    if trimmed.is_empty() {
        return run.text.clone();
    }
    let lead = &run.text[..run.text.len() - run.text.trim_start().len()];
    let trail = &run.text[run.text.trim_end().len()..];

    let mut inner = match (run.bold, run.italic) {
        (true, true) => format!("***{trimmed}***"),
        (true, false) => format!("**{trimmed}**"),
        (false, true) => format!("*{trimmed}*"),
        (false, false) => trimmed.to_string(),
    };
    if let Some(url) = &run.link {
        inner = format!("[{inner}]({url})");
    }
    format!("{lead}{inner}{trail}")
}
