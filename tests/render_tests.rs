//! Integration tests for the article-press pipeline.
//!
//! These tests validate:
//! - Inline parsing invariants at the public API
//! - Font resolution behavior and error reporting
//! - End-to-end PDF and Markdown rendering
//! - Image resilience (corrupt files never abort a render)
//!
//! Tests that embed a real font detect availability first and return early
//! on hosts with none of the registry families installed.

use std::fs;
use std::path::{Path, PathBuf};

use article_press::inline::{parse_inline, resolve_runs, InlineToken};
use article_press::{
    list_available_fonts, render, render_document, Article, ContentBlock, DownloadedImage, Error,
    RenderOptions, ResolvedFont,
};

// =====================================================================
// Helpers
// =====================================================================

fn fonts_installed() -> bool {
    if list_available_fonts().is_empty() {
        eprintln!("skipping: no registry font families installed on this host");
        return false;
    }
    true
}

fn assert_valid_pdf(path: &Path) {
    let bytes = fs::read(path).expect("output file should exist");
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn paragraph(text: &str) -> ContentBlock {
    ContentBlock::Paragraph {
        text: text.to_string(),
        html: None,
    }
}

fn html_paragraph(html: &str) -> ContentBlock {
    ContentBlock::Paragraph {
        text: String::new(),
        html: Some(html.to_string()),
    }
}

fn sample_article(blocks: Vec<ContentBlock>) -> Article {
    Article {
        title: "Sample Article".to_string(),
        authors: vec!["Ada Lovelace".to_string()],
        source_url: "https://example.com/sample".to_string(),
        published: Some("2024-03-01".to_string()),
        blocks,
    }
}

/// Write a real PNG so the renderer can decode and embed it.
fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> DownloadedImage {
    let path = dir.join(name);
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]));
    img.save(&path).expect("failed to write test PNG");
    DownloadedImage {
        path,
        width,
        height,
    }
}

// =====================================================================
// Inline parsing at the public API
// =====================================================================

#[test]
fn token_text_equals_input_with_tags_stripped() {
    let input = r#"Visit <a href="https://e.com">the <b>best</b> site</a> <i>today</i>."#;
    let stripped: String = parse_inline(input)
        .iter()
        .filter_map(|t| match t {
            InlineToken::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stripped, "Visit the best site today.");
}

#[test]
fn unbalanced_tags_produce_finite_stream() {
    let tokens = parse_inline("<b>unclosed bold <i>and italic");
    let runs = resolve_runs(&tokens);
    assert_eq!(runs.len(), 2);
    assert!(runs[1].bold && runs[1].italic);
}

// =====================================================================
// Font resolution
// =====================================================================

#[test]
fn default_font_selection_is_deterministic() {
    if !fonts_installed() {
        return;
    }
    let first = ResolvedFont::resolve(None).unwrap();
    let second = ResolvedFont::resolve(None).unwrap();
    assert_eq!(first.family_name, second.family_name);
    assert_eq!(first.family_name, list_available_fonts()[0]);
}

#[test]
fn unknown_font_family_lists_valid_names() {
    let dir = tempfile::tempdir().unwrap();
    let article = sample_article(vec![paragraph("text")]);
    let options = RenderOptions {
        font_family: Some("comic-sans".to_string()),
        ..Default::default()
    };
    let err = render(&article, &[], &dir.path().join("out.pdf"), &options).unwrap_err();
    match err {
        Error::UnknownFontFamily { available, .. } => {
            assert!(available.contains("noto-sans"), "got: {available}");
        }
        other => panic!("expected UnknownFontFamily, got {other:?}"),
    }
}

// =====================================================================
// End-to-end rendering
// =====================================================================

#[test]
fn heading_and_paragraph_document_renders() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("article.pdf");
    let article = sample_article(vec![
        ContentBlock::Heading {
            text: "Intro".to_string(),
            level: 1,
        },
        paragraph("This is a sufficiently long paragraph for inclusion."),
    ]);

    let written = render(&article, &[], &out, &RenderOptions::default()).unwrap();
    assert_eq!(written, out);
    assert_valid_pdf(&out);
}

#[test]
fn inline_markup_document_renders() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("styled.pdf");
    let article = sample_article(vec![
        html_paragraph(r#"Mixed <b>bold</b>, <i>italic</i> and <a href="https://e.com">links</a>."#),
        html_paragraph("<b>unclosed bold leaks nowhere"),
        paragraph("A plain follow-up paragraph that must render regular."),
    ]);

    render(&article, &[], &out, &RenderOptions::default()).unwrap();
    assert_valid_pdf(&out);
}

#[test]
fn long_document_paginates_without_error() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("long.pdf");
    let blocks = (0..80)
        .map(|i| {
            paragraph(&format!(
                "Paragraph {i} with enough words to take up some horizontal and \
                 vertical space on the page before wrapping."
            ))
        })
        .collect();
    render(&sample_article(blocks), &[], &out, &RenderOptions::default()).unwrap();
    assert_valid_pdf(&out);
}

#[test]
fn cyrillic_text_renders() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("cyrillic.pdf");
    let article = sample_article(vec![paragraph(
        "Пример абзаца на русском языке для проверки юникодных шрифтов.",
    )]);
    render(&article, &[], &out, &RenderOptions::default()).unwrap();
    assert_valid_pdf(&out);
}

// =====================================================================
// Images
// =====================================================================

#[test]
fn document_with_images_renders() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("imaged.pdf");
    let images = vec![
        write_png(dir.path(), "lead.png", 640, 360),
        write_png(dir.path(), "mid.png", 200, 300),
    ];
    let blocks = (0..6).map(|i| paragraph(&format!("Paragraph {i}."))).collect();
    render(&sample_article(blocks), &images, &out, &RenderOptions::default()).unwrap();
    assert_valid_pdf(&out);
}

#[test]
fn corrupt_image_is_skipped_not_fatal() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("resilient.pdf");

    let corrupt_path = dir.path().join("broken.png");
    fs::write(&corrupt_path, b"definitely not a PNG").unwrap();

    let images = vec![
        write_png(dir.path(), "ok1.png", 320, 200),
        DownloadedImage {
            path: corrupt_path,
            width: 320,
            height: 200,
        },
        write_png(dir.path(), "ok2.png", 320, 200),
    ];
    let blocks = (0..4).map(|i| paragraph(&format!("Paragraph {i}."))).collect();

    // The corrupt file must neither abort the render nor corrupt the output.
    render(&sample_article(blocks), &images, &out, &RenderOptions::default()).unwrap();
    assert_valid_pdf(&out);
}

#[test]
fn missing_image_file_is_skipped_not_fatal() {
    if !fonts_installed() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing.pdf");
    let images = vec![DownloadedImage {
        path: PathBuf::from("/nonexistent/gone.png"),
        width: 100,
        height: 100,
    }];
    render(
        &sample_article(vec![paragraph("text")]),
        &images,
        &out,
        &RenderOptions::default(),
    )
    .unwrap();
    assert_valid_pdf(&out);
}

// =====================================================================
// Format dispatch and output failures
// =====================================================================

#[test]
fn markdown_output_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("article.md");
    let article = sample_article(vec![
        ContentBlock::Heading {
            text: "Intro".to_string(),
            level: 2,
        },
        html_paragraph("Some <b>bold</b> text."),
    ]);

    render_document(&article, &[], &out, &RenderOptions::default()).unwrap();
    let md = fs::read_to_string(&out).unwrap();
    assert!(md.starts_with("# Sample Article\n"));
    assert!(md.contains("## Intro"));
    assert!(md.contains("Some **bold** text."));
    assert!(md.contains("*Source: https://example.com/sample*"));
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("article.epub");
    let err = render_document(
        &sample_article(vec![]),
        &[],
        &out,
        &RenderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownOutputFormat { .. }));
}

#[test]
fn unwritable_output_path_fails_cleanly() {
    let out = Path::new("/nonexistent-dir/deep/article.md");
    let err = render_document(
        &sample_article(vec![paragraph("text")]),
        &[],
        out,
        &RenderOptions::default(),
    )
    .unwrap_err();
    match err {
        Error::OutputWriteFailure { path, .. } => assert!(path.contains("article.md")),
        other => panic!("expected OutputWriteFailure, got {other:?}"),
    }
}

// =====================================================================
// Extractor hand-over format
// =====================================================================

#[test]
fn article_json_round_trip() {
    let article = sample_article(vec![
        ContentBlock::Heading {
            text: "H".to_string(),
            level: 3,
        },
        html_paragraph("a <i>b</i>"),
    ]);
    let json = serde_json::to_string(&article).unwrap();
    let back: Article = serde_json::from_str(&json).unwrap();
    assert_eq!(back.title, article.title);
    assert_eq!(back.blocks.len(), 2);
    match &back.blocks[1] {
        ContentBlock::Paragraph { html, .. } => {
            assert_eq!(html.as_deref(), Some("a <i>b</i>"));
        }
        _ => panic!("expected paragraph"),
    }
}

#[test]
fn extractor_json_shape_is_accepted() {
    let json = r#"{
        "title": "From JSON",
        "authors": ["A", "B"],
        "source_url": "https://example.com/x",
        "blocks": [
            {"type": "heading", "text": "H", "level": 1},
            {"type": "paragraph", "text": "plain"},
            {"type": "paragraph", "text": "p", "html": "<b>p</b>"}
        ]
    }"#;
    let article: Article = serde_json::from_str(json).unwrap();
    assert_eq!(article.paragraph_count(), 2);
    assert!(article.published.is_none());
}
