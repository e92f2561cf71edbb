//! Extracted-article data model.
//!
//! These types are the hand-over format from the extraction stage: an
//! ordered sequence of content blocks plus article metadata, and the local
//! image files the download stage produced. The extractor serialises an
//! [`Article`] as JSON; the `press` binary deserialises it from there.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One structural unit of article text.
///
/// The sequence order defines document reading order. Paragraphs may carry a
/// constrained inline-HTML variant of their text (`<b>`, `<i>`,
/// `<a href="...">` only); when present it is preferred over the plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Heading {
        text: String,
        /// Heading level 1–6; values above 6 are clamped to the smallest size.
        level: u8,
    },
    Paragraph {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
    },
}

impl ContentBlock {
    pub fn is_paragraph(&self) -> bool {
        matches!(self, ContentBlock::Paragraph { .. })
    }
}

/// An extracted article ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub source_url: String,
    /// Publish date as the extractor found it, already formatted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl Article {
    /// Number of paragraph blocks, the denominator of the image
    /// interleaving interval.
    pub fn paragraph_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_paragraph()).count()
    }
}

/// A validated, locally stored image with known pixel dimensions.
///
/// Owned by the caller for the duration of the render; the renderer only
/// reads the file and never deletes it. When a lead image exists it is
/// always index 0 of the slice handed to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// How supplied images are treated during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePolicy {
    /// Lead image at the top, the rest interleaved between paragraphs.
    #[default]
    Interleave,
    /// Ignore all supplied images.
    Omit,
}

/// Rendering options. A plain configuration struct, no dynamic dispatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Overrides the extracted title when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Registry name of the font family (e.g. "noto-sans"). `None` selects
    /// the first installed family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default)]
    pub images: ImagePolicy,
}
