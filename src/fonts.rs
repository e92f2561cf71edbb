//! Font registry and resolution.
//!
//! A static registry maps family names to ordered per-style lists of
//! filesystem candidates covering common installation locations. Resolution
//! picks the first existing candidate per style, falls back to the regular
//! face when a bold/italic variant is missing, and distinguishes variable
//! fonts (a `[wght]` axis marker in the file name) from static files so a
//! fixed weight can be bound per style.
//!
//! Existence checks go through the [`FontLocator`] strategy so tests can
//! inject a fake instead of touching the real filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The four logical styles a resolved family serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FaceStyle {
    /// Weight value bound when the face comes from a variable font.
    /// Italic keeps the regular weight; bold-italic keeps the bold weight.
    pub fn weight(self) -> u16 {
        match self {
            FaceStyle::Regular | FaceStyle::Italic => 400,
            FaceStyle::Bold | FaceStyle::BoldItalic => 700,
        }
    }
}

/// A registered font family with per-style path candidates.
///
/// A family counts as available iff at least one regular-style candidate
/// exists; regular candidates are always checked first.
#[derive(Debug, Clone)]
pub struct FontFamily {
    /// Registry name (e.g. "noto-sans").
    pub name: &'static str,
    /// Human-readable name (e.g. "Noto Sans").
    pub display_name: &'static str,
    pub regular: &'static [&'static str],
    pub bold: &'static [&'static str],
    pub italic: &'static [&'static str],
    pub bold_italic: &'static [&'static str],
}

impl FontFamily {
    pub fn candidates(&self, style: FaceStyle) -> &'static [&'static str] {
        match style {
            FaceStyle::Regular => self.regular,
            FaceStyle::Bold => self.bold,
            FaceStyle::Italic => self.italic,
            FaceStyle::BoldItalic => self.bold_italic,
        }
    }
}

/// Unicode-capable families, in selection priority order.
pub static FONT_FAMILIES: &[FontFamily] = &[
    FontFamily {
        name: "noto-sans",
        display_name: "Noto Sans",
        regular: &[
            "/usr/share/fonts/google-noto-vf/NotoSans[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        ],
        bold: &[
            "/usr/share/fonts/google-noto-vf/NotoSans[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSans-Bold.ttf",
            "/usr/share/fonts/noto/NotoSans-Bold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/google-noto-vf/NotoSans-Italic[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSans-Italic.ttf",
            "/usr/share/fonts/noto/NotoSans-Italic.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/google-noto-vf/NotoSans-Italic[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSans-BoldItalic.ttf",
            "/usr/share/fonts/noto/NotoSans-BoldItalic.ttf",
        ],
    },
    FontFamily {
        name: "noto-serif",
        display_name: "Noto Serif",
        regular: &[
            "/usr/share/fonts/google-noto-vf/NotoSerif[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSerif-Regular.ttf",
            "/usr/share/fonts/noto/NotoSerif-Regular.ttf",
        ],
        bold: &[
            "/usr/share/fonts/google-noto-vf/NotoSerif[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSerif-Bold.ttf",
            "/usr/share/fonts/noto/NotoSerif-Bold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/google-noto-vf/NotoSerif-Italic[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSerif-Italic.ttf",
            "/usr/share/fonts/noto/NotoSerif-Italic.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/google-noto-vf/NotoSerif-Italic[wght].ttf",
            "/usr/share/fonts/google-noto/NotoSerif-BoldItalic.ttf",
            "/usr/share/fonts/noto/NotoSerif-BoldItalic.ttf",
        ],
    },
    FontFamily {
        name: "liberation-sans",
        display_name: "Liberation Sans",
        regular: &[
            "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation-sans-fonts/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ],
        bold: &[
            "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
            "/usr/share/fonts/liberation-sans-fonts/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/liberation-sans/LiberationSans-Italic.ttf",
            "/usr/share/fonts/liberation-sans-fonts/LiberationSans-Italic.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/liberation-sans/LiberationSans-BoldItalic.ttf",
            "/usr/share/fonts/liberation-sans-fonts/LiberationSans-BoldItalic.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
        ],
    },
    FontFamily {
        name: "liberation-serif",
        display_name: "Liberation Serif",
        regular: &[
            "/usr/share/fonts/liberation-serif/LiberationSerif-Regular.ttf",
            "/usr/share/fonts/liberation-serif-fonts/LiberationSerif-Regular.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
        ],
        bold: &[
            "/usr/share/fonts/liberation-serif/LiberationSerif-Bold.ttf",
            "/usr/share/fonts/liberation-serif-fonts/LiberationSerif-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/liberation-serif/LiberationSerif-Italic.ttf",
            "/usr/share/fonts/liberation-serif-fonts/LiberationSerif-Italic.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSerif-Italic.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/liberation-serif/LiberationSerif-BoldItalic.ttf",
            "/usr/share/fonts/liberation-serif-fonts/LiberationSerif-BoldItalic.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSerif-BoldItalic.ttf",
        ],
    },
    FontFamily {
        name: "free-sans",
        display_name: "Free Sans",
        regular: &[
            "/usr/share/fonts/gnu-free/FreeSans.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        ],
        bold: &[
            "/usr/share/fonts/gnu-free/FreeSansBold.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/gnu-free/FreeSansOblique.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSansOblique.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/gnu-free/FreeSansBoldOblique.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSansBoldOblique.ttf",
        ],
    },
    FontFamily {
        name: "free-serif",
        display_name: "Free Serif",
        regular: &[
            "/usr/share/fonts/gnu-free/FreeSerif.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSerif.ttf",
        ],
        bold: &[
            "/usr/share/fonts/gnu-free/FreeSerifBold.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSerifBold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/gnu-free/FreeSerifItalic.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSerifItalic.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/gnu-free/FreeSerifBoldItalic.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSerifBoldItalic.ttf",
        ],
    },
    FontFamily {
        name: "dejavu-sans",
        display_name: "DejaVu Sans",
        regular: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "C:/Windows/Fonts/DejaVuSans.ttf",
        ],
        bold: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "C:/Windows/Fonts/DejaVuSans-Bold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
            "C:/Windows/Fonts/DejaVuSans-Oblique.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-BoldOblique.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-BoldOblique.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
            "C:/Windows/Fonts/DejaVuSans-BoldOblique.ttf",
        ],
    },
    FontFamily {
        name: "dejavu-serif",
        display_name: "DejaVu Serif",
        regular: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
            "/usr/share/fonts/dejavu-serif-fonts/DejaVuSerif.ttf",
            "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
            "/usr/share/fonts/TTF/DejaVuSerif.ttf",
            "C:/Windows/Fonts/DejaVuSerif.ttf",
        ],
        bold: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
            "/usr/share/fonts/dejavu-serif-fonts/DejaVuSerif-Bold.ttf",
            "/usr/share/fonts/dejavu/DejaVuSerif-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSerif-Bold.ttf",
            "C:/Windows/Fonts/DejaVuSerif-Bold.ttf",
        ],
        italic: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Italic.ttf",
            "/usr/share/fonts/dejavu-serif-fonts/DejaVuSerif-Italic.ttf",
            "/usr/share/fonts/dejavu/DejaVuSerif-Italic.ttf",
            "/usr/share/fonts/TTF/DejaVuSerif-Italic.ttf",
            "C:/Windows/Fonts/DejaVuSerif-Italic.ttf",
        ],
        bold_italic: &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif-BoldItalic.ttf",
            "/usr/share/fonts/dejavu-serif-fonts/DejaVuSerif-BoldItalic.ttf",
            "/usr/share/fonts/dejavu/DejaVuSerif-BoldItalic.ttf",
            "/usr/share/fonts/TTF/DejaVuSerif-BoldItalic.ttf",
            "C:/Windows/Fonts/DejaVuSerif-BoldItalic.ttf",
        ],
    },
];

fn family_by_name(name: &str) -> Option<&'static FontFamily> {
    FONT_FAMILIES.iter().find(|f| f.name == name)
}

fn registry_names() -> String {
    FONT_FAMILIES
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// Strategy for turning a candidate list into an existing file path.
///
/// Production uses [`DiskLocator`]; tests inject fakes so resolution logic
/// runs without a real font installation.
pub trait FontLocator {
    /// First candidate that resolves to an existing file, in list order.
    fn locate(&self, candidates: &[&str]) -> Option<PathBuf>;
}

/// Checks candidate paths against the local filesystem.
#[derive(Debug, Default)]
pub struct DiskLocator;

impl FontLocator for DiskLocator {
    fn locate(&self, candidates: &[&str]) -> Option<PathBuf> {
        candidates
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }
}

/// Family names whose regular face is installed, in registry order.
pub fn list_available_fonts() -> Vec<&'static str> {
    list_available_with(&DiskLocator)
}

/// [`list_available_fonts`] with an injected locator.
pub fn list_available_with(locator: &dyn FontLocator) -> Vec<&'static str> {
    FONT_FAMILIES
        .iter()
        .filter(|f| locator.locate(f.regular).is_some())
        .map(|f| f.name)
        .collect()
}

/// Name of the family `resolve(None)` would pick.
pub fn default_font_name() -> Result<&'static str> {
    default_font_with(&DiskLocator)
}

pub fn default_font_with(locator: &dyn FontLocator) -> Result<&'static str> {
    list_available_with(locator)
        .first()
        .copied()
        .ok_or(Error::NoFontsAvailable)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Whether a font file is a variable font, judged by the weight-axis marker
/// in its file name (the convention variable-font packages install under).
pub fn is_variable_font(path: &Path) -> bool {
    path.to_str().is_some_and(|s| s.contains("[wght]"))
}

/// One loaded font face: owned bytes plus the metrics needed for
/// measurement and baseline placement.
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub path: PathBuf,
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API and for
    /// embedding). Empty for synthetic faces, which measure heuristically.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    /// Fixed weight bound for variable fonts; `None` for static files.
    pub weight: Option<u16>,
}

impl LoadedFace {
    /// Read and validate a font file, binding a fixed weight when the file
    /// is a variable font. A failed variable load falls back to a static
    /// load once; if that also fails the error is fatal.
    fn load(path: &Path, style: FaceStyle) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::FontLoadFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if is_variable_font(path) {
            match Self::parse(path, &bytes, Some(style.weight())) {
                Ok(face) => return Ok(face),
                Err(e) => {
                    log::warn!(
                        "variable load of '{}' failed ({e}); retrying as static",
                        path.display()
                    );
                }
            }
        }

        Self::parse(path, &bytes, None)
    }

    fn parse(path: &Path, bytes: &[u8], weight: Option<u16>) -> Result<Self> {
        let face = ttf_parser::Face::parse(bytes, 0).map_err(|e| Error::FontLoadFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if weight.is_some() && !face.is_variable() {
            return Err(Error::FontLoadFailure {
                path: path.display().to_string(),
                reason: "file name carries a [wght] marker but the face has no variation axes"
                    .to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            weight,
            bytes: bytes.to_vec(),
        })
    }

    /// Synthetic face with Helvetica-like metrics and no bytes. Measurement
    /// uses the average-width heuristic; nothing can be embedded from it.
    pub fn synthetic(weight: u16) -> Self {
        Self {
            path: PathBuf::new(),
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
            weight: Some(weight),
        }
    }

    /// Measure the width of `text` at `font_size` points.
    ///
    /// With real bytes we sum glyph advances; otherwise an average character
    /// width heuristic (0.5 × size, 0.55 when bold) stands in.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        if self.bytes.is_empty() {
            let avg = if self.weight.unwrap_or(400) >= 700 {
                0.55
            } else {
                0.5
            };
            return text.chars().count() as f32 * font_size * avg;
        }

        match ttf_parser::Face::parse(&self.bytes, 0) {
            Ok(face) => {
                let scale = font_size / self.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    /// Ascender height in points at the given size.
    pub fn ascender_pt(&self, font_size: f32) -> f32 {
        self.ascender * font_size / self.units_per_em
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A fully resolved family: regular always loaded, the other styles
/// substituting regular when no candidate of theirs exists on disk.
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub family_name: String,
    pub display_name: String,
    regular: LoadedFace,
    bold: Option<LoadedFace>,
    italic: Option<LoadedFace>,
    bold_italic: Option<LoadedFace>,
}

impl ResolvedFont {
    /// Resolve a family by registry name, or the first installed family
    /// when `name` is `None`.
    pub fn resolve(name: Option<&str>) -> Result<Self> {
        Self::resolve_with(name, &DiskLocator)
    }

    /// [`ResolvedFont::resolve`] with an injected locator.
    pub fn resolve_with(name: Option<&str>, locator: &dyn FontLocator) -> Result<Self> {
        let family = match name {
            Some(n) => family_by_name(n).ok_or_else(|| Error::UnknownFontFamily {
                name: n.to_string(),
                available: registry_names(),
            })?,
            None => {
                let default = default_font_with(locator)?;
                family_by_name(default).expect("default name comes from the registry")
            }
        };

        let regular_path = locator
            .locate(family.regular)
            .ok_or_else(|| Error::FontNotInstalled {
                name: family.name.to_string(),
                display_name: family.display_name.to_string(),
            })?;
        let regular = LoadedFace::load(&regular_path, FaceStyle::Regular)?;

        let load_optional = |style: FaceStyle| -> Result<Option<LoadedFace>> {
            match locator.locate(family.candidates(style)) {
                Some(path) => LoadedFace::load(&path, style).map(Some),
                None => Ok(None),
            }
        };

        Ok(Self {
            family_name: family.name.to_string(),
            display_name: family.display_name.to_string(),
            bold: load_optional(FaceStyle::Bold)?,
            italic: load_optional(FaceStyle::Italic)?,
            bold_italic: load_optional(FaceStyle::BoldItalic)?,
            regular,
        })
    }

    /// Fully synthetic family for layout math without any font files.
    pub fn synthetic() -> Self {
        Self {
            family_name: "synthetic".to_string(),
            display_name: "Synthetic".to_string(),
            regular: LoadedFace::synthetic(400),
            bold: Some(LoadedFace::synthetic(700)),
            italic: Some(LoadedFace::synthetic(400)),
            bold_italic: Some(LoadedFace::synthetic(700)),
        }
    }

    /// The face serving a logical style, substituting regular for any
    /// style that did not resolve.
    pub fn face(&self, style: FaceStyle) -> &LoadedFace {
        let variant = match style {
            FaceStyle::Regular => return &self.regular,
            FaceStyle::Bold => &self.bold,
            FaceStyle::Italic => &self.italic,
            FaceStyle::BoldItalic => &self.bold_italic,
        };
        variant.as_ref().unwrap_or(&self.regular)
    }

    /// Whether the style resolved to its own file (false = regular stands in).
    pub fn has_own_face(&self, style: FaceStyle) -> bool {
        match style {
            FaceStyle::Regular => true,
            FaceStyle::Bold => self.bold.is_some(),
            FaceStyle::Italic => self.italic.is_some(),
            FaceStyle::BoldItalic => self.bold_italic.is_some(),
        }
    }
}

/// Map bold/italic flags to the logical style.
pub fn face_style(bold: bool, italic: bool) -> FaceStyle {
    match (bold, italic) {
        (true, true) => FaceStyle::BoldItalic,
        (true, false) => FaceStyle::Bold,
        (false, true) => FaceStyle::Italic,
        (false, false) => FaceStyle::Regular,
    }
}
