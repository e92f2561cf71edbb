//! Error types for article-press.

use std::io;
use thiserror::Error;

/// Result type alias for article-press operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rendering a document.
///
/// Font-resolution and output-write failures abort the whole render.
/// Per-image failures never appear here: the flow engine skips the image
/// and logs a warning instead.
#[derive(Error, Debug)]
pub enum Error {
    /// No registered font family has an installed regular-style file.
    #[error(
        "no Unicode fonts found; install one of the following:\n\
         \x20 - Noto Sans: sudo dnf install google-noto-sans-fonts\n\
         \x20 - Liberation Sans: sudo dnf install liberation-sans-fonts\n\
         \x20 - DejaVu Sans: sudo dnf install dejavu-sans-fonts\n\
         \x20 - Free Sans: sudo dnf install gnu-free-sans-fonts\n\
         for Debian/Ubuntu use 'apt install', for Arch use 'pacman -S'"
    )]
    NoFontsAvailable,

    /// The requested family name is not in the registry.
    #[error("unknown font family '{name}'; available fonts: {available}")]
    UnknownFontFamily {
        name: String,
        /// Comma-separated registry names, valid whether or not installed.
        available: String,
    },

    /// The family is registered but no regular-style candidate exists on disk.
    #[error(
        "font family '{name}' ({display_name}) is not installed; \
         install it or pick another family with --list-fonts"
    )]
    FontNotInstalled { name: String, display_name: String },

    /// A font file exists but the backend rejected it, even after falling
    /// back from variable to static loading.
    #[error("failed to load font file '{path}': {reason}")]
    FontLoadFailure { path: String, reason: String },

    /// The output path's extension maps to no supported format.
    #[error("cannot infer output format from '{path}'; use a .pdf or .md extension")]
    UnknownOutputFormat { path: String },

    /// The destination path could not be written.
    #[error("failed to write output file '{path}': {source}")]
    OutputWriteFailure {
        path: String,
        #[source]
        source: io::Error,
    },

    /// I/O error outside the output write (e.g. reading a font file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
