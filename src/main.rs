//! press – command-line article → PDF renderer.
//!
//! Usage:
//!   press <article.json> [-o output.pdf] [--title "My Title"] [--font noto-sans]
//!   press --list-fonts
//!
//! The input file is the extractor's JSON hand-over: the article fields plus
//! an optional `images` list of locally downloaded files. If `-o` is omitted
//! the PDF is written next to the input with the same stem.

use std::{env, fs, path::PathBuf, process};

use serde::Deserialize;

use article_press::fonts::{default_font_name, list_available_fonts, FONT_FAMILIES};
use article_press::{render_document, Article, DownloadedImage, ImagePolicy, RenderOptions};

/// The extractor's hand-over file: article fields plus downloaded images.
#[derive(Deserialize)]
struct ArticleInput {
    #[serde(flatten)]
    article: Article,
    #[serde(default)]
    images: Vec<DownloadedImage>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut font: Option<String> = None;
    let mut no_images = false;
    let mut list_fonts = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output" | "-o" => match iter.next() {
                Some(v) => output_path = Some(PathBuf::from(v)),
                None => {
                    eprintln!("Error: -o/--output requires a path.");
                    process::exit(1);
                }
            },
            "--title" | "-t" => match iter.next() {
                Some(v) => title = Some(v.clone()),
                None => {
                    eprintln!("Error: --title requires a value.");
                    process::exit(1);
                }
            },
            "--font" | "-f" => match iter.next() {
                Some(v) => font = Some(v.clone()),
                None => {
                    eprintln!("Error: --font requires a family name.");
                    process::exit(1);
                }
            },
            "--no-images" => no_images = true,
            "--list-fonts" => list_fonts = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if input_path.is_some() {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                input_path = Some(PathBuf::from(path));
            }
        }
    }

    if list_fonts {
        print_font_list();
        return;
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no article file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Default output: same directory + same stem as input, but with .pdf
    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("pdf");
        o
    });

    let json = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let parsed: ArticleInput = match serde_json::from_str(&json) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let options = RenderOptions {
        title,
        font_family: font,
        images: if no_images {
            ImagePolicy::Omit
        } else {
            ImagePolicy::Interleave
        },
    };

    match render_document(&parsed.article, &parsed.images, &output, &options) {
        Ok(path) => {
            eprintln!("Wrote '{}'", path.display());
        }
        Err(e) => {
            eprintln!("Error rendering document: {e}");
            process::exit(1);
        }
    }
}

fn print_font_list() {
    let available = list_available_fonts();
    if available.is_empty() {
        eprintln!("No fonts are available on this system.");
        eprintln!();
        eprintln!("Please install one of the following:");
        for family in FONT_FAMILIES {
            eprintln!("  - {}", family.display_name);
        }
        process::exit(1);
    }

    let default = default_font_name().ok();
    println!("Available fonts:");
    for name in available {
        let family = FONT_FAMILIES
            .iter()
            .find(|f| f.name == name)
            .expect("available names come from the registry");
        let mark = if Some(name) == default { " (default)" } else { "" };
        println!("  * {} ({}){}", name, family.display_name, mark);
    }
}

fn print_usage(prog: &str) {
    eprintln!("press – article to PDF renderer (article-press)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <article.json> [-o output.pdf] [--title \"My Title\"] [--font NAME]");
    eprintln!("  {prog} --list-fonts");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <article.json>  Extractor output: article fields plus an optional images list");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --output, -o    Output path; .pdf or .md decides the format (default: input stem + .pdf)");
    eprintln!("  --title, -t     Custom document title (overrides the extracted title)");
    eprintln!("  --font, -f      Font family (e.g. noto-sans, liberation-serif)");
    eprintln!("  --no-images     Render without any images");
    eprintln!("  --list-fonts    List installed font families and exit");
    eprintln!("  --help          Print this message");
}
