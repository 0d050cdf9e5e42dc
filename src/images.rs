//! Image manifest: the figures a rendered page embeds.
//!
//! Images are dropped from the LaTeX body, so their references are shipped
//! alongside it as JSON. Two passes over the rendered HTML: figures first
//! (they carry captions), then every remaining `<img>` that is not a math
//! fallback or a piece of site chrome.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One embedded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Last path segment of the URL.
    pub name: String,
    /// Absolute image URL.
    pub url: String,
    /// CSS classes of the `<img>` element.
    pub class: Vec<String>,
    /// Figure caption, alt text or title.
    pub description: String,
}

/// The JSON document written next to the `.tex` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    pub wiki_page_title: String,
    pub wiki_page_summary: Option<String>,
    pub images: Vec<ImageRecord>,
}

const NO_DESCRIPTION: &str = "No description";
const MATH_FALLBACK: &str = "math-fallback";
const CHROME_MARKERS: &[&str] = &["logo", "icon", "edit", "clear"];
const ASSET_PATHS: &[&str] = &["resources/assets", "static/images"];

static FIGURE: Lazy<Selector> = Lazy::new(|| Selector::parse("figure").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static FIGCAPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("figcaption").unwrap());

fn classes(img: &ElementRef<'_>) -> Vec<String> {
    img.value().classes().map(str::to_string).collect()
}

fn is_math_fallback(img: &ElementRef<'_>) -> bool {
    img.value().classes().any(|c| c.contains(MATH_FALLBACK))
}

fn is_site_chrome(name: &str, url: &str) -> bool {
    let name = name.to_lowercase();
    let url = url.to_lowercase();
    CHROME_MARKERS
        .iter()
        .any(|m| name.contains(m) || url.contains(m))
        || ASSET_PATHS.iter().any(|p| url.contains(p))
}

fn absolute(src: &str) -> String {
    if src.starts_with("http") {
        src.to_string()
    } else {
        format!("https:{src}")
    }
}

fn file_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

fn fallback_description(img: &ElementRef<'_>) -> String {
    let attr = |name| img.value().attr(name).filter(|s: &&str| !s.is_empty());
    attr("alt")
        .or_else(|| attr("title"))
        .unwrap_or(NO_DESCRIPTION)
        .to_string()
}

/// Collect every content image in `html`, de-duplicated by URL in
/// first-seen order.
pub fn extract_images(html: &str) -> Vec<ImageRecord> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for figure in document.select(&FIGURE) {
        let Some(img) = figure.select(&IMG).next() else {
            continue;
        };
        if is_math_fallback(&img) {
            continue;
        }
        let Some(src) = img.value().attr("src").filter(|s| !s.is_empty()) else {
            continue;
        };
        let url = absolute(src);
        if !seen.insert(url.clone()) {
            continue;
        }
        let description = figure
            .select(&FIGCAPTION)
            .next()
            .map(|fc| fc.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_description(&img));
        images.push(ImageRecord {
            name: file_name(&url),
            url,
            class: classes(&img),
            description,
        });
    }

    for img in document.select(&IMG) {
        let Some(src) = img.value().attr("src").filter(|s| !s.is_empty()) else {
            continue;
        };
        let name = file_name(src);
        if is_math_fallback(&img) || is_site_chrome(&name, src) {
            continue;
        }
        let url = absolute(src);
        if !seen.insert(url.clone()) {
            continue;
        }
        images.push(ImageRecord {
            name,
            url,
            class: classes(&img),
            description: fallback_description(&img),
        });
    }

    images
}
