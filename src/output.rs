//! Conversion results and the on-disk output bundle.

use crate::error::Wiki2TexError;
use crate::images::ImageManifest;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Byte sizes per phase and wall-clock timings for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Raw markup as fetched.
    pub markup_bytes: usize,
    /// After Phase 1 stripping.
    pub stripped_bytes: usize,
    /// Converter output before cleaning.
    pub converted_bytes: usize,
    /// The finished document.
    pub latex_bytes: usize,
    /// Entries in the image manifest (0 when images were skipped).
    pub image_count: usize,
    pub fetch_duration_ms: u64,
    pub pipeline_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything produced for one page.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Page title after search resolution.
    pub title: String,
    /// The complete LaTeX document.
    pub latex: String,
    /// `None` when images were disabled or their extraction failed.
    pub images: Option<ImageManifest>,
    pub stats: ConversionStats,
}

/// Paths written by [`write_bundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundlePaths {
    pub dir: PathBuf,
    pub latex: PathBuf,
    pub images: Option<PathBuf>,
}

/// Directory name for a page: spaces become `_`, all lowercase.
pub fn slug(title: &str) -> String {
    sanitize(title).replace(' ', "_").to_lowercase()
}

// Path separators in a title would escape the bundle directory.
fn sanitize(title: &str) -> String {
    title.replace(['/', '\\'], "_")
}

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a partial file.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Wiki2TexError> {
    let fail = |source| Wiki2TexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(contents).map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Write `dir/<slug>/<Title>_latex.tex` and, when present,
/// `dir/<slug>/<Title>_images.json`.
pub fn write_bundle(output: &ConversionOutput, dir: &Path) -> Result<BundlePaths, Wiki2TexError> {
    let bundle_dir = dir.join(slug(&output.title));
    fs::create_dir_all(&bundle_dir).map_err(|e| Wiki2TexError::OutputWriteFailed {
        path: bundle_dir.clone(),
        source: e,
    })?;

    let stem = sanitize(&output.title);
    let latex_path = bundle_dir.join(format!("{stem}_latex.tex"));
    write_atomic(&latex_path, output.latex.as_bytes())?;

    let images_path = match &output.images {
        Some(manifest) => {
            let path = bundle_dir.join(format!("{stem}_images.json"));
            let json = serde_json::to_string_pretty(manifest)
                .map_err(|e| Wiki2TexError::Internal(format!("image manifest: {e}")))?;
            write_atomic(&path, json.as_bytes())?;
            Some(path)
        }
        None => None,
    };

    info!("Wrote bundle to {}", bundle_dir.display());
    Ok(BundlePaths {
        dir: bundle_dir,
        latex: latex_path,
        images: images_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageRecord;

    fn sample(images: Option<ImageManifest>) -> ConversionOutput {
        ConversionOutput {
            title: "Linear map".into(),
            latex: "\\documentclass[12pt]{article}\n".into(),
            images,
            stats: ConversionStats::default(),
        }
    }

    #[test]
    fn slug_lowercases_and_underscores() {
        assert_eq!(slug("Linear map"), "linear_map");
        assert_eq!(slug("AC/DC"), "ac_dc");
    }

    #[test]
    fn bundle_writes_tex_and_json() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = ImageManifest {
            wiki_page_title: "Linear map".into(),
            wiki_page_summary: Some("A map.".into()),
            images: vec![ImageRecord {
                name: "Shear.png".into(),
                url: "https://upload.wikimedia.org/Shear.png".into(),
                class: vec![],
                description: "A shear".into(),
            }],
        };
        let paths = write_bundle(&sample(Some(manifest.clone())), tmp.path()).unwrap();

        assert_eq!(paths.dir, tmp.path().join("linear_map"));
        assert_eq!(paths.latex, paths.dir.join("Linear map_latex.tex"));
        assert!(fs::read_to_string(&paths.latex).unwrap().starts_with("\\documentclass"));

        let json = fs::read_to_string(paths.images.unwrap()).unwrap();
        let back: ImageManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn bundle_without_images_writes_only_tex() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = write_bundle(&sample(None), tmp.path()).unwrap();
        assert!(paths.images.is_none());
        let entries = fs::read_dir(&paths.dir).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn rewriting_replaces_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let mut out = sample(None);
        write_bundle(&out, tmp.path()).unwrap();
        out.latex = "second".into();
        let paths = write_bundle(&out, tmp.path()).unwrap();
        assert_eq!(fs::read_to_string(paths.latex).unwrap(), "second");
    }
}
