//! Pipeline stages for wiki-markup-to-LaTeX conversion.
//!
//! Each submodule implements one transformation step. The rewrite phases are
//! pure `&str → String` rule chains ([`rules`]); only the converter adapter
//! and the fetch client touch the outside world.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ strip ──▶ pandoc ──▶ clean ──▶ document
//! (API)     (Phase 1) (extern)   (Phase 2)  (template)
//!                                 ├─ math
//!                                 └─ reflow
//! ```
//!
//! 1. [`fetch`]  — search, raw markup, rendered HTML and summary over the
//!    MediaWiki action API; the only stage with network I/O
//! 2. [`strip`]  — normalise math templates, delete templates, citations,
//!    piped-link remnants and file directives
//! 3. [`pandoc`] — run the external converter; a [`Converter`] trait so
//!    tests can substitute a closure
//! 4. [`clean`]  — symbol substitution, converter-defect fixes, artifact
//!    removal, "See also" truncation, quote repair, then [`math`] and
//!    [`reflow`]
//! 5. [`crate::document`] — wrap the body in the article template

pub mod clean;
pub mod fetch;
pub mod math;
pub mod pandoc;
pub mod reflow;
pub mod rules;
pub mod strip;

pub use pandoc::{Converter, PandocConverter};

use crate::document;
use crate::error::Wiki2TexError;
use tracing::{debug, info};

/// Intermediate sizes from one run of the synchronous core.
#[derive(Debug, Clone)]
pub struct PhaseOutput {
    /// The finished document.
    pub latex: String,
    pub stripped_bytes: usize,
    pub converted_bytes: usize,
}

/// Run strip → convert → clean → build over `raw`, recording phase sizes.
pub fn run_phases<S: AsRef<str>>(
    title: &str,
    raw: &str,
    converter: &dyn Converter,
    content_fixes: &[S],
) -> Result<PhaseOutput, Wiki2TexError> {
    if raw.trim().is_empty() {
        return Err(Wiki2TexError::EmptyInput {
            title: title.to_string(),
        });
    }

    let stripped = strip::strip_with_fixes(raw, content_fixes);
    debug!("strip: {} → {} bytes", raw.len(), stripped.len());

    let converted = converter.convert(&stripped)?;
    debug!("{}: {} → {} bytes", converter.name(), stripped.len(), converted.len());

    let body = clean::clean(&converted);
    debug!("clean: {} → {} bytes", converted.len(), body.len());

    let latex = document::build(title, &body);
    info!("Built '{}' ({} bytes)", title, latex.len());

    Ok(PhaseOutput {
        latex,
        stripped_bytes: stripped.len(),
        converted_bytes: converted.len(),
    })
}

/// Convert raw markup for `title` into a complete LaTeX document.
///
/// Fails with [`Wiki2TexError::EmptyInput`] when `raw` is blank and
/// propagates converter failures unchanged.
pub fn markup_to_latex<S: AsRef<str>>(
    title: &str,
    raw: &str,
    converter: &dyn Converter,
    content_fixes: &[S],
) -> Result<String, Wiki2TexError> {
    run_phases(title, raw, converter, content_fixes).map(|run| run.latex)
}
