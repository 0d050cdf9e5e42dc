//! Error types for the wiki2tex library.
//!
//! A single fatal error type, [`Wiki2TexError`], covers every way a document
//! conversion can stop. The rewrite phases themselves never fail: every rule
//! is a total function over arbitrary strings, so errors can only come from
//! the boundaries (fetching markup, invoking the external converter, writing
//! the output bundle, validating configuration).
//!
//! There is no partial-success mode for a single document: it either
//! completes the whole pipeline or the run for that document fails. Batch
//! conversion keeps one `Result` per title so independent documents do not
//! take each other down.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wiki2tex library.
#[derive(Debug, Error)]
pub enum Wiki2TexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The markup fetch returned nothing; the pipeline is never invoked.
    #[error("No markup returned for page '{title}'")]
    EmptyInput { title: String },

    /// The encyclopedia reports the page as missing.
    #[error("No page found for '{title}'\nCheck the spelling or drop --no-search to resolve the title.")]
    PageNotFound { title: String },

    /// A title search produced no hits.
    #[error("Search for '{query}' returned no pages")]
    NoSearchResults { query: String },

    /// The HTTP request failed or returned a non-success status.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    FetchFailed { url: String, reason: String },

    /// The HTTP request exceeded the configured timeout.
    #[error("Fetch timed out after {secs}s for '{url}'\nIncrease --fetch-timeout.")]
    FetchTimeout { url: String, secs: u64 },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The external markup converter failed. Surfaced verbatim, never retried.
    #[error("Converter '{converter}' failed: {reason}")]
    Conversion { converter: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Wiki2TexError {
    /// True for errors raised before the pipeline ran (nothing to convert).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Wiki2TexError::EmptyInput { .. }
                | Wiki2TexError::PageNotFound { .. }
                | Wiki2TexError::NoSearchResults { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display() {
        let e = Wiki2TexError::EmptyInput {
            title: "Linear map".into(),
        };
        assert!(e.to_string().contains("Linear map"), "got: {e}");
        assert!(e.is_input_error());
    }

    #[test]
    fn conversion_display_names_converter() {
        let e = Wiki2TexError::Conversion {
            converter: "pandoc".into(),
            reason: "exit status 64".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pandoc"));
        assert!(msg.contains("exit status 64"));
        assert!(!e.is_input_error());
    }

    #[test]
    fn fetch_timeout_display() {
        let e = Wiki2TexError::FetchTimeout {
            url: "https://en.wikipedia.org/w/api.php".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Wiki2TexError::OutputWriteFailed {
            path: PathBuf::from("/nope/out.tex"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/nope/out.tex"));
    }
}
