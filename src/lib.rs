//! # wiki2tex
//!
//! Convert encyclopedia articles written in wiki markup into compilable
//! LaTeX documents.
//!
//! General-purpose converters such as pandoc understand the markup syntax
//! but not the encyclopedia's conventions: math hidden in `{{math}}` and
//! `{{mvar}}` templates, citation footnotes, piped links, figure directives,
//! navigation sections. This crate strips those before conversion, repairs
//! what the converter gets wrong afterwards, and puts bare mathematics back
//! into math mode.
//!
//! ## Pipeline Overview
//!
//! ```text
//! title
//!  │
//!  ├─ 1. Fetch    search + raw markup over the MediaWiki API
//!  ├─ 2. Strip    templates, references, links, file directives (Phase 1)
//!  ├─ 3. Convert  pandoc mediawiki → latex (spawn_blocking)
//!  ├─ 4. Clean    symbols, artifacts, "See also", quotes (Phase 2)
//!  │     ├─ math    re-wrap bare operators, powers, subscripts
//!  │     └─ reflow  one directive or paragraph per line
//!  ├─ 5. Build    article preamble + title + body
//!  └─ 6. Output   <slug>/<Title>_latex.tex + <Title>_images.json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wiki2tex::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("Linear map", &config).await?;
//!     println!("{}", output.latex);
//!     Ok(())
//! }
//! ```
//!
//! Markup already on hand converts without any network access:
//!
//! ```rust
//! use wiki2tex::pipeline::markup_to_latex;
//! use wiki2tex::Wiki2TexError;
//!
//! // Any `Fn(&str) -> Result<String, _>` can stand in for pandoc.
//! let passthrough = |s: &str| -> Result<String, Wiki2TexError> { Ok(s.to_string()) };
//! let doc = markup_to_latex("Example", "{{mvar|T}} is linear.", &passthrough, &["cokernel"]).unwrap();
//! assert!(doc.contains("T is linear."));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `wiki2tex` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! wiki2tex = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod images;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod symbols;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_batch, convert_markup, convert_sync, convert_to_dir};
pub use error::Wiki2TexError;
pub use images::{extract_images, ImageManifest, ImageRecord};
pub use output::{write_bundle, BundlePaths, ConversionOutput, ConversionStats};
pub use pipeline::fetch::WikiClient;
pub use pipeline::{markup_to_latex, Converter, PandocConverter};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
