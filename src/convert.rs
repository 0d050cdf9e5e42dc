//! Conversion entry points: one page, one page to disk, or a batch.
//!
//! Every entry point takes the [`ConversionConfig`] explicitly. The core
//! pipeline is synchronous (it shells out to pandoc), so [`convert`] runs it
//! on a blocking thread and keeps the runtime free for the API requests of
//! other documents in a batch.

use crate::config::ConversionConfig;
use crate::error::Wiki2TexError;
use crate::images::{self, ImageManifest};
use crate::output::{self, BundlePaths, ConversionOutput, ConversionStats};
use crate::pipeline::fetch::WikiClient;
use crate::pipeline::{self, PandocConverter};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert raw markup already in hand. No network access.
pub fn convert_markup(
    title: &str,
    raw: &str,
    config: &ConversionConfig,
) -> Result<String, Wiki2TexError> {
    let converter = PandocConverter::from_config(config);
    pipeline::markup_to_latex(title, raw, &converter, &config.content_fixes)
}

/// Fetch a page and convert it to a LaTeX document.
///
/// # Errors
/// - [`Wiki2TexError::NoSearchResults`] / [`Wiki2TexError::PageNotFound`]
///   when the title does not resolve
/// - [`Wiki2TexError::EmptyInput`] when the page has no markup
/// - [`Wiki2TexError::Conversion`] when pandoc fails
///
/// Image extraction problems only log a warning; the document still
/// converts with `images: None`.
pub async fn convert(
    title: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wiki2TexError> {
    let total_start = Instant::now();
    let requested = title.as_ref();
    info!("Starting conversion: {}", requested);

    let client = WikiClient::new(config)?;

    // ── Step 1: Resolve title and fetch markup ───────────────────────────
    let fetch_start = Instant::now();
    let title = if config.resolve_title {
        client.search_title(requested).await?
    } else {
        requested.to_string()
    };
    let raw = client.fetch_raw_markup(&title).await?;
    if raw.trim().is_empty() {
        return Err(Wiki2TexError::EmptyInput { title });
    }
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    // ── Step 2: Run the pipeline off the async runtime ───────────────────
    let pipeline_start = Instant::now();
    let run = {
        let converter = PandocConverter::from_config(config);
        let fixes = config.content_fixes.clone();
        let title = title.clone();
        let markup = raw.clone();
        tokio::task::spawn_blocking(move || {
            pipeline::run_phases(&title, &markup, &converter, &fixes)
        })
        .await
        .map_err(|e| Wiki2TexError::Internal(format!("pipeline task: {e}")))??
    };
    let pipeline_duration_ms = pipeline_start.elapsed().as_millis() as u64;

    // ── Step 3: Image manifest ───────────────────────────────────────────
    let images = if config.include_images {
        match image_manifest(&client, &title).await {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Skipping images for '{}': {}", title, e);
                None
            }
        }
    } else {
        None
    };

    let stats = ConversionStats {
        markup_bytes: raw.len(),
        stripped_bytes: run.stripped_bytes,
        converted_bytes: run.converted_bytes,
        latex_bytes: run.latex.len(),
        image_count: images.as_ref().map_or(0, |m| m.images.len()),
        fetch_duration_ms,
        pipeline_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: '{}', {} bytes, {}ms total",
        title, stats.latex_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        title,
        latex: run.latex,
        images,
        stats,
    })
}

async fn image_manifest(client: &WikiClient, title: &str) -> Result<ImageManifest, Wiki2TexError> {
    let html = client.fetch_rendered_html(title).await?;
    let summary = client.fetch_summary(title).await?;
    let images = images::extract_images(&html);
    debug!("Found {} images on '{}'", images.len(), title);
    Ok(ImageManifest {
        wiki_page_title: title.to_string(),
        wiki_page_summary: summary,
        images,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    title: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Wiki2TexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Wiki2TexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(title, config))
}

/// Convert a page and write its bundle under `dir`.
pub async fn convert_to_dir(
    title: impl AsRef<str>,
    dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<(ConversionOutput, BundlePaths), Wiki2TexError> {
    let output = convert(title, config).await?;
    let dir = dir.as_ref().to_path_buf();
    let (output, paths) = tokio::task::spawn_blocking(move || {
        let paths = output::write_bundle(&output, &dir);
        (output, paths)
    })
    .await
    .map_err(|e| Wiki2TexError::Internal(format!("write task: {e}")))?;
    Ok((output, paths?))
}

/// Convert many pages, up to `config.concurrency` at a time.
///
/// Results come back in input order, one per title. A failing title does not
/// affect the others.
pub async fn convert_batch<S: AsRef<str>>(
    titles: &[S],
    config: &ConversionConfig,
) -> Vec<Result<ConversionOutput, Wiki2TexError>> {
    let total = titles.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results: Vec<(usize, Result<ConversionOutput, Wiki2TexError>)> =
        stream::iter(titles.iter().enumerate().map(|(idx, title)| async move {
            let title = title.as_ref();
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_start(title);
            }
            let result = convert(title, config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result {
                    Ok(out) => cb.on_page_complete(title, out.latex.len()),
                    Err(e) => cb.on_page_error(title, &e.to_string()),
                }
            }
            (idx, result)
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);
    let results: Vec<_> = results.into_iter().map(|(_, r)| r).collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    info!("Batch complete: {}/{} pages", succeeded, total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    results
}
