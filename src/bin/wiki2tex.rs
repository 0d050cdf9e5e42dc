//! CLI binary for wiki2tex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints or writes the results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wiki2tex::{
    convert_batch, write_bundle, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    ProgressCallback, Wiki2TexError,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// finished page. Pages finish out of order when converted concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-title wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, title: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(title))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} page(s)…"))
        ));
    }

    fn on_page_start(&self, title: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(title.to_string(), Instant::now());
        }
        self.bar.set_message(title.to_string());
    }

    fn on_page_complete(&self, title: &str, latex_len: usize) {
        let secs = self.elapsed_secs(title);
        self.bar.println(format!(
            "  {} {:<32}  {:<8}  {}",
            green("✓"),
            title,
            dim(&format!("{latex_len:>6} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, title: &str, error: &str) {
        let secs = self.elapsed_secs(title);
        // First line only; the rest is a remediation hint.
        let first = error.lines().next().unwrap_or(error);
        let msg: String = if first.chars().count() > 80 {
            first.chars().take(79).chain(['…']).collect()
        } else {
            first.to_string()
        };
        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            title,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} page(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One article to stdout
  wiki2tex "Linear map"

  # Several articles into per-page directories
  wiki2tex "Linear map" "Vector space" -o out/

  # Exact title, no search, no image manifest
  wiki2tex --no-search --no-images "Linear map"

  # Custom pandoc and another wiki
  wiki2tex --pandoc /opt/pandoc/bin/pandoc \
           --api-endpoint https://de.wikipedia.org/w/api.php "Lineare Abbildung"

  # Structured output
  wiki2tex --json "Linear map" > linear_map.json

OUTPUT LAYOUT (-o DIR):
  DIR/<title_lowercased_with_underscores>/<Title>_latex.tex
  DIR/<title_lowercased_with_underscores>/<Title>_images.json

ENVIRONMENT VARIABLES:
  WIKI2TEX_OUTPUT_DIR      Default for --output-dir
  WIKI2TEX_PANDOC          Path to the pandoc executable
  WIKI2TEX_API_ENDPOINT    MediaWiki action API endpoint
  WIKI2TEX_USER_AGENT      User-Agent for API requests
  WIKI2TEX_CONCURRENCY     Pages converted at once
  WIKI2TEX_FETCH_TIMEOUT   Per-request HTTP timeout in seconds
  RUST_LOG                 Overrides the log filter (e.g. wiki2tex=trace)

SETUP:
  pandoc must be installed and on PATH (or passed with --pandoc).
"#;

/// Convert encyclopedia articles to LaTeX.
#[derive(Parser, Debug)]
#[command(
    name = "wiki2tex",
    version,
    about = "Convert encyclopedia articles to compilable LaTeX",
    long_about = "Fetch encyclopedia articles over the MediaWiki API, strip wiki-specific \
markup, convert with pandoc, and repair the result into a standalone LaTeX document \
with an optional JSON manifest of the article's images.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article titles (or search queries unless --no-search).
    #[arg(required = true)]
    titles: Vec<String>,

    /// Write one bundle directory per title here instead of printing LaTeX.
    #[arg(short, long, env = "WIKI2TEX_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Path to the pandoc executable.
    #[arg(long, env = "WIKI2TEX_PANDOC", default_value = "pandoc")]
    pandoc: PathBuf,

    /// MediaWiki action API endpoint.
    #[arg(long, env = "WIKI2TEX_API_ENDPOINT", default_value = wiki2tex::config::DEFAULT_API_ENDPOINT)]
    api_endpoint: String,

    /// Use titles as given instead of resolving them through search.
    #[arg(long, env = "WIKI2TEX_NO_SEARCH")]
    no_search: bool,

    /// Skip the rendered-page fetch and the image manifest.
    #[arg(long, env = "WIKI2TEX_NO_IMAGES")]
    no_images: bool,

    /// Print structured JSON (ConversionOutput) instead of LaTeX.
    #[arg(long, env = "WIKI2TEX_JSON")]
    json: bool,

    /// Literal fragment to delete from the raw markup. Repeatable; replaces
    /// the default list.
    #[arg(long = "content-fix", value_name = "TEXT")]
    content_fixes: Vec<String>,

    /// Disable all content fixes.
    #[arg(long, conflicts_with = "content_fixes")]
    no_content_fixes: bool,

    /// Number of pages converted concurrently.
    #[arg(short, long, env = "WIKI2TEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "WIKI2TEX_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// User-Agent sent to the API.
    #[arg(long, env = "WIKI2TEX_USER_AGENT")]
    user_agent: Option<String>,

    /// Disable progress bar.
    #[arg(long, env = "WIKI2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WIKI2TEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WIKI2TEX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.titles.len() > 1;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let start = Instant::now();
    let results = convert_batch(&cli.titles, &config).await;

    let mut failed = 0usize;
    let mut outputs: Vec<ConversionOutput> = Vec::with_capacity(results.len());
    for (requested, result) in cli.titles.iter().zip(results) {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => {
                failed += 1;
                if !show_progress {
                    report_error(requested, &e);
                }
            }
        }
    }

    // ── Emit results ─────────────────────────────────────────────────────
    if let Some(ref dir) = cli.output_dir {
        failed += write_bundles(&outputs, dir, cli.json, cli.quiet)?;
    } else if cli.json {
        let json = if outputs.len() == 1 {
            serde_json::to_string_pretty(&outputs[0])
        } else {
            serde_json::to_string_pretty(&outputs)
        }
        .context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for output in &outputs {
            handle
                .write_all(output.latex.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Converted {}/{} page(s) in {}ms",
            outputs.len(),
            cli.titles.len(),
            start.elapsed().as_millis()
        );
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report_error(title: &str, err: &Wiki2TexError) {
    eprintln!("{} {}: {}", red("✗"), bold(title), err);
    if let Some(hint) = error_hint(err) {
        eprintln!("  {}", dim(hint));
    }
}

/// Extra guidance for failures caused by the title rather than the pipeline.
fn error_hint(err: &Wiki2TexError) -> Option<&'static str> {
    err.is_input_error()
        .then_some("check the spelling, or drop --no-search to resolve the title by search")
}

/// Write each output's bundle under `dir`. Returns the number of failures.
fn write_bundles(outputs: &[ConversionOutput], dir: &Path, json: bool, quiet: bool) -> Result<usize> {
    let mut failed = 0;
    let mut written = Vec::new();
    for output in outputs {
        match write_bundle(output, dir) {
            Ok(paths) => {
                if !quiet && !json {
                    eprintln!(
                        "{} {}  →  {}",
                        green("✔"),
                        output.title,
                        bold(&paths.latex.display().to_string())
                    );
                }
                written.push(paths);
            }
            Err(e) => {
                failed += 1;
                report_error(&output.title, &e);
            }
        }
    }
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&written).context("Failed to serialise paths")?
        );
    }
    Ok(failed)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .pandoc_path(&cli.pandoc)
        .api_endpoint(&cli.api_endpoint)
        .resolve_title(!cli.no_search)
        .include_images(!cli.no_images)
        .concurrency(cli.concurrency)
        .fetch_timeout_secs(cli.fetch_timeout);

    if cli.no_content_fixes {
        builder = builder.content_fixes(Vec::<String>::new());
    } else if !cli.content_fixes.is_empty() {
        builder = builder.content_fixes(cli.content_fixes.iter().cloned());
    }
    if let Some(ref agent) = cli.user_agent {
        builder = builder.user_agent(agent);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
