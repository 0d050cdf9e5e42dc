//! Configuration types for wiki-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is passed explicitly into
//! every entry point; the library keeps no process-wide converter, client or
//! output directory.

use crate::error::Wiki2TexError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default MediaWiki action API endpoint.
pub const DEFAULT_API_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Source-data content fixes applied by default during markup stripping.
///
/// `cokernel` is a stray keyword fragment that corrupts one `{{math|...}}`
/// template in the "Linear map" article. It is a data patch, not a rule, and
/// callers can replace or empty the list.
pub const DEFAULT_CONTENT_FIXES: &[&str] = &["cokernel"];

/// Configuration for a wiki-to-LaTeX conversion.
///
/// # Example
/// ```rust
/// use wiki2tex::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .pandoc_path("/usr/local/bin/pandoc")
///     .include_images(false)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Path or program name of the pandoc executable. Default: `pandoc`.
    pub pandoc_path: PathBuf,

    /// Converter input dialect. Default: `mediawiki`.
    pub source_format: String,

    /// Converter output language. Default: `latex`.
    pub target_format: String,

    /// MediaWiki action API endpoint. Default: English Wikipedia.
    pub api_endpoint: String,

    /// User-Agent sent with every API request.
    ///
    /// Wikimedia rejects anonymous clients without a descriptive agent.
    pub user_agent: String,

    /// HTTP timeout per API request in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Resolve the requested title through a search first. Default: true.
    pub resolve_title: bool,

    /// Fetch the rendered page and build the image manifest. Default: true.
    pub include_images: bool,

    /// Literal fragments deleted from the raw markup during stripping.
    /// Default: [`DEFAULT_CONTENT_FIXES`].
    pub content_fixes: Vec<String>,

    /// Documents converted at once in batch mode. Default: 4.
    pub concurrency: usize,

    /// Optional batch progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pandoc_path: PathBuf::from("pandoc"),
            source_format: "mediawiki".to_string(),
            target_format: "latex".to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            user_agent: format!(
                "wiki2tex/{} (https://crates.io/crates/wiki2tex)",
                env!("CARGO_PKG_VERSION")
            ),
            fetch_timeout_secs: 30,
            resolve_title: true,
            include_images: true,
            content_fixes: DEFAULT_CONTENT_FIXES.iter().map(|s| s.to_string()).collect(),
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("pandoc_path", &self.pandoc_path)
            .field("source_format", &self.source_format)
            .field("target_format", &self.target_format)
            .field("api_endpoint", &self.api_endpoint)
            .field("user_agent", &self.user_agent)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("resolve_title", &self.resolve_title)
            .field("include_images", &self.include_images)
            .field("content_fixes", &self.content_fixes)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn source_format(mut self, format: impl Into<String>) -> Self {
        self.config.source_format = format.into();
        self
    }

    pub fn target_format(mut self, format: impl Into<String>) -> Self {
        self.config.target_format = format.into();
        self
    }

    pub fn api_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.api_endpoint = url.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn resolve_title(mut self, v: bool) -> Self {
        self.config.resolve_title = v;
        self
    }

    pub fn include_images(mut self, v: bool) -> Self {
        self.config.include_images = v;
        self
    }

    /// Replace the content-fix list.
    pub fn content_fixes<I, S>(mut self, fixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.content_fixes = fixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Wiki2TexError> {
        let c = &self.config;
        if c.pandoc_path.as_os_str().is_empty() {
            return Err(Wiki2TexError::InvalidConfig(
                "pandoc path must not be empty".into(),
            ));
        }
        if c.source_format.trim().is_empty() || c.target_format.trim().is_empty() {
            return Err(Wiki2TexError::InvalidConfig(
                "converter formats must not be empty".into(),
            ));
        }
        if reqwest::Url::parse(&c.api_endpoint).is_err() {
            return Err(Wiki2TexError::InvalidConfig(format!(
                "API endpoint is not a valid URL: '{}'",
                c.api_endpoint
            )));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(Wiki2TexError::InvalidConfig(
                "Fetch timeout must be ≥ 1 second".into(),
            ));
        }
        if c.content_fixes.iter().any(|f| f.is_empty()) {
            return Err(Wiki2TexError::InvalidConfig(
                "content fixes must be non-empty strings".into(),
            ));
        }
        Ok(self.config)
    }
}
