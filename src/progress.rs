//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to hear about
//! each document as [`crate::convert::convert_batch`] works through a list of
//! titles. The CLI drives its progress bar from these events.
//!
//! # Example
//!
//! ```rust
//! use wiki2tex::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, title: &str, latex_len: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: {title} ({latex_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by batch conversion as it processes each page title.
///
/// Documents are converted concurrently, so `on_page_start`,
/// `on_page_complete` and `on_page_error` may be called from different
/// threads at once. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any document is fetched.
    fn on_batch_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the markup for `title` is requested.
    fn on_page_start(&self, title: &str) {
        let _ = title;
    }

    /// Called when a document is fully built.
    ///
    /// `latex_len` is the byte length of the finished document.
    fn on_page_complete(&self, title: &str, latex_len: usize) {
        let _ = (title, latex_len);
    }

    /// Called when a document fails; `error` is the rendered error message.
    fn on_page_error(&self, title: &str, error: &str) {
        let _ = (title, error);
    }

    /// Called once after every title has been attempted.
    fn on_batch_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
