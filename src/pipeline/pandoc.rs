//! Converter adapter: hand stripped markup to an external converter.
//!
//! The adapter only marshals text in and out. Conversion correctness belongs
//! to the external tool; any failure (missing binary, non-zero exit, empty
//! input, non-UTF-8 output) becomes [`Wiki2TexError::Conversion`] and is
//! never retried.
//!
//! Anything implementing [`Converter`] can stand in for pandoc, including a
//! plain closure, which is how the pipeline is tested without the binary.

use crate::config::ConversionConfig;
use crate::error::Wiki2TexError;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// A text → text markup converter.
pub trait Converter: Send + Sync {
    /// Name used in error messages.
    fn name(&self) -> &str {
        "converter"
    }

    /// Convert `text`, failing with [`Wiki2TexError::Conversion`].
    fn convert(&self, text: &str) -> Result<String, Wiki2TexError>;
}

impl<F> Converter for F
where
    F: Fn(&str) -> Result<String, Wiki2TexError> + Send + Sync,
{
    fn convert(&self, text: &str) -> Result<String, Wiki2TexError> {
        self(text)
    }
}

/// Runs `pandoc --from <source> --to <target>` over stdin/stdout.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    from: String,
    to: String,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(
            &config.pandoc_path,
            &config.source_format,
            &config.target_format,
        )
    }

    fn failure(&self, reason: impl Into<String>) -> Wiki2TexError {
        Wiki2TexError::Conversion {
            converter: self.program.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl Converter for PandocConverter {
    fn name(&self) -> &str {
        "pandoc"
    }

    fn convert(&self, text: &str) -> Result<String, Wiki2TexError> {
        if text.trim().is_empty() {
            return Err(self.failure("input is empty"));
        }

        let mut child = Command::new(&self.program)
            .arg("--from")
            .arg(&self.from)
            .arg("--to")
            .arg(&self.to)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => self.failure(
                    "executable not found\nInstall pandoc or point --pandoc at an existing copy.",
                ),
                _ => self.failure(format!("failed to start: {e}")),
            })?;

        // pandoc reads its whole input before writing, so filling stdin first
        // cannot deadlock against a full stdout pipe.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| self.failure(format!("failed to write input: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.failure(format!("failed to collect output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("{}: {}", output.status, stderr.trim())));
        }

        let latex = String::from_utf8(output.stdout)
            .map_err(|e| self.failure(format!("output is not UTF-8: {e}")))?;
        debug!(
            "{} → {}: {} bytes in, {} bytes out",
            self.from,
            self.to,
            text.len(),
            latex.len()
        );
        Ok(latex)
    }
}
