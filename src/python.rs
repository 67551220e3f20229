//! Port to the external Python formatter.
//!
//! Plain-code segments are handed to a `PythonFormatter` one at a time.
//! The core never inspects Python itself; anything implementing this
//! trait can stand in for the real tool.

use std::io::Write as _;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;

/// Reason the Python formatter did not produce output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PythonError {
    /// The code was rejected; position is relative to the code passed in.
    #[error("cannot parse {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    /// The formatter could not be run or failed for another reason.
    #[error("{0}")]
    Unavailable(String),
}

/// Synchronous formatter for a block of Python source.
pub trait PythonFormatter {
    /// Format `code`, which starts at column zero and ends with a newline.
    fn format(&self, code: &str) -> Result<String, PythonError>;
}

impl<F> PythonFormatter for F
where
    F: Fn(&str) -> Result<String, PythonError>,
{
    fn format(&self, code: &str) -> Result<String, PythonError> {
        self(code)
    }
}

/// Returns code unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PythonFormatter for Passthrough {
    fn format(&self, code: &str) -> Result<String, PythonError> {
        Ok(code.to_string())
    }
}

static CANNOT_PARSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Cannot parse(?: for target version [^:]+)?: (\d+):(\d+): ?(.*)")
        .expect("valid regex")
});

/// Runs the `black` executable over stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Black {
    pub command: String,
    pub line_length: usize,
}

impl Default for Black {
    fn default() -> Self {
        Self {
            command: "black".to_string(),
            line_length: 88,
        }
    }
}

impl Black {
    #[must_use]
    pub fn new(command: impl Into<String>, line_length: usize) -> Self {
        Self {
            command: command.into(),
            line_length,
        }
    }
}

impl PythonFormatter for Black {
    fn format(&self, code: &str) -> Result<String, PythonError> {
        let unavailable = |e: std::io::Error| {
            PythonError::Unavailable(format!("{}: {e}", self.command))
        };

        let mut child = Command::new(&self.command)
            .args(["--quiet", "--line-length", &self.line_length.to_string(), "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(unavailable)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).map_err(unavailable)?;
        }
        let output = child.wait_with_output().map_err(unavailable)?;

        tracing::trace!(
            status = ?output.status,
            bytes = output.stdout.len(),
            "black finished"
        );

        if output.status.success() {
            return String::from_utf8(output.stdout)
                .map_err(|e| PythonError::Unavailable(format!("non-UTF-8 output: {e}")));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(parse_black_error(&stderr))
    }
}

/// Turn black's stderr into a `PythonError`.
fn parse_black_error(stderr: &str) -> PythonError {
    if let Some(caps) = CANNOT_PARSE_RE.captures(stderr) {
        let line = caps[1].parse().unwrap_or(1);
        let column = caps[2].parse().unwrap_or(0);
        return PythonError::Syntax {
            line,
            column,
            message: caps[3].trim().to_string(),
        };
    }
    PythonError::Unavailable(stderr.trim().to_string())
}
