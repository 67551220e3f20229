//! Formatter for Snakemake workflow files.
//!
//! A workflow file mixes plain Python with keyword blocks (`rule`,
//! `checkpoint`, directives such as `input:` and `output:`). This crate
//! scans the file into classified lines, parses them into an arena of
//! segments, renders keyword blocks canonically, and hands the Python in
//! between to an external formatter.
//!
//! # Quick start
//!
//! ```
//! use snakefmt_rs::{Passthrough, format_str};
//!
//! let input = "rule a:\n    input: 'a.txt'\n    shell: 'touch {output}'\n";
//! let output = format_str(input, &Passthrough).unwrap();
//! assert_eq!(
//!     output,
//!     "rule a:\n    input:\n        \"a.txt\", \n    shell:\n        \"touch {output}\", \n"
//! );
//! ```
//!
//! ## Inspect the parsed structure
//!
//! ```
//! use snakefmt_rs::{Keyword, parse_str};
//!
//! let file = parse_str("rule all:\n    input: 'x', 'y'\n").unwrap();
//! let rule = file.find(Keyword::Rule, "all").unwrap();
//! let input = file.directive(rule, Keyword::Input).unwrap();
//! assert_eq!(input.parameters().unwrap().parameters().count(), 2);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod config;
pub mod error;
pub mod formatter;
pub mod keyword;
pub mod line;
pub mod params;
pub mod parser;
pub mod python;
pub mod scanner;

pub use ast::{Body, KeywordBlock, Node, NodeId, PlainCode, Segment, Snakefile};
pub use config::{Config, ConfigError, FileFilter};
pub use error::{FormattingError, FormattingErrorKind};
pub use formatter::emit;
pub use keyword::{Context, Keyword};
pub use line::{DocumentStyle, IndentUnit, Line, LineKind, Span};
pub use params::{Parameter, ParameterList, format_parameters};
pub use parser::parse;
pub use python::{Black, Passthrough, PythonError, PythonFormatter};
pub use scanner::{ScannedSource, scan};

/// Unified error type for callers that also read files and config.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file could not be formatted.
    #[error("{0}")]
    Format(#[from] FormattingError),
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// A source file could not be read or written.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Scan and parse a workflow file in one step.
pub fn parse_str(source: &str) -> Result<Snakefile, FormattingError> {
    let scanned = scan(source)?;
    parse(&scanned)
}

/// Format a whole workflow file.
///
/// All-or-nothing: on error no partial output is produced.
pub fn format_str(source: &str, python: &dyn PythonFormatter) -> Result<String, FormattingError> {
    let snakefile = parse_str(source)?;
    emit(&snakefile, python)
}
