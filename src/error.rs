use std::fmt;

use crate::line::Span;

/// Classifies a formatting error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattingErrorKind {
    /// Tabs and spaces mixed, or a line dedents to a level that
    /// matches no enclosing block.
    Indentation { reason: String },
    /// A keyword line with no body.
    UnterminatedBlock { keyword: String },
    /// Bracket closed without being opened, or opened and never closed.
    UnbalancedBracket { bracket: char },
    /// String literal inside a parameter list never closes.
    UnterminatedString,
    /// The Python formatter rejected a plain-code segment.
    InvalidPython {
        message: String,
        first_line: usize,
        last_line: usize,
    },
    /// A line inside a block that is not one of the directives
    /// accepted there.
    UnrecognizedKeywordSyntax { text: String, context: &'static str },
    /// The Python formatter could not be run at all.
    ExternalFormatter { message: String },
}

impl fmt::Display for FormattingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indentation { reason } => {
                write!(f, "inconsistent indentation: {reason}")
            }
            Self::UnterminatedBlock { keyword } => {
                write!(f, "'{keyword}' has no body")
            }
            Self::UnbalancedBracket { bracket } => {
                write!(f, "unbalanced bracket '{bracket}'")
            }
            Self::UnterminatedString => {
                write!(f, "unterminated string literal")
            }
            Self::InvalidPython {
                message,
                first_line,
                last_line,
            } => {
                write!(
                    f,
                    "invalid python in lines {first_line}-{last_line}: \
                     {message}"
                )
            }
            Self::UnrecognizedKeywordSyntax { text, context } => {
                write!(f, "unrecognized syntax in {context}: '{text}'")
            }
            Self::ExternalFormatter { message } => {
                write!(f, "python formatter failed: {message}")
            }
        }
    }
}

/// Error produced while scanning, parsing, or emitting a workflow file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct FormattingError {
    pub kind: FormattingErrorKind,
    pub span: Span,
}

impl FormattingError {
    pub(crate) const fn new(kind: FormattingErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// 1-based line the error points at.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.span.line
    }
}
