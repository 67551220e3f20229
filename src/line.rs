use crate::keyword::Keyword;

/// Source location for error reporting, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Indentation unit detected from the first indented line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentUnit {
    Tab,
    Spaces(usize),
}

/// Document-wide indentation style, computed once by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStyle {
    pub unit: IndentUnit,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            unit: IndentUnit::Spaces(4),
        }
    }
}

impl DocumentStyle {
    /// Whitespace for `depth` indentation levels.
    #[must_use]
    pub fn indent(&self, depth: usize) -> String {
        match self.unit {
            IndentUnit::Tab => "\t".repeat(depth),
            IndentUnit::Spaces(n) => " ".repeat(n * depth),
        }
    }

    /// Indentation level of a line whose leading whitespace is `leading`.
    #[must_use]
    pub fn depth_of(&self, leading: &str) -> usize {
        match self.unit {
            IndentUnit::Tab => leading.chars().take_while(|&c| c == '\t').count(),
            IndentUnit::Spaces(n) => leading.len() / n.max(1),
        }
    }
}

/// A line that opens a keyword block or directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordLine {
    pub keyword: Keyword,
    /// Block name, e.g. `a` in `rule a:`.
    pub name: Option<String>,
    /// Raw text after the colon, comment included.
    pub rest: String,
    /// 1-based column where `rest` starts.
    pub rest_column: usize,
}

/// Line classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// Full-line comment.
    Comment,
    /// Recognized keyword at the start of a logical line.
    Keyword(KeywordLine),
    /// Any other logical line start.
    Code,
    /// Physical line continuing an open bracket, string, or `\`.
    Continuation { in_string: bool },
}

/// One physical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    /// Text without the line terminator.
    pub text: String,
    /// Width of leading whitespace in characters.
    pub indent: usize,
    /// Indentation level under the document style.
    pub depth: usize,
    pub kind: LineKind,
    /// Trailing `# ...` comment, verbatim.
    pub comment: Option<String>,
}

impl Line {
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self.kind, LineKind::Blank)
    }

    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        matches!(self.kind, LineKind::Continuation { .. })
    }

    #[must_use]
    pub const fn in_string(&self) -> bool {
        matches!(self.kind, LineKind::Continuation { in_string: true })
    }

    /// Text with leading whitespace removed.
    #[must_use]
    pub fn content(&self) -> &str {
        self.text.trim_start()
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.number, self.indent + 1)
    }
}
