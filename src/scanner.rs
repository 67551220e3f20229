use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FormattingError, FormattingErrorKind};
use crate::keyword::Keyword;
use crate::line::{DocumentStyle, IndentUnit, KeywordLine, Line, LineKind, Span};

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(rule|checkpoint|subworkflow|module)(?:\s+(\w+))?\s*:(.*)$").expect("valid regex")
});
static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*:(.*)$").expect("valid regex"));

/// Scanner output: every physical line, classified, plus the
/// document's indentation style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSource {
    pub style: DocumentStyle,
    pub lines: Vec<Line>,
}

/// Split a workflow source into classified lines.
///
/// # Errors
///
/// Returns an `Indentation` error when a logical line uses tabs in a
/// space-indented document or the reverse.
pub fn scan(source: &str) -> Result<ScannedSource, FormattingError> {
    Scanner::new(source).scan()
}

/// Where a line of code sits relative to string literals spanning lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StringEdges {
    /// Starts inside a string opened on an earlier line.
    pub starts_inside: bool,
    /// Ends inside a string that continues on the next line.
    pub ends_inside: bool,
}

/// String edges of each line of `text`.
pub(crate) fn string_continuations(text: &str) -> Vec<StringEdges> {
    let mut state = LexState::default();
    text.split('\n')
        .map(|line| {
            let starts_inside = state.in_string();
            state.feed(line);
            StringEdges {
                starts_inside,
                ends_inside: state.in_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
}

/// Python lexical state carried from one physical line to the next.
#[derive(Debug, Default)]
struct LexState {
    string: Option<OpenString>,
    brackets: usize,
    backslash: bool,
}

impl LexState {
    const fn in_string(&self) -> bool {
        self.string.is_some()
    }

    const fn continues(&self) -> bool {
        self.string.is_some() || self.brackets > 0 || self.backslash
    }

    /// Advance over one line, returning the byte offset of a trailing
    /// comment if there is one.
    fn feed(&mut self, text: &str) -> Option<usize> {
        self.backslash = false;
        let mut chars = text.char_indices().peekable();
        let mut comment = None;

        while let Some((i, ch)) = chars.next() {
            if let Some(open) = self.string {
                match ch {
                    '\\' => {
                        chars.next();
                    }
                    q if q == open.quote => {
                        if !open.triple {
                            self.string = None;
                        } else if is_triple(&text[i..], q) {
                            chars.next();
                            chars.next();
                            self.string = None;
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match ch {
                '#' => {
                    comment = Some(i);
                    break;
                }
                '\'' | '"' => {
                    let triple = is_triple(&text[i..], ch);
                    if triple {
                        chars.next();
                        chars.next();
                    }
                    self.string = Some(OpenString { quote: ch, triple });
                }
                '(' | '[' | '{' => self.brackets += 1,
                ')' | ']' | '}' => self.brackets = self.brackets.saturating_sub(1),
                '\\' if chars.peek().is_none() => self.backslash = true,
                _ => {}
            }
        }

        // single-quoted strings end with the line unless escaped
        if let Some(open) = self.string {
            if !open.triple && !text.ends_with('\\') {
                self.string = None;
            }
        }

        comment
    }
}

fn is_triple(text: &str, quote: char) -> bool {
    let mut chars = text.chars();
    chars.next() == Some(quote) && chars.next() == Some(quote) && chars.next() == Some(quote)
}

fn leading_whitespace(text: &str) -> &str {
    let end = text.len() - text.trim_start_matches([' ', '\t']).len();
    &text[..end]
}

fn detect_style(leading: &str) -> DocumentStyle {
    let unit = if leading.starts_with('\t') {
        IndentUnit::Tab
    } else {
        IndentUnit::Spaces(leading.chars().take_while(|&c| c == ' ').count())
    };
    DocumentStyle { unit }
}

fn classify(content: &str, indent: usize) -> Option<KeywordLine> {
    let column_of = |byte: usize| indent + content[..byte].chars().count() + 1;

    if let Some(caps) = BLOCK_RE.captures(content) {
        let keyword = Keyword::from_text(&caps[1])?;
        let rest = caps.get(3)?;
        return Some(KeywordLine {
            keyword,
            name: caps.get(2).map(|m| m.as_str().to_string()),
            rest: rest.as_str().to_string(),
            rest_column: column_of(rest.start()),
        });
    }

    let caps = DIRECTIVE_RE.captures(content)?;
    let keyword = Keyword::from_text(&caps[1])?;
    if keyword.is_block() {
        return None;
    }
    let rest = caps.get(2)?;
    Some(KeywordLine {
        keyword,
        name: None,
        rest: rest.as_str().to_string(),
        rest_column: column_of(rest.start()),
    })
}

struct Scanner<'a> {
    input: &'a str,
    state: LexState,
    style: Option<DocumentStyle>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        Self {
            input,
            state: LexState::default(),
            style: None,
        }
    }

    fn scan(mut self) -> Result<ScannedSource, FormattingError> {
        let mut lines = Vec::new();

        for (index, text) in self.input.lines().enumerate() {
            lines.push(self.scan_line(index + 1, text)?);
        }

        let style = self.style.unwrap_or_default();
        for line in &mut lines {
            line.depth = style.depth_of(leading_whitespace(&line.text));
        }

        tracing::debug!(lines = lines.len(), ?style, "scanned source");
        Ok(ScannedSource { style, lines })
    }

    fn scan_line(&mut self, number: usize, text: &str) -> Result<Line, FormattingError> {
        let continued = self.state.continues();
        let in_string = self.state.in_string();
        let comment = self.state.feed(text).map(|at| text[at..].to_string());

        let leading = leading_whitespace(text);
        let indent = leading.chars().count();
        let content = &text[leading.len()..];

        let kind = if continued {
            LineKind::Continuation { in_string }
        } else if content.is_empty() {
            LineKind::Blank
        } else if content.starts_with('#') {
            LineKind::Comment
        } else {
            if indent > 0 {
                self.check_indentation(number, leading)?;
            }
            classify(content, indent).map_or(LineKind::Code, LineKind::Keyword)
        };

        Ok(Line {
            number,
            text: text.to_string(),
            indent,
            depth: 0,
            kind,
            comment,
        })
    }

    fn check_indentation(&mut self, number: usize, leading: &str) -> Result<(), FormattingError> {
        let Some(style) = self.style else {
            self.style = Some(detect_style(leading));
            return Ok(());
        };

        let reason = match style.unit {
            IndentUnit::Tab if leading.starts_with(' ') => "expected tabs, found spaces",
            IndentUnit::Spaces(_) if leading.contains('\t') => "expected spaces, found a tab",
            _ => return Ok(()),
        };

        Err(FormattingError::new(
            FormattingErrorKind::Indentation {
                reason: reason.to_string(),
            },
            Span::new(number, 1),
        ))
    }
}
