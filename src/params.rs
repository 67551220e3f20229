//! Splitting and re-rendering of directive parameter lists.
//!
//! A parameter list is everything after a directive's colon, up to the
//! end of its indented body. Items are separated by commas at bracket
//! depth zero; commas inside brackets, string literals, or the argument
//! list of a top-level `lambda` do not split. Values are never parsed as
//! Python: apart from string re-quoting and whitespace at line edges,
//! their text is kept as written.

use std::fmt::Write as _;

use crate::error::{FormattingError, FormattingErrorKind};
use crate::line::{DocumentStyle, Span};

/// How a continuation line of a multi-line value is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueIndent {
    /// Inside a multi-line string literal; emitted untouched.
    Verbatim,
    /// Inside `n` open brackets.
    Nested(usize),
}

/// One physical line of a parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueLine {
    pub text: String,
    pub indent: ValueIndent,
}

/// One comma-separated item of a directive's parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Keyword name in `name=value` form.
    pub name: Option<String>,
    /// Value lines; the first line's indent is ignored.
    pub value: Vec<ValueLine>,
    pub span: Span,
    /// End-of-line comment, verbatim.
    pub comment: Option<String>,
}

impl Parameter {
    /// Value text with lines joined by newlines.
    #[must_use]
    pub fn value_text(&self) -> String {
        self.value
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterItem {
    Parameter(Parameter),
    /// Full-line comment between parameters.
    Comment(String),
}

/// Ordered items of one directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterList {
    pub items: Vec<ParameterItem>,
}

/// A line of raw parameter text and where it came from.
#[derive(Debug, Clone, Copy)]
pub struct RawLine<'a> {
    pub number: usize,
    /// 1-based column of the first character of `text`.
    pub column: usize,
    pub text: &'a str,
}

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter().filter_map(|item| match item {
            ParameterItem::Parameter(param) => Some(param),
            ParameterItem::Comment(_) => None,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters().next().is_none()
    }

    /// The single positional, single-line, uncommented parameter, if
    /// that is all the list holds.
    #[must_use]
    pub fn sole_value(&self) -> Option<&str> {
        match self.items.as_slice() {
            [
                ParameterItem::Parameter(Parameter {
                    name: None,
                    value,
                    comment: None,
                    ..
                }),
            ] if value.len() == 1 => Some(value[0].text.as_str()),
            _ => None,
        }
    }

    /// Render one item per line at `depth + 1`, each terminated by `, `.
    #[must_use]
    pub fn render(&self, depth: usize, style: &DocumentStyle) -> String {
        let base = depth + 1;
        let mut out = String::new();

        for item in &self.items {
            match item {
                ParameterItem::Comment(comment) => {
                    out.push_str(&style.indent(base));
                    out.push_str(comment);
                    out.push('\n');
                }
                ParameterItem::Parameter(param) => render_parameter(&mut out, param, base, style),
            }
        }

        out
    }
}

fn render_parameter(out: &mut String, param: &Parameter, base: usize, style: &DocumentStyle) {
    let last = param.value.len().saturating_sub(1);

    for (i, line) in param.value.iter().enumerate() {
        if i == 0 {
            out.push_str(&style.indent(base));
            if let Some(name) = &param.name {
                let _ = write!(out, "{name}=");
            }
        } else if let ValueIndent::Nested(depth) = line.indent {
            let closers = line
                .text
                .chars()
                .take_while(|c| matches!(c, ')' | ']' | '}'))
                .count();
            out.push_str(&style.indent(base + depth.saturating_sub(closers)));
        }
        out.push_str(&line.text);

        if i == last {
            out.push_str(", ");
            if let Some(comment) = &param.comment {
                let _ = write!(out, " {comment}");
            }
        }
        out.push('\n');
    }
}

/// Split raw parameter lines into items.
///
/// # Errors
///
/// Returns `UnbalancedBracket` for a bracket that never closes or closes
/// the wrong opener, and `UnterminatedString` for a string literal that
/// never closes.
pub fn parse_parameters(lines: &[RawLine<'_>]) -> Result<ParameterList, FormattingError> {
    let mut splitter = Splitter::default();
    for line in lines {
        splitter.line(line)?;
    }
    splitter.finish()
}

/// Reformat the raw text of one parameter list for a directive at
/// `depth`.
///
/// # Errors
///
/// See [`parse_parameters`].
pub fn format_parameters(
    raw: &str,
    depth: usize,
    style: &DocumentStyle,
) -> Result<String, FormattingError> {
    let lines: Vec<RawLine<'_>> = raw
        .lines()
        .enumerate()
        .map(|(i, text)| RawLine {
            number: i + 1,
            column: 1,
            text,
        })
        .collect();
    Ok(parse_parameters(&lines)?.render(depth, style))
}

struct StringLiteral {
    quote: char,
    triple: bool,
    raw: bool,
    body: String,
    span: Span,
}

struct Draft {
    lines: Vec<ValueLine>,
    current: ValueLine,
    span: Span,
    comments: Vec<String>,
}

impl Draft {
    fn new_line(&mut self, indent: ValueIndent) {
        let line = ValueLine {
            text: String::new(),
            indent,
        };
        self.lines.push(std::mem::replace(&mut self.current, line));
    }
}

#[derive(Default)]
struct Splitter {
    items: Vec<ParameterItem>,
    draft: Option<Draft>,
    brackets: Vec<(char, Span)>,
    string: Option<StringLiteral>,
    lambda_params: bool,
    /// The previous line ended with an explicit `\` join.
    backslash: bool,
    pending_space: bool,
    last_param_line: Option<usize>,
    line_number: usize,
}

impl Splitter {
    fn line(&mut self, line: &RawLine<'_>) -> Result<(), FormattingError> {
        self.line_number = line.number;

        if self.string.is_none() {
            if let Some(draft) = &mut self.draft {
                if self.brackets.is_empty() || self.backslash {
                    self.pending_space = true;
                } else {
                    draft.new_line(ValueIndent::Nested(self.brackets.len()));
                }
            }
        }
        self.backslash = false;

        let chars: Vec<char> = line.text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            let span = Span::new(line.number, line.column + i);

            if let Some(lit) = &mut self.string {
                if ch == '\\' {
                    lit.body.push(ch);
                    if let Some(&next) = chars.get(i + 1) {
                        lit.body.push(next);
                    }
                    i += 2;
                    continue;
                }
                let closes = ch == lit.quote
                    && (!lit.triple
                        || (chars.get(i + 1) == Some(&ch) && chars.get(i + 2) == Some(&ch)));
                if closes {
                    i += if lit.triple { 3 } else { 1 };
                    if let Some(lit) = self.string.take() {
                        self.push_literal(&lit);
                    }
                } else {
                    lit.body.push(ch);
                    i += 1;
                }
                continue;
            }

            match ch {
                '#' => {
                    let comment: String = chars[i..].iter().collect();
                    self.comment(comment.trim_end().to_string());
                    break;
                }
                '\'' | '"' => {
                    let triple = chars.get(i + 1) == Some(&ch) && chars.get(i + 2) == Some(&ch);
                    let raw = self.string_prefix().contains(['r', 'R']);
                    self.ensure_draft(span);
                    self.string = Some(StringLiteral {
                        quote: ch,
                        triple,
                        raw,
                        body: String::new(),
                        span,
                    });
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '\\' if chars[i + 1..].iter().all(|c| c.is_whitespace()) => {
                    self.backslash = true;
                    break;
                }
                '(' | '[' | '{' => {
                    self.push_char(ch, span);
                    self.brackets.push((ch, span));
                }
                ')' | ']' | '}' => match self.brackets.pop() {
                    Some((open, _)) if closer_of(open) == ch => self.push_char(ch, span),
                    _ => {
                        return Err(FormattingError::new(
                            FormattingErrorKind::UnbalancedBracket { bracket: ch },
                            span,
                        ));
                    }
                },
                ',' if self.brackets.is_empty() && !self.lambda_params => self.finish_item(),
                ':' if self.brackets.is_empty() && self.lambda_params => {
                    self.lambda_params = false;
                    self.push_char(ch, span);
                }
                'l' if self.brackets.is_empty() && starts_lambda(&chars, i) => {
                    self.lambda_params = true;
                    self.push_char(ch, span);
                }
                _ => self.push_char(ch, span),
            }
            i += 1;
        }

        if let Some(lit) = &mut self.string {
            if lit.triple || line.text.ends_with('\\') {
                lit.body.push('\n');
            } else {
                return Err(FormattingError::new(
                    FormattingErrorKind::UnterminatedString,
                    lit.span,
                ));
            }
        }

        Ok(())
    }

    fn finish(mut self) -> Result<ParameterList, FormattingError> {
        if let Some(lit) = &self.string {
            return Err(FormattingError::new(
                FormattingErrorKind::UnterminatedString,
                lit.span,
            ));
        }
        if let Some((open, span)) = self.brackets.first() {
            return Err(FormattingError::new(
                FormattingErrorKind::UnbalancedBracket { bracket: *open },
                *span,
            ));
        }
        self.finish_item();
        Ok(ParameterList { items: self.items })
    }

    /// Identifier characters directly before a quote: `r`, `f`, `rb`...
    fn string_prefix(&self) -> String {
        self.draft.as_ref().map_or_else(String::new, |draft| {
            let prefix: Vec<char> = draft
                .current
                .text
                .chars()
                .rev()
                .take_while(char::is_ascii_alphabetic)
                .collect();
            prefix.into_iter().rev().collect()
        })
    }

    fn ensure_draft(&mut self, span: Span) {
        if self.draft.is_none() {
            self.pending_space = false;
            self.draft = Some(Draft {
                lines: Vec::new(),
                current: ValueLine {
                    text: String::new(),
                    indent: ValueIndent::Nested(0),
                },
                span,
                comments: Vec::new(),
            });
        }
    }

    fn push_char(&mut self, ch: char, span: Span) {
        if ch.is_whitespace() {
            if let Some(draft) = &mut self.draft {
                let current = &mut draft.current.text;
                if !current.is_empty() && !self.pending_space {
                    current.push(ch);
                }
            }
            return;
        }

        self.ensure_draft(span);
        self.flush_pending_space();
        if let Some(draft) = &mut self.draft {
            draft.current.text.push(ch);
        }
    }

    fn flush_pending_space(&mut self) {
        if !self.pending_space {
            return;
        }
        self.pending_space = false;
        if let Some(draft) = &mut self.draft {
            let current = &mut draft.current.text;
            if !current.is_empty() && !current.ends_with(char::is_whitespace) {
                current.push(' ');
            }
        }
    }

    fn push_literal(&mut self, lit: &StringLiteral) {
        self.flush_pending_space();
        let text = requote(lit);
        let Some(draft) = &mut self.draft else {
            return;
        };

        let mut pieces = text.split('\n');
        if let Some(first) = pieces.next() {
            draft.current.text.push_str(first);
        }
        for piece in pieces {
            draft.new_line(ValueIndent::Verbatim);
            draft.current.text.push_str(piece);
        }
    }

    fn comment(&mut self, comment: String) {
        if let Some(draft) = &mut self.draft {
            if self.brackets.is_empty() {
                draft.comments.push(comment);
            } else {
                draft.current.text.push_str(&comment);
            }
            return;
        }

        if self.last_param_line == Some(self.line_number) {
            if let Some(ParameterItem::Parameter(param)) = self.items.last_mut() {
                if param.comment.is_none() {
                    param.comment = Some(comment);
                    return;
                }
            }
        }
        self.items.push(ParameterItem::Comment(comment));
    }

    fn finish_item(&mut self) {
        self.lambda_params = false;
        self.pending_space = false;
        let Some(draft) = self.draft.take() else {
            return;
        };

        let Draft {
            mut lines,
            current,
            span,
            comments,
        } = draft;
        lines.push(current);

        let mut comments = comments.into_iter();
        if let Some(param) = build_parameter(lines, span) {
            self.items.push(ParameterItem::Parameter(Parameter {
                comment: comments.next(),
                ..param
            }));
            self.last_param_line = Some(self.line_number);
        }
        self.items.extend(comments.map(ParameterItem::Comment));
    }
}

fn build_parameter(mut lines: Vec<ValueLine>, span: Span) -> Option<Parameter> {
    // trailing whitespace belongs to the value unless a string continues
    for i in 0..lines.len() {
        let next_verbatim = lines
            .get(i + 1)
            .is_some_and(|next| next.indent == ValueIndent::Verbatim);
        if !next_verbatim {
            let trimmed = lines[i].text.trim_end().len();
            lines[i].text.truncate(trimmed);
        }
    }

    let name = split_name(&mut lines[0].text);
    lines.retain(|line| line.indent == ValueIndent::Verbatim || !line.text.is_empty());
    if lines.is_empty() {
        return None;
    }

    Some(Parameter {
        name,
        value: lines,
        span,
        comment: None,
    })
}

/// Strip a leading `name =` from `text`, returning the name.
fn split_name(text: &mut String) -> Option<String> {
    let ident_end = text
        .char_indices()
        .find(|&(i, c)| !(c == '_' || c.is_alphanumeric()) || (i == 0 && c.is_numeric()))
        .map_or(text.len(), |(i, _)| i);
    if ident_end == 0 {
        return None;
    }

    let after = text[ident_end..].trim_start();
    if !after.starts_with('=') || after.starts_with("==") {
        return None;
    }

    let name = text[..ident_end].to_string();
    let value = after[1..].trim_start().to_string();
    *text = value;
    Some(name)
}

const fn closer_of(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn starts_lambda(chars: &[char], at: usize) -> bool {
    const WORD: [char; 6] = ['l', 'a', 'm', 'b', 'd', 'a'];
    let before_ok = at == 0 || !is_ident_char(chars[at - 1]);
    let after_ok = chars.get(at + WORD.len()).is_none_or(|&c| !is_ident_char(c));
    before_ok && after_ok && chars[at..].starts_with(&WORD)
}

fn contains_unescaped(body: &str, quote: char) -> bool {
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return true;
        }
    }
    false
}

/// Render a string literal, preferring double quotes.
fn requote(lit: &StringLiteral) -> String {
    let count = if lit.triple { 3 } else { 1 };
    let keep = lit.quote == '"'
        || contains_unescaped(&lit.body, '"')
        || (lit.raw && lit.body.contains('\''));

    if keep {
        let quotes = lit.quote.to_string().repeat(count);
        return format!("{quotes}{}{quotes}", lit.body);
    }

    let mut body = String::with_capacity(lit.body.len());
    let mut chars = lit.body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' && !lit.raw {
            match chars.next() {
                Some('\'') => body.push('\''),
                Some(next) => {
                    body.push(c);
                    body.push(next);
                }
                None => body.push(c),
            }
        } else {
            body.push(c);
        }
    }

    let quotes = "\"".repeat(count);
    format!("{quotes}{body}{quotes}")
}
