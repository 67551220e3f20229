//! Emitter that turns a parsed `Snakefile` back into canonical text.
//!
//! Keyword headers and parameter lists are rendered here; plain-code
//! segments go through a `PythonFormatter` and are re-indented to their
//! structural depth.

use crate::ast::{Body, KeywordBlock, NodeId, PlainCode, Segment, Snakefile};
use crate::error::{FormattingError, FormattingErrorKind};
use crate::line::{DocumentStyle, Span};
use crate::python::{PythonError, PythonFormatter};
use crate::scanner::string_continuations;

/// Most blank lines kept between two top-level segments.
const MAX_BLANK_LINES: usize = 2;

/// Blank lines around `rule`, `checkpoint`, `subworkflow` and `module`.
const BLOCK_BLANK_LINES: usize = 2;

/// Render `snakefile`, formatting embedded Python with `python`.
///
/// Returns an empty string for a file with nothing but blank lines;
/// otherwise the output ends with exactly one newline.
pub fn emit(
    snakefile: &Snakefile,
    python: &dyn PythonFormatter,
) -> Result<String, FormattingError> {
    let emitter = Emitter {
        file: snakefile,
        style: &snakefile.style,
        python,
    };

    let mut out = String::new();
    let mut previous: Option<(NodeId, bool)> = None;

    for &id in &snakefile.roots {
        let mut chunk = String::new();
        emitter.segment(&mut chunk, id)?;
        if chunk.is_empty() {
            continue;
        }

        if let Some((prev, after_comment)) = previous {
            let blanks = emitter.blank_lines(prev, id, after_comment);
            out.push_str(&"\n".repeat(blanks));
        }
        out.push_str(&chunk);
        previous = Some((id, ends_with_comment(&chunk)));
    }

    Ok(out)
}

struct Emitter<'a> {
    file: &'a Snakefile,
    style: &'a DocumentStyle,
    python: &'a dyn PythonFormatter,
}

impl Emitter<'_> {
    fn segment(&self, out: &mut String, id: NodeId) -> Result<(), FormattingError> {
        match self.file.segment(id) {
            Segment::PlainCode(code) => self.plain_code(out, code),
            Segment::Keyword(block) => self.keyword(out, id, block),
        }
    }

    fn keyword(
        &self,
        out: &mut String,
        id: NodeId,
        block: &KeywordBlock,
    ) -> Result<(), FormattingError> {
        out.push_str(&self.style.indent(block.depth));
        out.push_str(block.keyword.as_str());
        if let Some(name) = &block.name {
            out.push(' ');
            out.push_str(name);
        }
        out.push(':');

        match &block.body {
            Body::Parameters(params) => {
                let top_level = self.file.node(id).parent.is_none();
                match params.sole_value() {
                    Some(value) if top_level => {
                        out.push(' ');
                        out.push_str(value);
                        out.push('\n');
                    }
                    _ => {
                        out.push('\n');
                        out.push_str(&params.render(block.depth, self.style));
                    }
                }
            }
            Body::Block(children) => {
                push_header_end(out, block.comment.as_deref());
                for &child in children {
                    self.segment(out, child)?;
                }
            }
            Body::Code(code) => {
                push_header_end(out, block.comment.as_deref());
                self.segment(out, *code)?;
            }
        }
        Ok(())
    }

    fn plain_code(&self, out: &mut String, code: &PlainCode) -> Result<(), FormattingError> {
        if code.code.trim().is_empty() {
            return Ok(());
        }

        tracing::debug!(
            first_line = code.first_line,
            last_line = code.last_line,
            depth = code.depth,
            "formatting python segment"
        );

        let formatted = self
            .python
            .format(&code.code)
            .map_err(|e| python_error(e, code))?;
        reindent(out, &formatted, code.depth, self.style);
        Ok(())
    }

    /// Blank lines to emit between two consecutive top-level segments.
    fn blank_lines(&self, previous: NodeId, current: NodeId, after_comment: bool) -> usize {
        let source = self.file.node(current).blank_lines_before;
        if self.is_block(current) {
            if after_comment && source == 0 {
                return 0;
            }
            return BLOCK_BLANK_LINES;
        }
        if self.is_block(previous) {
            return BLOCK_BLANK_LINES;
        }
        source.min(MAX_BLANK_LINES)
    }

    fn is_block(&self, id: NodeId) -> bool {
        matches!(self.file.segment(id), Segment::Keyword(block) if block.keyword.is_block())
    }
}

fn push_header_end(out: &mut String, comment: Option<&str>) {
    if let Some(comment) = comment {
        out.push_str("  ");
        out.push_str(comment);
    }
    out.push('\n');
}

/// Indent each line of `code` by `depth` levels, leaving string contents
/// that span lines alone.
fn reindent(out: &mut String, code: &str, depth: usize, style: &DocumentStyle) {
    let code = code.trim_end_matches(['\n', '\r']);
    if code.trim().is_empty() {
        return;
    }

    let indent = style.indent(depth);
    for (line, edges) in code.split('\n').zip(string_continuations(code)) {
        let line = line.trim_end_matches('\r');
        if edges.starts_inside {
            out.push_str(line);
        } else if !line.trim().is_empty() {
            out.push_str(&indent);
            out.push_str(if edges.ends_inside { line } else { line.trim_end() });
        }
        out.push('\n');
    }
}

fn ends_with_comment(chunk: &str) -> bool {
    chunk
        .lines()
        .next_back()
        .is_some_and(|line| line.starts_with('#'))
}

fn python_error(error: PythonError, code: &PlainCode) -> FormattingError {
    match error {
        PythonError::Syntax {
            line,
            column,
            message,
        } => FormattingError::new(
            FormattingErrorKind::InvalidPython {
                message,
                first_line: code.first_line,
                last_line: code.last_line,
            },
            Span::new(code.first_line + line.saturating_sub(1), column),
        ),
        PythonError::Unavailable(message) => FormattingError::new(
            FormattingErrorKind::ExternalFormatter { message },
            Span::new(code.first_line, 1),
        ),
    }
}
