use std::ops::Range;

use crate::ast::{Body, KeywordBlock, Node, NodeId, PlainCode, Segment, Snakefile};
use crate::error::{FormattingError, FormattingErrorKind};
use crate::keyword::{BodyKind, Context};
use crate::line::{DocumentStyle, KeywordLine, Line, LineKind, Span};
use crate::params::{RawLine, parse_parameters};
use crate::scanner::ScannedSource;

/// Parse scanned lines into a `Snakefile`.
///
/// # Errors
///
/// Returns `FormattingError` for inconsistent nesting, keyword lines
/// without a body, unknown directives inside a block, or malformed
/// parameter lists.
pub fn parse(scanned: &ScannedSource) -> Result<Snakefile, FormattingError> {
    Parser::new(&scanned.lines, scanned.style).parse()
}

/// Lines collected for a segment that is not built yet.
struct Pending {
    /// First owned line, leading blanks included.
    start: usize,
    blank_lines_before: usize,
    lines: Vec<usize>,
}

struct Leaf {
    keyword: KeywordLine,
    header: usize,
    indent: usize,
    parent: Option<NodeId>,
    owned: Pending,
}

enum Frame {
    Block {
        node: NodeId,
        indent: usize,
        context: Context,
        child_indent: Option<usize>,
        comments: Option<Pending>,
    },
    Leaf(Leaf),
}

struct Parser<'a> {
    lines: &'a [Line],
    style: DocumentStyle,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    frames: Vec<Frame>,
    code: Option<Pending>,
    blanks: Vec<usize>,
    /// Comment lines, and the blanks after them, whose owner is decided
    /// by the next code line.
    held: Vec<Range<usize>>,
    consumed: usize,
}

impl<'a> Parser<'a> {
    const fn new(lines: &'a [Line], style: DocumentStyle) -> Self {
        Self {
            lines,
            style,
            nodes: Vec::new(),
            roots: Vec::new(),
            frames: Vec::new(),
            code: None,
            blanks: Vec::new(),
            held: Vec::new(),
            consumed: 0,
        }
    }

    fn parse(mut self) -> Result<Snakefile, FormattingError> {
        let mut pos = 0;
        while pos < self.lines.len() {
            let mut end = pos + 1;
            while end < self.lines.len() && self.lines[end].is_continuation() {
                end += 1;
            }
            self.dispatch(pos..end)?;
            pos = end;
        }

        self.release_held(0)?;
        while !self.frames.is_empty() {
            self.close_frame()?;
        }
        self.flush_code();
        self.finish_trailing_blanks();

        tracing::debug!(
            segments = self.nodes.len(),
            roots = self.roots.len(),
            "parsed segments"
        );

        Ok(Snakefile {
            style: self.style,
            nodes: self.nodes,
            roots: self.roots,
        })
    }

    fn dispatch(&mut self, group: Range<usize>) -> Result<(), FormattingError> {
        let lines = self.lines;
        let line = &lines[group.start];
        if line.is_blank() {
            if self.held.is_empty() {
                self.blanks.push(group.start);
            } else {
                self.held.push(group);
            }
            return Ok(());
        }
        let comment = line.kind == LineKind::Comment;
        if comment && (!self.held.is_empty() || self.closes_frame(line.indent)) {
            self.held.push(group);
            return Ok(());
        }

        self.release_held(line.indent)?;
        self.place(group, line.indent)
    }

    /// Place held comments. A comment closes no frame that the following
    /// line at `next_indent` keeps open.
    fn release_held(&mut self, next_indent: usize) -> Result<(), FormattingError> {
        let lines = self.lines;
        for group in std::mem::take(&mut self.held) {
            let line = &lines[group.start];
            if line.is_blank() {
                self.blanks.push(group.start);
            } else {
                self.place(group, line.indent.max(next_indent))?;
            }
        }
        Ok(())
    }

    fn closes_frame(&self, indent: usize) -> bool {
        match self.frames.last() {
            Some(Frame::Leaf(leaf)) => indent <= leaf.indent,
            Some(Frame::Block { indent: block, .. }) => indent <= *block,
            None => false,
        }
    }

    /// Hand a line group to the innermost frame that contains `indent`.
    fn place(&mut self, group: Range<usize>, indent: usize) -> Result<(), FormattingError> {
        loop {
            match self.frames.last_mut() {
                None => return self.top_level(group),
                Some(Frame::Leaf(leaf)) if indent > leaf.indent => {
                    leaf.owned.lines.append(&mut self.blanks);
                    leaf.owned.lines.extend(group.clone());
                    self.consumed = group.end;
                    return Ok(());
                }
                Some(Frame::Block { indent: block, .. }) if indent > *block => {
                    return self.block_line(group);
                }
                Some(_) => self.close_frame()?,
            }
        }
    }

    fn top_level(&mut self, group: Range<usize>) -> Result<(), FormattingError> {
        let lines = self.lines;
        let line = &lines[group.start];
        if let LineKind::Keyword(keyword) = &line.kind {
            // an indented directive belongs to the enclosing Python block
            let nested = line.indent > 0 && !keyword.keyword.is_block();
            if keyword.keyword.allowed_in(Context::TopLevel) && !nested {
                self.flush_code();
                return self.open(keyword.clone(), group, None);
            }
        }

        let blanks = std::mem::take(&mut self.blanks);
        let code = self.code.get_or_insert_with(|| Pending {
            start: blanks.first().copied().unwrap_or(group.start),
            blank_lines_before: blanks.len(),
            lines: Vec::new(),
        });
        if !code.lines.is_empty() {
            code.lines.extend(blanks);
        }
        code.lines.extend(group.clone());
        self.consumed = group.end;
        Ok(())
    }

    fn block_line(&mut self, group: Range<usize>) -> Result<(), FormattingError> {
        let lines = self.lines;
        let line = &lines[group.start];
        let Some(Frame::Block {
            node,
            context,
            child_indent,
            comments,
            ..
        }) = self.frames.last_mut()
        else {
            return Ok(());
        };
        let (node, context) = (*node, *context);

        match &line.kind {
            LineKind::Comment => {
                let blanks = std::mem::take(&mut self.blanks);
                let run = comments.get_or_insert_with(|| Pending {
                    start: blanks.first().copied().unwrap_or(group.start),
                    blank_lines_before: blanks.len(),
                    lines: Vec::new(),
                });
                run.lines.extend(group.clone());
                self.consumed = group.end;
                Ok(())
            }
            LineKind::Keyword(keyword) if keyword.keyword.allowed_in(context) => {
                match child_indent {
                    Some(expected) if *expected != line.indent => {
                        return Err(FormattingError::new(
                            FormattingErrorKind::Indentation {
                                reason: format!(
                                    "expected {expected} columns of indentation, found {}",
                                    line.indent
                                ),
                            },
                            Span::new(line.number, 1),
                        ));
                    }
                    Some(_) => {}
                    None => *child_indent = Some(line.indent),
                }
                if let Some(run) = comments.take() {
                    self.push_code(run, Some(node));
                }
                self.open(keyword.clone(), group, Some(node))
            }
            _ => Err(FormattingError::new(
                FormattingErrorKind::UnrecognizedKeywordSyntax {
                    text: line.content().trim_end().to_string(),
                    context: context.describe(),
                },
                line.span(),
            )),
        }
    }

    fn open(
        &mut self,
        keyword: KeywordLine,
        group: Range<usize>,
        parent: Option<NodeId>,
    ) -> Result<(), FormattingError> {
        let lines = self.lines;
        let blanks = std::mem::take(&mut self.blanks);
        let header = group.start;
        let owned = Pending {
            start: blanks.first().copied().unwrap_or(header),
            blank_lines_before: blanks.len(),
            lines: group.clone().skip(1).collect(),
        };
        self.consumed = group.end;
        let line = &lines[header];

        let BodyKind::Block(context) = keyword.keyword.body() else {
            self.frames.push(Frame::Leaf(Leaf {
                keyword,
                header,
                indent: line.indent,
                parent,
                owned,
            }));
            return Ok(());
        };

        let rest = keyword.rest.trim();
        if !rest.is_empty() && !rest.starts_with('#') {
            return Err(FormattingError::new(
                FormattingErrorKind::UnrecognizedKeywordSyntax {
                    text: rest.to_string(),
                    context: "block header",
                },
                Span::new(line.number, keyword.rest_column),
            ));
        }
        let id = self.push_node(
            parent,
            owned.start..group.end,
            owned.blank_lines_before,
            Segment::Keyword(KeywordBlock {
                keyword: keyword.keyword,
                name: keyword.name,
                depth: self.depth_under(parent, line),
                span: line.span(),
                comment: (!rest.is_empty()).then(|| rest.to_string()),
                body: Body::Block(Vec::new()),
            }),
        );
        self.frames.push(Frame::Block {
            node: id,
            indent: line.indent,
            context,
            child_indent: None,
            comments: None,
        });
        Ok(())
    }

    fn close_frame(&mut self) -> Result<(), FormattingError> {
        match self.frames.pop() {
            Some(Frame::Block { node, comments, .. }) => {
                if let Some(run) = comments {
                    self.push_code(run, Some(node));
                }
                let Segment::Keyword(block) = &self.nodes[node.0].segment else {
                    return Ok(());
                };
                let has_directive = matches!(
                    &block.body,
                    Body::Block(children) if children
                        .iter()
                        .any(|id| matches!(self.nodes[id.0].segment, Segment::Keyword(_)))
                );
                if !has_directive {
                    return Err(unterminated(block.keyword.as_str(), block.span));
                }
                self.nodes[node.0].lines.end = self.consumed;
                Ok(())
            }
            Some(Frame::Leaf(leaf)) => self.close_leaf(leaf),
            None => Ok(()),
        }
    }

    fn close_leaf(&mut self, leaf: Leaf) -> Result<(), FormattingError> {
        let lines = self.lines;
        let header = &lines[leaf.header];
        let depth = self.depth_under(leaf.parent, header);
        let range = leaf.owned.start..self.consumed;
        let keyword = leaf.keyword.keyword;

        if keyword.body() == BodyKind::Code {
            let rest = leaf.keyword.rest.trim();
            let (comment, inline) = if rest.starts_with('#') {
                (Some(rest.to_string()), None)
            } else {
                (None, (!rest.is_empty()).then_some((header.number, rest)))
            };
            if inline.is_none() && leaf.owned.lines.is_empty() {
                return Err(unterminated(keyword.as_str(), header.span()));
            }

            let id = NodeId(self.nodes.len());
            let code = self.build_code(&leaf.owned.lines, inline, depth + 1);
            self.push_node(
                leaf.parent,
                range.clone(),
                leaf.owned.blank_lines_before,
                Segment::Keyword(KeywordBlock {
                    keyword,
                    name: None,
                    depth,
                    span: header.span(),
                    comment,
                    body: Body::Code(NodeId(id.0 + 1)),
                }),
            );
            self.nodes.push(Node {
                parent: Some(id),
                lines: leaf.header + 1..range.end,
                blank_lines_before: 0,
                segment: Segment::PlainCode(code),
            });
            return Ok(());
        }

        let mut raw = vec![RawLine {
            number: header.number,
            column: leaf.keyword.rest_column,
            text: &leaf.keyword.rest,
        }];
        raw.extend(leaf.owned.lines.iter().map(|&i| RawLine {
            number: lines[i].number,
            column: 1,
            text: &lines[i].text,
        }));
        let params = parse_parameters(&raw)?;
        if params.is_empty() {
            return Err(unterminated(keyword.as_str(), header.span()));
        }

        self.push_node(
            leaf.parent,
            range,
            leaf.owned.blank_lines_before,
            Segment::Keyword(KeywordBlock {
                keyword,
                name: None,
                depth,
                span: header.span(),
                comment: None,
                body: Body::Parameters(params),
            }),
        );
        Ok(())
    }

    fn flush_code(&mut self) {
        if let Some(run) = self.code.take() {
            self.push_code(run, None);
        }
    }

    /// Build a `PlainCode` node from collected lines and attach it.
    fn push_code(&mut self, run: Pending, parent: Option<NodeId>) {
        let depth = match parent {
            Some(id) => self.nodes[id.0].depth() + 1,
            None => run
                .lines
                .iter()
                .map(|&i| &self.lines[i])
                .filter(|line| !line.is_blank() && !line.is_continuation())
                .map(|line| line.depth)
                .min()
                .unwrap_or(0),
        };
        let end = run.lines.last().map_or(run.start, |&last| last + 1);
        let code = self.build_code(&run.lines, None, depth);
        self.push_node(
            parent,
            run.start..end,
            run.blank_lines_before,
            Segment::PlainCode(code),
        );
    }

    fn build_code(&self, indices: &[usize], inline: Option<(usize, &str)>, depth: usize) -> PlainCode {
        let logical = || {
            indices
                .iter()
                .map(|&i| &self.lines[i])
                .filter(|line| !line.is_blank() && !line.is_continuation())
        };
        let base = logical().map(|line| line.indent).min().unwrap_or(0);
        let comment_only = inline.is_none() && logical().all(|line| line.kind == LineKind::Comment);

        let mut text: Vec<&str> = Vec::new();
        if let Some((_, code)) = inline {
            text.push(code);
        }
        for &i in indices {
            let line = &self.lines[i];
            if line.is_blank() {
                text.push("");
            } else if line.in_string() {
                text.push(&line.text);
            } else {
                let strip = base.min(line.indent);
                text.push(&line.text[strip..]);
            }
        }
        while text.last().is_some_and(|t| t.trim().is_empty()) {
            text.pop();
        }

        let first_line = inline.map_or_else(
            || indices.first().map_or(0, |&i| self.lines[i].number),
            |(number, _)| number,
        );
        let last_line = indices
            .iter()
            .rev()
            .map(|&i| &self.lines[i])
            .find(|line| !line.is_blank())
            .map_or(first_line, |line| line.number);

        let mut code = text.join("\n");
        if !code.is_empty() {
            code.push('\n');
        }

        PlainCode {
            code,
            first_line,
            last_line,
            depth,
            comment_only,
        }
    }

    fn push_node(
        &mut self,
        parent: Option<NodeId>,
        lines: Range<usize>,
        blank_lines_before: usize,
        segment: Segment,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            lines,
            blank_lines_before,
            segment,
        });

        match parent {
            Some(parent) => {
                if let Segment::Keyword(KeywordBlock {
                    body: Body::Block(children),
                    ..
                }) = &mut self.nodes[parent.0].segment
                {
                    children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        id
    }

    /// Output level of a keyword line: one below its parent, or its
    /// source level at the top.
    fn depth_under(&self, parent: Option<NodeId>, line: &Line) -> usize {
        parent.map_or(line.depth, |id| self.nodes[id.0].depth() + 1)
    }

    fn finish_trailing_blanks(&mut self) {
        if self.blanks.is_empty() {
            return;
        }
        let end = self.lines.len();
        if let Some(last) = self.roots.last() {
            self.nodes[last.0].lines.end = end;
            return;
        }

        let start = self.blanks[0];
        let count = self.blanks.len();
        self.push_node(
            None,
            start..end,
            count,
            Segment::PlainCode(PlainCode {
                code: String::new(),
                first_line: start + 1,
                last_line: end,
                depth: 0,
                comment_only: false,
            }),
        );
    }
}

fn unterminated(keyword: &str, span: Span) -> FormattingError {
    FormattingError::new(
        FormattingErrorKind::UnterminatedBlock {
            keyword: keyword.to_string(),
        },
        span,
    )
}
