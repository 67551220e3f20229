use std::ops::Range;

use crate::keyword::Keyword;
use crate::line::{DocumentStyle, Span};
use crate::params::ParameterList;

/// Index of a node in a `Snakefile` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Parsed workflow file: an arena of segments addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snakefile {
    pub style: DocumentStyle,
    pub nodes: Vec<Node>,
    /// Top-level segments in source order.
    pub roots: Vec<NodeId>,
}

/// One segment plus its place in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub parent: Option<NodeId>,
    /// Indices of the scanned lines this segment owns,
    /// leading blank lines included.
    pub lines: Range<usize>,
    /// Blank lines between the previous segment and this one.
    pub blank_lines_before: usize,
    pub segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    PlainCode(PlainCode),
    Keyword(KeywordBlock),
}

/// Contiguous run of embedded Python handed to the external formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainCode {
    /// Source text dedented to column zero, newline-terminated.
    pub code: String,
    /// 1-based line range in the original file.
    pub first_line: usize,
    pub last_line: usize,
    /// Output indentation level.
    pub depth: usize,
    /// Consists only of comments.
    pub comment_only: bool,
}

/// A `rule`/`checkpoint` block or a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordBlock {
    pub keyword: Keyword,
    pub name: Option<String>,
    /// Output indentation level of the header line.
    pub depth: usize,
    pub span: Span,
    /// Comment after the header colon (block keywords only).
    pub comment: Option<String>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Nested directives and comments, in order.
    Block(Vec<NodeId>),
    Parameters(ParameterList),
    /// Id of the `PlainCode` node holding the statements.
    Code(NodeId),
}

impl Snakefile {
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn segment(&self, id: NodeId) -> &Segment {
        &self.node(id).segment
    }

    /// Children of a block, or the code node of a code body.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.segment(id) {
            Segment::Keyword(KeywordBlock {
                body: Body::Block(children),
                ..
            }) => children.clone(),
            Segment::Keyword(KeywordBlock {
                body: Body::Code(code),
                ..
            }) => vec![*code],
            _ => Vec::new(),
        }
    }

    /// Output indentation level of a segment.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.node(id).depth()
    }

    /// Top-level segments whose keyword is `keyword`.
    pub fn blocks(&self, keyword: Keyword) -> impl Iterator<Item = &KeywordBlock> {
        self.roots
            .iter()
            .filter_map(move |id| match self.segment(*id) {
                Segment::Keyword(block) if block.keyword == keyword => Some(block),
                _ => None,
            })
    }

    /// Find a named top-level block, e.g. rule `all`.
    #[must_use]
    pub fn find(&self, keyword: Keyword, name: &str) -> Option<&KeywordBlock> {
        self.blocks(keyword)
            .find(|block| block.name.as_deref() == Some(name))
    }

    /// Directive `keyword` inside the block `block`.
    #[must_use]
    pub fn directive(&self, block: &KeywordBlock, keyword: Keyword) -> Option<&KeywordBlock> {
        let Body::Block(children) = &block.body else {
            return None;
        };
        children.iter().find_map(|id| match self.segment(*id) {
            Segment::Keyword(child) if child.keyword == keyword => Some(child),
            _ => None,
        })
    }
}

impl Node {
    #[must_use]
    pub const fn depth(&self) -> usize {
        match &self.segment {
            Segment::PlainCode(code) => code.depth,
            Segment::Keyword(block) => block.depth,
        }
    }
}

impl KeywordBlock {
    /// Parameters of a directive; `None` for blocks and code bodies.
    #[must_use]
    pub const fn parameters(&self) -> Option<&ParameterList> {
        match &self.body {
            Body::Parameters(params) => Some(params),
            _ => None,
        }
    }
}
