//! Parse tree interface and the concrete syntax tree

use crate::syntax::NodeKind;
use crate::utils::Position;

/// What the extractor needs from a parse tree node.
///
/// Optional children are looked up by kind and simply come back as `None`
/// (or an empty iterator) when absent.
pub trait ParseTree: Sized {
    /// The grammar production this node was built from
    fn kind(&self) -> NodeKind;

    /// Direct children, in source order
    fn children(&self) -> &[Self];

    /// Source text of the node: its tokens concatenated without whitespace
    fn text(&self) -> String;

    /// Start of the node (line 1-based, column 0-based)
    fn start(&self) -> Position;

    /// First direct child of the given kind
    fn child(&self, kind: NodeKind) -> Option<&Self> {
        self.children().iter().find(|c| c.kind() == kind)
    }

    /// All direct children of the given kind
    fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Self> {
        self.children().iter().filter(move |c| c.kind() == kind)
    }

    fn has_child(&self, kind: NodeKind) -> bool {
        self.child(kind).is_some()
    }
}

/// Concrete syntax tree node. Leaves hold token text; inner nodes hold
/// children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    start: Position,
    token: Option<String>,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Create an inner node
    pub fn node(kind: NodeKind, start: Position, children: Vec<SyntaxNode>) -> Self {
        Self { kind, start, token: None, children }
    }

    /// Create a leaf node
    pub fn token(kind: NodeKind, text: impl Into<String>, start: Position) -> Self {
        Self {
            kind,
            start,
            token: Some(text.into()),
            children: Vec::new(),
        }
    }

    /// Inner node starting where its first child starts
    pub fn wrap(kind: NodeKind, children: Vec<SyntaxNode>) -> Self {
        let start = children.first().map(|c| c.start).unwrap_or_default();
        Self::node(kind, start, children)
    }

    pub fn token_text(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::size).sum::<usize>()
    }

    /// Indented outline of the tree (for debugging)
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        match &self.token {
            Some(text) => out.push_str(&format!("{} {:?} @{}\n", self.kind, text, self.start)),
            None => out.push_str(&format!("{} @{}\n", self.kind, self.start)),
        }
        for child in &self.children {
            child.dump_into(out, depth + 1);
        }
    }

    fn collect_text(&self, out: &mut String) {
        match &self.token {
            Some(text) => out.push_str(text),
            None => self.children.iter().for_each(|c| c.collect_text(out)),
        }
    }
}

impl ParseTree for SyntaxNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn start(&self) -> Position {
        self.start
    }
}
