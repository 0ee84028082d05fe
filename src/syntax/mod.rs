//! Syntax tree: the interface the extractor walks, and a concrete tree

mod kind;
mod node;
mod walker;

pub use kind::NodeKind;
pub use node::{ParseTree, SyntaxNode};
pub use walker::{walk, Listener};
