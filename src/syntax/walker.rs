//! Depth-first tree walking with enter/exit callbacks

use crate::syntax::ParseTree;
use crate::utils::Result;

/// Callbacks invoked by [`walk`]. Both default to doing nothing.
pub trait Listener<T: ParseTree> {
    /// Called before any child of `node` is visited
    fn enter(&mut self, _node: &T) -> Result<()> {
        Ok(())
    }

    /// Called after every child of `node` has been visited
    fn exit(&mut self, _node: &T) -> Result<()> {
        Ok(())
    }
}

/// Walk `node` depth first, stopping at the first callback error
pub fn walk<T: ParseTree, L: Listener<T>>(listener: &mut L, node: &T) -> Result<()> {
    listener.enter(node)?;
    for child in node.children() {
        walk(listener, child)?;
    }
    listener.exit(node)
}
