//! Invariant violations reported by [`crate::RBTree::validate`].

use thiserror::Error;

/// Result type for tree validation.
pub type Result<T> = std::result::Result<T, Error>;

/// A broken red-black or search-tree invariant.
///
/// Keys are rendered with `Debug` so the error does not borrow the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("root {key} is red")]
    RedRoot { key: String },

    #[error("red node {key} has a red child {child}")]
    RedViolation { key: String, child: String },

    /// The two subtrees of `key` have different black heights.
    #[error("unbalanced blacks under {key}: left {left}, right {right}")]
    BlackHeight {
        key: String,
        left: usize,
        right: usize,
    },

    #[error("out of order: {child} is on the wrong side of {key}")]
    Ordering { key: String, child: String },

    /// A child whose parent link does not point back at its parent.
    #[error("broken parent link under {key}")]
    BrokenLink { key: String },

    #[error("length is {len} but the tree holds {count} nodes")]
    Count { len: usize, count: usize },
}
