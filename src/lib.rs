//! A red-black tree set with parent links.
//!
//! Every node keeps a non-owning pointer to its parent so that the insert and
//! delete fixups can walk upward in O(1) per step, without a path stack.
//! Absent children are plain `None` links, and every color query treats them
//! as black.
//!
//! ```
//! use rbset::{Color, RBTree};
//!
//! let mut tree = RBTree::new();
//! for k in 1..=8 {
//!     tree.insert(k);
//! }
//! assert_eq!(tree.in_order(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
//! assert_eq!(tree.root().map(|n| (*n.key(), n.color())), Some((4, Color::Black)));
//!
//! assert!(tree.delete(&4));
//! assert!(!tree.has(&4));
//! assert_eq!(tree.len(), 7);
//! ```
//!
//! Keys must be totally ordered: an `Ord` implementation that is not a total
//! order corrupts both the ordering and the balance of the tree.
mod alloc;
mod error;
mod iter;
mod node;
mod root;
mod tree;

use std::ptr::NonNull;

pub use error::{Error, Result};
pub use iter::{IntoIter, Iter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// A child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[inline(always)]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The slot a node occupies in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Root,
    Left,
    Right,
}

impl Direction {
    #[inline(always)]
    pub fn side(self) -> Option<Side> {
        match self {
            Direction::Root => None,
            Direction::Left => Some(Side::Left),
            Direction::Right => Some(Side::Right),
        }
    }
}

impl From<Side> for Direction {
    fn from(side: Side) -> Direction {
        match side {
            Side::Left => Direction::Left,
            Side::Right => Direction::Right,
        }
    }
}

pub(crate) type NodePtr<K> = Option<NonNull<Node<K>>>;

/// Link-level accessors. Every getter on an absent link returns `None`, every
/// setter on an absent link does nothing, and an absent link is black.
pub(crate) trait NodePtrExt {
    type Key;

    fn is_black(&self) -> bool;
    fn is_red(&self) -> bool;
    fn child(&self, side: Side) -> NodePtr<Self::Key>;
    fn color(&self) -> Color;
    fn direction(&self) -> Direction;
    fn left(&self) -> NodePtr<Self::Key>;
    fn parent(&self) -> NodePtr<Self::Key>;
    fn right(&self) -> NodePtr<Self::Key>;
    fn sibling(&self) -> NodePtr<Self::Key>;
    fn set_child(&mut self, side: Side, child: NodePtr<Self::Key>);
    fn set_color(&mut self, color: Color);
    fn set_parent(&mut self, parent: NodePtr<Self::Key>);
}

impl<K> NodePtrExt for NodePtr<K> {
    type Key = K;

    #[inline(always)]
    fn is_black(&self) -> bool {
        self.map_or(true, |v| unsafe { v.as_ref() }.is_black())
    }

    #[inline(always)]
    fn is_red(&self) -> bool {
        self.map_or(false, |v| unsafe { v.as_ref() }.is_red())
    }

    #[inline(always)]
    fn child(&self, side: Side) -> NodePtr<K> {
        self.and_then(|v| unsafe { v.as_ref() }.child_ptr(side))
    }

    #[inline(always)]
    fn color(&self) -> Color {
        self.map_or(Color::Black, |v| unsafe { v.as_ref() }.color)
    }

    #[inline(always)]
    fn direction(&self) -> Direction {
        self.map_or(Direction::Root, |v| unsafe { v.as_ref() }.direction())
    }

    #[inline(always)]
    fn left(&self) -> NodePtr<K> {
        self.child(Side::Left)
    }

    #[inline(always)]
    fn parent(&self) -> NodePtr<K> {
        self.and_then(|v| unsafe { v.as_ref() }.parent)
    }

    #[inline(always)]
    fn right(&self) -> NodePtr<K> {
        self.child(Side::Right)
    }

    #[inline(always)]
    fn sibling(&self) -> NodePtr<K> {
        match self.direction().side() {
            Some(side) => self.parent().child(side.opposite()),
            None => None,
        }
    }

    #[inline(always)]
    fn set_child(&mut self, side: Side, child: NodePtr<K>) {
        if let Some(node) = self {
            let node = unsafe { node.as_mut() };
            match side {
                Side::Left => node.left = child,
                Side::Right => node.right = child,
            }
        }
    }

    #[inline(always)]
    fn set_color(&mut self, color: Color) {
        if let Some(node) = self {
            unsafe { node.as_mut() }.color = color;
        }
    }

    #[inline(always)]
    fn set_parent(&mut self, parent: NodePtr<K>) {
        if let Some(node) = self {
            unsafe { node.as_mut() }.parent = parent;
        }
    }
}

impl<K> From<&Node<K>> for NodePtr<K> {
    fn from(node: &Node<K>) -> Self {
        NonNull::new(node as *const _ as *mut _)
    }
}

/// A tree vertex.
///
/// Handles to nodes are only ever given out as shared borrows of the tree, so
/// they cannot outlive the next mutation.
pub struct Node<K> {
    pub(crate) parent: NodePtr<K>,
    pub(crate) left: NodePtr<K>,
    pub(crate) right: NodePtr<K>,
    pub(crate) color: Color,
    key: K,
}

/// A red-black tree of unique keys.
pub struct RBTree<K> {
    pub(crate) root: NodePtr<K>,
    pub(crate) len: usize,
}

// SAFETY: the tree owns every node reachable from `root`; the raw links are
// never shared outside of borrows of the tree.
unsafe impl<K: Send> Send for RBTree<K> {}
// SAFETY: `&RBTree` only hands out `&K`.
unsafe impl<K: Sync> Sync for RBTree<K> {}
