use std::{fmt::Debug, ptr::NonNull};

use crate::{Color, Direction, Side};

use super::{Node, NodePtr, NodePtrExt};

// Public API.
impl<K> Node<K> {
    /// A fresh node is red and unlinked.
    pub(crate) fn new(key: K) -> Self {
        Node {
            parent: None,
            left: None,
            right: None,
            color: Color::Red,
            key,
        }
    }

    #[inline(always)]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline(always)]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub fn is_black(&self) -> bool {
        self.color == Color::Black
    }

    #[inline(always)]
    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Which child slot of its parent this node occupies.
    #[inline(always)]
    pub fn direction(&self) -> Direction {
        match self.parent {
            None => Direction::Root,
            Some(parent) => {
                let me: NodePtr<K> = self.into();
                // SAFETY: a linked parent is a live node of the same tree.
                if unsafe { parent.as_ref() }.left == me {
                    Direction::Left
                } else {
                    Direction::Right
                }
            }
        }
    }

    #[inline(always)]
    pub fn parent(&self) -> Option<&Node<K>> {
        // SAFETY: links always point at live nodes owned by the same tree,
        // which outlives the borrow of `self`.
        self.parent.map(|p| unsafe { p.as_ref() })
    }

    #[inline(always)]
    pub fn left(&self) -> Option<&Node<K>> {
        self.child(Side::Left)
    }

    #[inline(always)]
    pub fn right(&self) -> Option<&Node<K>> {
        self.child(Side::Right)
    }

    #[inline(always)]
    pub fn child(&self, side: Side) -> Option<&Node<K>> {
        // SAFETY: see `parent`.
        self.child_ptr(side).map(|c| unsafe { c.as_ref() })
    }

    /// The other child of this node's parent. `None` for the root, or when the
    /// slot is empty.
    #[inline(always)]
    pub fn sibling(&self) -> Option<&Node<K>> {
        let side = self.direction().side()?;
        self.parent()?.child(side.opposite())
    }

    #[inline(always)]
    pub fn has_sibling(&self) -> bool {
        self.sibling().is_some()
    }

    #[inline(always)]
    pub fn grand_parent(&self) -> Option<&Node<K>> {
        self.parent()?.parent()
    }

    #[inline(always)]
    pub fn has_grand_parent(&self) -> bool {
        self.grand_parent().is_some()
    }

    /// The parent's sibling.
    #[inline(always)]
    pub fn uncle(&self) -> Option<&Node<K>> {
        self.parent()?.sibling()
    }

    #[inline(always)]
    pub fn has_uncle(&self) -> bool {
        self.uncle().is_some()
    }

    /// The in-order successor.
    #[inline(always)]
    pub fn next(&self) -> Option<&Node<K>> {
        self.step(Side::Right)
    }

    /// The in-order predecessor.
    #[inline(always)]
    pub fn prev(&self) -> Option<&Node<K>> {
        self.step(Side::Left)
    }
}

// Crate API.
impl<K> Node<K> {
    #[inline(always)]
    pub(crate) fn child_ptr(&self, side: Side) -> NodePtr<K> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline(always)]
    pub(crate) fn into_key(self) -> K {
        self.key
    }

    /// Walks one step in-order towards `side`.
    fn step(&self, side: Side) -> Option<&Node<K>> {
        // If we have a child on that side, go down once and then towards the
        // other side as far as we can.
        if let Some(child) = self.child(side) {
            let mut current = child;
            while let Some(next) = current.child(side.opposite()) {
                current = next;
            }
            return Some(current);
        }
        // Otherwise go up while we are the `side` child; the first ancestor we
        // reach from the other side is the answer.
        let mut current = self;
        while let Some(parent) = current.parent() {
            if current.direction() != Direction::from(side) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Frees the subtree rooted at `node`, clearing each parent back-reference
    /// before the node it points to goes away.
    ///
    /// # Safety
    ///
    /// `node` and its descendants must have been allocated by
    /// [`crate::alloc::leak_alloc_node`] and must not be reachable from
    /// anywhere else once this returns. The caller detaches `node` from its
    /// own parent.
    pub(crate) unsafe fn release(node: NonNull<Node<K>>) {
        let mut current: NodePtr<K> = Some(node);
        current.set_parent(None);
        while let Some(ptr) = current {
            // SAFETY: every node in the subtree is live until freed below.
            let node = unsafe { ptr.as_ref() };
            if node.left.is_some() {
                current = node.left;
                continue;
            }
            if node.right.is_some() {
                current = node.right;
                continue;
            }
            // A leaf: detach it from both directions, then drop it.
            let mut parent = node.parent;
            if let Some(side) = node.direction().side() {
                parent.set_child(side, None);
            }
            current.set_parent(None);
            // SAFETY: the leaf is no longer linked from anywhere.
            drop(unsafe { crate::alloc::own_back(ptr) });
            current = parent;
        }
    }
}

impl<K> Debug for Node<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}::({:?})", self.color(), self.key))
    }
}
