use std::ptr::NonNull;

use log::trace;

use crate::{Color, Direction, Node, NodePtr, NodePtrExt, RBTree, Side, alloc};

// Rotations.
impl<K> RBTree<K> {
    /// Rotates around `node` towards `side`, promoting the child on the
    /// opposite side into `node`'s slot. Colors are left alone.
    ///
    /// ```text
    ///     rotate(n, Left)             rotate(p, Right)
    ///
    ///       n               p               p             n
    ///      / \             / \             / \           / \
    ///     a   p    -->    n   c           n   c  -->    a   p
    ///        / \         / \             / \               / \
    ///       b   c       a   b           a   b             b   c
    /// ```
    ///
    /// An absent `node`, or one without the child to promote, is a no-op.
    pub(crate) fn rotate(&mut self, mut node: NodePtr<K>, side: Side) {
        let mut pivot = node.child(side.opposite());
        if pivot.is_none() {
            return;
        }
        let parent = node.parent();
        let mut inner = pivot.child(side);

        node.set_child(side.opposite(), inner);
        inner.set_parent(node);
        pivot.set_child(side, node);
        self.change_child(node, pivot, parent);
        pivot.set_parent(parent);
        node.set_parent(pivot);
    }

    /// Promotes the right child of `node`.
    #[cfg(test)]
    pub(crate) fn rotate_left(&mut self, node: NodePtr<K>) {
        self.rotate(node, Side::Left);
    }

    /// Promotes the left child of `node`.
    #[cfg(test)]
    pub(crate) fn rotate_right(&mut self, node: NodePtr<K>) {
        self.rotate(node, Side::Right);
    }

    /// Points the link that held `old` (a slot of `parent`, or the root) at
    /// `new`. Does not touch `new`'s parent link.
    pub(crate) fn change_child(
        &mut self,
        old: NodePtr<K>,
        new: NodePtr<K>,
        mut parent: NodePtr<K>,
    ) {
        if parent.is_none() {
            self.root = new;
        } else if parent.left() == old {
            parent.set_child(Side::Left, new);
        } else {
            parent.set_child(Side::Right, new);
        }
    }
}

// Insertion.
impl<K> RBTree<K> {
    /// Restores the invariants after `node` was linked in as a red leaf.
    pub(crate) fn insert_fixup(&mut self, mut node: NodePtr<K>) {
        loop {
            /*
             * Loop invariant: node is red.
             */
            let mut parent = node.parent();
            if parent.is_none() {
                // The root is always black.
                trace!("insert fixup: recolor root");
                node.set_color(Color::Black);
                return;
            }

            if parent.is_black() {
                return;
            }

            let mut gparent = parent.parent();
            if gparent.is_none() {
                // A red root has no grandchildren to worry about.
                trace!("insert fixup: recolor red root parent");
                parent.set_color(Color::Black);
                return;
            }

            let mut uncle = parent.sibling();
            if uncle.is_red() {
                /*
                 * Red uncle - color flips.
                 *
                 *       G            g
                 *      / \          / \
                 *     p   u  -->   P   U
                 *    /            /
                 *   n            n
                 *
                 * g's parent might be red, so keep going at g.
                 */
                trace!("insert fixup: red uncle, recolor and climb");
                parent.set_color(Color::Black);
                uncle.set_color(Color::Black);
                gparent.set_color(Color::Red);
                node = gparent;
                continue;
            }

            let Some(side) = parent.direction().side() else {
                return;
            };

            if node.direction() != Direction::from(side) {
                /*
                 * Black uncle, zig-zag - straighten at parent.
                 *
                 *      G             G
                 *     / \           / \
                 *    p   U  -->    n   U
                 *     \           /
                 *      n         p
                 */
                trace!("insert fixup: black uncle, straighten at parent");
                self.rotate(parent, side);
                node = parent;
                parent = node.parent();
            }

            /*
             * Black uncle, straight line - rotate at gparent.
             *
             *        G           P
             *       / \         / \
             *      p   U  -->  n   g
             *     /                 \
             *    n                   U
             */
            trace!("insert fixup: black uncle, rotate at grandparent");
            self.rotate(gparent, side.opposite());
            parent.set_color(Color::Black);
            gparent.set_color(Color::Red);
            return;
        }
    }
}

// Deletion.
impl<K> RBTree<K> {
    /// Unlinks `victim` from the tree, rebalances, frees the node and hands
    /// its key back.
    ///
    /// # Safety
    ///
    /// `victim` must be a live node of this tree.
    pub(crate) unsafe fn erase(&mut self, victim: NonNull<Node<K>>) -> K {
        let mut node: NodePtr<K> = Some(victim);
        if self.len == 1 {
            self.root = None;
            self.len = 0;
            // SAFETY: the sole node is no longer reachable from the root.
            return unsafe { alloc::own_back(victim) }.into_key();
        }

        if node.left().is_some() && node.right().is_some() {
            self.swap_with_successor(node);
        }

        let mut child = node.left().or(node.right());
        if child.is_none() {
            // The fixup needs the leaf's position, so it runs first.
            if node.is_black() {
                self.delete_fixup(node);
            }
            let parent = node.parent();
            self.change_child(node, None, parent);
        } else {
            let parent = node.parent();
            self.change_child(node, child, parent);
            child.set_parent(parent);
            if node.is_black() {
                if child.is_red() {
                    child.set_color(Color::Black);
                } else {
                    self.delete_fixup(child);
                }
            }
        }
        node.set_parent(None);

        self.len -= 1;
        // SAFETY: nothing links to the victim anymore.
        unsafe { alloc::own_back(victim) }.into_key()
    }

    /// Exchanges the tree positions and colors of `node`, which has two
    /// children, and its in-order successor. Afterwards `node` has no left
    /// child, and the successor holds `node`'s former place.
    ///
    /// ```text
    ///  successor is the right child    successor is deeper
    ///
    ///    (n)          (s)                  (n)          (s)
    ///    / \          / \                  / \          / \
    ///  (x) (s)  ->  (x) (n)              (x) (y)  ->  (x) (y)
    ///        \            \                  /            /
    ///        (c)          (c)              (p)          (p)
    ///                                      /            /
    ///                                    (s)          (n)
    ///                                      \            \
    ///                                      (c)          (c)
    /// ```
    fn swap_with_successor(&mut self, mut node: NodePtr<K>) {
        let mut right = node.right();
        let mut successor = right;
        while successor.left().is_some() {
            successor = successor.left();
        }

        let parent = node.parent();
        let mut successor_parent = successor.parent();
        let mut left = node.left();
        let mut successor_right = successor.right();
        let (node_color, successor_color) = (node.color(), successor.color());

        self.change_child(node, successor, parent);
        successor.set_parent(parent);
        successor.set_child(Side::Left, left);
        left.set_parent(successor);

        if successor == right {
            successor.set_child(Side::Right, node);
            node.set_parent(successor);
        } else {
            successor_parent.set_child(Side::Left, node);
            node.set_parent(successor_parent);
            successor.set_child(Side::Right, right);
            right.set_parent(successor);
        }

        node.set_child(Side::Left, None);
        node.set_child(Side::Right, successor_right);
        successor_right.set_parent(node);

        node.set_color(successor_color);
        successor.set_color(node_color);
    }

    /// Restores the invariants when every path through `node` is one black
    /// short of the paths through its sibling.
    pub(crate) fn delete_fixup(&mut self, mut node: NodePtr<K>) {
        loop {
            let Some(side) = node.direction().side() else {
                trace!("delete fixup: reached root");
                node.set_color(Color::Black);
                return;
            };
            let mut parent = node.parent();
            let mut sibling = node.sibling();

            if sibling.is_red() {
                /*
                 * Red sibling - rotate at parent towards node.
                 *
                 *     P               S
                 *    / \             / \
                 *   N   s    -->    p   Sd
                 *      / \         / \
                 *     Sc  Sd      N   Sc
                 */
                trace!("delete fixup: red sibling, rotate at parent");
                parent.set_color(Color::Red);
                sibling.set_color(Color::Black);
                self.rotate(parent, side);
                sibling = node.sibling();
            }

            let mut close = sibling.child(side);
            let mut distant = sibling.child(side.opposite());

            if close.is_black() && distant.is_black() {
                /*
                 * Black nephews - sibling color flip.
                 *
                 *    (p)           (p)
                 *    / \           / \
                 *   N   S    -->  N   s
                 *      / \           / \
                 *     Sc  Sd        Sc  Sd
                 *
                 * A red parent absorbs the missing black, otherwise the
                 * deficit moves up to the parent.
                 */
                sibling.set_color(Color::Red);
                if parent.is_red() {
                    trace!("delete fixup: black nephews, red parent absorbs");
                    parent.set_color(Color::Black);
                    return;
                }
                trace!("delete fixup: black nephews, climb");
                node = parent;
                continue;
            }

            if distant.is_black() {
                /*
                 * Red close nephew - rotate at sibling away from node.
                 *
                 *   (p)           (p)
                 *   / \           / \
                 *  N   S    -->  N   Sc
                 *     / \             \
                 *    sc  Sd            s
                 *                       \
                 *                        Sd
                 */
                trace!("delete fixup: red close nephew, rotate at sibling");
                close.set_color(Color::Black);
                sibling.set_color(Color::Red);
                self.rotate(sibling, side.opposite());
                sibling = node.sibling();
                distant = sibling.child(side.opposite());
            }

            /*
             * Red distant nephew - rotate at parent towards node.
             *
             *      (p)             (s)
             *      / \             / \
             *     N   S     -->   P   Sd
             *        / \         / \
             *      (sc) sd      N  (sc)
             */
            trace!("delete fixup: red distant nephew, rotate at parent");
            sibling.set_color(parent.color());
            parent.set_color(Color::Black);
            distant.set_color(Color::Black);
            self.rotate(parent, side);
            self.root.set_color(Color::Black);
            return;
        }
    }
}
