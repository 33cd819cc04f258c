use std::ptr::NonNull;

use crate::Node;

/// Boxes a fresh red node and leaks it into a raw link.
///
/// # Safety
///
/// It leaks; hand the pointer back to [`own_back`] exactly once.
pub(crate) unsafe fn leak_alloc_node<K>(key: K) -> NonNull<Node<K>> {
    NonNull::from(Box::leak(Box::new(Node::new(key))))
}

/// # Safety
///
/// `node` must come from [`leak_alloc_node`] and be unlinked from the tree.
pub(crate) unsafe fn own_back<K>(node: NonNull<Node<K>>) -> Box<Node<K>> {
    unsafe { Box::from_raw(node.as_ptr()) }
}
