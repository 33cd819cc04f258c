use std::iter::FusedIterator;

use crate::{Node, RBTree};

impl<K> RBTree<K> {
    /// Gets an iterator over the keys, in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbset::RBTree;
    ///
    /// let mut tree = RBTree::new();
    /// tree.insert(2);
    /// tree.insert(1);
    ///
    /// let keys: Vec<_> = tree.iter().copied().collect();
    /// assert_eq!(keys, [1, 2]);
    /// let keys: Vec<_> = tree.iter().rev().copied().collect();
    /// assert_eq!(keys, [2, 1]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K> {
        let first = self.root().map(|root| {
            let mut node = root;
            while let Some(left) = node.left() {
                node = left;
            }
            node
        });
        let last = self.root().map(|root| {
            let mut node = root;
            while let Some(right) = node.right() {
                node = right;
            }
            node
        });
        Iter {
            first,
            last,
            len: self.len,
        }
    }
}

/// A borrowing in-order iterator.
pub struct Iter<'a, K> {
    first: Option<&'a Node<K>>,
    last: Option<&'a Node<K>>,
    len: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        self.first.map(|n| {
            self.len -= 1;
            self.first = n.next();
            n.key()
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<&'a K> {
        self.next_back()
    }
}

impl<'a, K> DoubleEndedIterator for Iter<'a, K> {
    fn next_back(&mut self) -> Option<&'a K> {
        if self.len == 0 {
            return None;
        }
        self.last.map(|n| {
            self.len -= 1;
            self.last = n.prev();
            n.key()
        })
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<K> FusedIterator for Iter<'_, K> {}

impl<'a, K> IntoIterator for &'a RBTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

/// An owning in-order iterator; drains the tree from both ends.
pub struct IntoIter<K>(RBTree<K>);

impl<K> IntoIterator for RBTree<K> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter(self)
    }
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.0.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<K> {
        self.0.pop_last()
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {
    fn len(&self) -> usize {
        self.0.len
    }
}

impl<K> FusedIterator for IntoIter<K> {}

impl<K: Ord> FromIterator<K> for RBTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> RBTree<K> {
        let mut tree = RBTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord> Extend<K> for RBTree<K> {
    #[inline]
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        iter.into_iter().for_each(move |k| {
            self.insert(k);
        });
    }
}

impl<'a, K: Ord + Copy + 'a> Extend<&'a K> for RBTree<K> {
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}
