use std::{
    borrow::Borrow,
    cmp::Ordering::*,
    fmt::{self, Debug},
};

use log::debug;

use crate::{Color, Error, Node, NodePtr, NodePtrExt, RBTree, Result, Side, alloc};

impl<K> Drop for RBTree<K> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K> Default for RBTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RBTree<K> {
    pub const fn new() -> Self {
        RBTree { root: None, len: 0 }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> Option<&Node<K>> {
        // SAFETY: the root is owned by the tree.
        self.root.map(|n| unsafe { n.as_ref() })
    }

    /// Drops every key. Parent back-references are cleared before the node
    /// they point to is freed.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            debug!("clearing {} nodes", self.len);
            // SAFETY: the root was just unlinked from the tree, which owned
            // the whole subtree.
            unsafe { Node::release(root) };
        }
        self.len = 0;
    }

    /// The smallest key.
    pub fn first(&self) -> Option<&K> {
        // SAFETY: `extreme` only returns live nodes of this tree.
        self.extreme(Side::Left).map(|n| unsafe { n.as_ref() }.key())
    }

    /// The largest key.
    pub fn last(&self) -> Option<&K> {
        // SAFETY: `extreme` only returns live nodes of this tree.
        self.extreme(Side::Right).map(|n| unsafe { n.as_ref() }.key())
    }

    pub fn pop_first(&mut self) -> Option<K> {
        let node = self.extreme(Side::Left)?;
        // SAFETY: the node was just found in this tree.
        Some(unsafe { self.erase(node) })
    }

    pub fn pop_last(&mut self) -> Option<K> {
        let node = self.extreme(Side::Right)?;
        // SAFETY: the node was just found in this tree.
        Some(unsafe { self.erase(node) })
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        fn height<K>(node: Option<&Node<K>>) -> usize {
            node.map_or(0, |n| 1 + height(n.left()).max(height(n.right())))
        }
        height(self.root())
    }

    /// All keys in ascending order.
    pub fn in_order(&self) -> Vec<K>
    where
        K: Clone,
    {
        fn walk<K: Clone>(node: Option<&Node<K>>, out: &mut Vec<K>) {
            if let Some(node) = node {
                walk(node.left(), out);
                out.push(node.key().clone());
                walk(node.right(), out);
            }
        }
        let mut out = Vec::with_capacity(self.len);
        walk(self.root(), &mut out);
        out
    }

    /// The outermost node on `side`, walked through the raw links so that
    /// callers may hand it to `erase`.
    fn extreme(&self, side: Side) -> NodePtr<K> {
        let mut node = self.root?;
        while let Some(next) = Some(node).child(side) {
            node = next;
        }
        Some(node)
    }
}

impl<K> RBTree<K> {
    /// Looks `key` up. The node handle borrows the tree.
    pub fn get<Q>(&self, key: &Q) -> Option<&Node<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: `find` only returns live nodes of this tree.
        self.find(key).map(|n| unsafe { n.as_ref() })
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Adds `key`. Returns `false`, keeping the stored key, when an equal key
    /// is already present.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        let mut parent: NodePtr<K> = None;
        let mut side = Side::Left;
        let mut link = self.root;
        while let Some(candidate) = link {
            // SAFETY: links from the root only reach live nodes.
            let candidate_ref = unsafe { candidate.as_ref() };
            side = match key.cmp(candidate_ref.key()) {
                Equal => return false,
                Less => Side::Left,
                Greater => Side::Right,
            };
            parent = link;
            link = candidate_ref.child_ptr(side);
        }

        // SAFETY: the node is linked into the tree right away and handed back
        // through `erase` or `release`.
        let mut node = Some(unsafe { alloc::leak_alloc_node(key) });
        self.len += 1;
        if parent.is_none() {
            node.set_color(Color::Black);
            self.root = node;
        } else {
            node.set_parent(parent);
            parent.set_child(side, node);
            self.insert_fixup(node);
        }
        true
    }

    /// Removes `key`. Returns `false` when it was not present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes `key` and returns the stored key.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find(key)?;
        // SAFETY: `find` returned a live node of this tree.
        Some(unsafe { self.erase(node) })
    }

    pub(crate) fn find<Q>(&self, key: &Q) -> NodePtr<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root;
        while let Some(candidate) = node {
            // SAFETY: links from the root only reach live nodes.
            let candidate = unsafe { candidate.as_ref() };
            node = match key.cmp(candidate.key().borrow()) {
                Equal => break,
                Greater => candidate.right,
                Less => candidate.left,
            };
        }
        node
    }
}

// Validation.
impl<K> RBTree<K>
where
    K: Ord + Debug,
{
    /// Checks every red-black and search-tree invariant, and that parent links
    /// mirror child links. Returns the black height of the root.
    pub fn validate(&self) -> Result<usize> {
        self.validate_inner().inspect_err(|err| debug!("invalid tree: {err}"))
    }

    fn validate_inner(&self) -> Result<usize> {
        if let Some(root) = self.root() {
            if root.is_red() {
                return Err(Error::RedRoot {
                    key: format!("{:?}", root.key()),
                });
            }
            if root.parent.is_some() {
                return Err(Error::BrokenLink {
                    key: format!("{:?}", root.key()),
                });
            }
        }

        let mut count = 0;
        let black_height = Self::validate_tree(self.root(), &mut count)?;
        if count != self.len {
            return Err(Error::Count {
                len: self.len,
                count,
            });
        }

        let mut keys = self.iter();
        if let Some(mut prev) = keys.next() {
            for key in keys {
                if prev >= key {
                    return Err(Error::Ordering {
                        key: format!("{prev:?}"),
                        child: format!("{key:?}"),
                    });
                }
                prev = key;
            }
        }
        Ok(black_height)
    }

    fn validate_tree(node: Option<&Node<K>>, count: &mut usize) -> Result<usize> {
        let Some(node) = node else {
            return Ok(0);
        };
        *count += 1;

        for side in [Side::Left, Side::Right] {
            let Some(child) = node.child(side) else {
                continue;
            };
            if child.parent != NodePtr::from(node) {
                return Err(Error::BrokenLink {
                    key: format!("{:?}", node.key()),
                });
            }
            if node.is_red() && child.is_red() {
                return Err(Error::RedViolation {
                    key: format!("{:?}", node.key()),
                    child: format!("{:?}", child.key()),
                });
            }
            let misplaced = match side {
                Side::Left => child.key() >= node.key(),
                Side::Right => child.key() <= node.key(),
            };
            if misplaced {
                return Err(Error::Ordering {
                    key: format!("{:?}", node.key()),
                    child: format!("{:?}", child.key()),
                });
            }
        }

        let left = Self::validate_tree(node.left(), count)?;
        let right = Self::validate_tree(node.right(), count)?;
        if left != right {
            return Err(Error::BlackHeight {
                key: format!("{:?}", node.key()),
                left,
                right,
            });
        }
        Ok(left + usize::from(node.is_black()))
    }
}

impl<K: Debug> Debug for RBTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq> PartialEq for RBTree<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq> Eq for RBTree<K> {}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;
    use rand::{SeedableRng, seq::SliceRandom};
    use rand_chacha::ChaCha8Rng;
    use simplelog::{Config, LevelFilter, TestLogger};

    use super::*;

    fn init_logger() {
        let _ = TestLogger::init(LevelFilter::Debug, Config::default());
    }

    fn seeded() -> ChaCha8Rng {
        let seed: u64 = rand::random();
        println!("seed {seed}");
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn height_bound(len: usize) -> f64 {
        2.0 * ((len + 1) as f64).log2()
    }

    #[test]
    fn tree_ctor_works() {
        let tree = RBTree::<usize>::new();
        assert_eq!(None, tree.first());
        assert_eq!(false, tree.has(&42));
        assert_eq!(true, tree.is_empty());
        assert_eq!(0, tree.height());
        assert_eq!(Ok(0), tree.validate());
    }

    #[test]
    fn first_insert_is_black_root() {
        let mut tree = RBTree::new();
        assert_eq!(true, tree.insert(42));
        let root = tree.root().unwrap();
        assert_eq!((42, Color::Black), (*root.key(), root.color()));
        assert_eq!(true, root.is_leaf());
        assert_eq!(1, tree.len());
    }

    #[test]
    fn contains_many() {
        let mut tree = RBTree::new();
        assert_eq!(true, tree.insert(42));
        assert_eq!(true, tree.insert(0));
        assert_eq!(true, tree.insert(100));
        assert_eq!(3, tree.len());

        assert_eq!(true, tree.has(&42));
        assert_eq!(true, tree.has(&0));
        assert_eq!(true, tree.has(&100));
        assert_eq!(false, tree.has(&1));
        assert_eq!(false, tree.has(&1000));
        assert_eq!(Some(&0), tree.first());
        assert_eq!(Some(&100), tree.last());
    }

    #[test]
    fn borrowed_lookup() {
        let mut tree = RBTree::new();
        tree.insert("forty two".to_string());
        assert_eq!(true, tree.has("forty two"));
        assert_eq!(Some("forty two"), tree.get("forty two").map(|n| n.key().as_str()));
        assert_eq!(true, tree.delete("forty two"));
        assert_eq!(true, tree.is_empty());
    }

    #[test]
    fn insert_same_key() {
        let mut tree = RBTree::new();
        assert_eq!(true, tree.insert(42));
        let before = tree.root;
        assert_eq!(false, tree.insert(42));
        assert_eq!(1, tree.len());
        assert_eq!(before, tree.root);
    }

    #[test]
    fn insert_one_to_seven() {
        let tree: RBTree<i32> = (1..=7).collect();
        assert_eq!(vec![1, 2, 3, 4, 5, 6, 7], tree.in_order());
        let root = tree.root().unwrap();
        assert_eq!((2, Color::Black), (*root.key(), root.color()));
        assert_eq!(Ok(2), tree.validate());
    }

    #[test]
    fn insert_one_to_eight() {
        let tree: RBTree<i32> = (1..=8).collect();
        assert_eq!(vec![1, 2, 3, 4, 5, 6, 7, 8], tree.in_order());
        let root = tree.root().unwrap();
        assert_eq!((4, Color::Black), (*root.key(), root.color()));
        tree.validate().unwrap();
    }

    #[test]
    fn delete_absent_is_noop() {
        let mut tree: RBTree<i32> = (0..10).collect();
        assert_eq!(false, tree.delete(&42));
        assert_eq!(None, tree.take(&-1));
        assert_eq!(10, tree.len());
        assert_eq!((0..10).collect::<Vec<_>>(), tree.in_order());

        let mut empty = RBTree::<i32>::new();
        assert_eq!(false, empty.delete(&0));
        assert_eq!(true, empty.is_empty());
    }

    #[test]
    fn delete_sole_node() {
        let mut tree = RBTree::new();
        tree.insert(1);
        assert_eq!(Some(1), tree.take(&1));
        assert_eq!(None, tree.root().map(|n| *n.key()));
        assert_eq!(0, tree.len());
        assert_eq!(true, tree.insert(1));
        tree.validate().unwrap();
    }

    #[test]
    fn delete_returns_stored_key() {
        let mut tree = RBTree::new();
        tree.insert("a".to_string());
        tree.insert("b".to_string());
        assert_eq!(Some("a".to_string()), tree.take("a"));
        assert_eq!(vec!["b".to_string()], tree.in_order());
    }

    #[test]
    fn pop_first_and_last() {
        let mut tree: RBTree<i32> = [42, 0, 100].into_iter().collect();
        assert_eq!(Some(0), tree.pop_first());
        assert_eq!(Some(100), tree.pop_last());
        assert_eq!(Some(42), tree.pop_first());
        assert_eq!(None, tree.pop_last());
        assert_eq!(0, tree.len());
    }

    #[test]
    fn drain_from_both_ends_stays_valid() {
        let mut tree: RBTree<u32> = (0..200).collect();
        let mut low = 0;
        let mut high = 199;
        while !tree.is_empty() {
            if (high - low) % 3 == 0 {
                assert_eq!(Some(high), tree.pop_last());
                high = high.wrapping_sub(1);
            } else {
                assert_eq!(Some(low), tree.pop_first());
                low += 1;
            }
            tree.validate().unwrap();
            assert_eq!(tree.first(), tree.iter().next());
            assert_eq!(tree.last(), tree.iter().next_back());
        }
        assert_eq!(None, tree.pop_first());
        assert_eq!(None, tree.pop_last());
    }

    #[test]
    fn clear_resets() {
        init_logger();
        let mut tree: RBTree<i32> = (0..1000).collect();
        tree.clear();
        assert_eq!(0, tree.len());
        assert_eq!(true, tree.is_empty());
        assert_eq!(None, tree.first());
        assert_eq!(Vec::<i32>::new(), tree.in_order());
        tree.clear();

        tree.extend(0..10);
        assert_eq!(10, tree.len());
        tree.validate().unwrap();
    }

    #[test]
    fn drop_releases_owned_keys() {
        use std::rc::Rc;

        let marker = Rc::new(());
        #[derive(Debug)]
        struct Tracked(u32, #[allow(dead_code)] Rc<()>);
        impl PartialEq for Tracked {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl Eq for Tracked {}
        impl PartialOrd for Tracked {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }
        impl Ord for Tracked {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.cmp(&other.0)
            }
        }

        let mut tree = RBTree::new();
        for k in 0..64 {
            tree.insert(Tracked(k, marker.clone()));
        }
        assert_eq!(65, Rc::strong_count(&marker));
        // The rejected duplicate is dropped right away.
        assert_eq!(false, tree.insert(Tracked(3, marker.clone())));
        assert_eq!(65, Rc::strong_count(&marker));
        for k in 0..32 {
            assert_eq!(true, tree.delete(&Tracked(k, marker.clone())));
        }
        assert_eq!(33, Rc::strong_count(&marker));
        drop(tree);
        assert_eq!(1, Rc::strong_count(&marker));
    }

    #[test]
    fn validate_catches_corruption() {
        let mut tree: RBTree<i32> = (1..=7).collect();
        let mut root = tree.root;
        root.set_color(Color::Red);
        assert_eq!(
            Err(Error::RedRoot {
                key: "2".to_string()
            }),
            tree.validate()
        );
        root.set_color(Color::Black);

        let mut one = tree.find(&1);
        one.set_color(Color::Red);
        assert_eq!(
            Err(Error::BlackHeight {
                key: "2".to_string(),
                left: 0,
                right: 1
            }),
            tree.validate()
        );
        one.set_color(Color::Black);

        let mut six = tree.find(&6);
        six.set_color(Color::Red);
        assert_eq!(
            Err(Error::RedViolation {
                key: "4".to_string(),
                child: "6".to_string()
            }),
            tree.validate()
        );
        six.set_color(Color::Black);

        let mut five = tree.find(&5);
        five.set_parent(tree.find(&7));
        assert_eq!(
            Err(Error::BrokenLink {
                key: "6".to_string()
            }),
            tree.validate()
        );
        five.set_parent(six);

        tree.len += 1;
        assert_eq!(Err(Error::Count { len: 8, count: 7 }), tree.validate());
        tree.len -= 1;
        assert_eq!(Ok(2), tree.validate());
    }

    #[test]
    fn random_permutation_build() {
        let mut rng = seeded();
        let n = 100_000;
        let mut keys: Vec<u32> = (0..n).collect();
        keys.shuffle(&mut rng);

        let mut tree = RBTree::new();
        for k in keys.iter() {
            assert_eq!(true, tree.insert(*k));
        }
        assert_eq!(n as usize, tree.len());
        assert_eq!((0..n).collect::<Vec<_>>(), tree.in_order());
        assert!((tree.height() as f64) <= height_bound(tree.len()));
        tree.validate().unwrap();

        keys.shuffle(&mut rng);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(Some(k), tree.get(k).map(|n| n.key()));
            assert_eq!(true, tree.delete(k));
            assert_eq!(false, tree.has(k), "{k} is still there");
            if i % 10_000 == 0 {
                tree.validate().unwrap();
            }
        }
        assert_eq!(true, tree.is_empty());
        assert_eq!(None, tree.root().map(|n| *n.key()));
    }

    #[test]
    fn insert_then_delete_in_second_order() {
        init_logger();
        let mut rng = seeded();
        let mut keys: Vec<u32> = (0..2_000).collect();
        keys.shuffle(&mut rng);
        let mut tree: RBTree<u32> = keys.iter().copied().collect();
        tree.validate().unwrap();

        keys.shuffle(&mut rng);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(true, tree.delete(k));
            assert_eq!(false, tree.has(k));
            assert_eq!(keys.len() - i - 1, tree.len());
            tree.validate().unwrap();
            assert!((tree.height() as f64) <= height_bound(tree.len()));
        }
        assert_eq!(true, tree.is_empty());
    }

    #[quickcheck]
    fn invariants_hold_against_btreeset(ops: Vec<(bool, u8)>) -> bool {
        let mut tree = RBTree::new();
        let mut model = BTreeSet::new();
        for (insert, key) in ops {
            let (got, want) = if insert {
                (tree.insert(key), model.insert(key))
            } else {
                (tree.delete(&key), model.remove(&key))
            };
            if got != want || tree.validate().is_err() || tree.len() != model.len() {
                return false;
            }
        }
        tree.in_order() == model.into_iter().collect::<Vec<_>>()
    }

    #[quickcheck]
    fn size_matches_distinct_keys(keys: Vec<i16>) -> bool {
        let tree: RBTree<i16> = keys.iter().copied().collect();
        let distinct: BTreeSet<i16> = keys.into_iter().collect();
        tree.len() == distinct.len() && tree.in_order().len() == tree.len()
    }

    #[quickcheck]
    fn insert_twice_is_idempotent(keys: Vec<i32>, extra: i32) -> bool {
        let mut once: RBTree<i32> = keys.iter().copied().collect();
        once.insert(extra);
        let mut twice: RBTree<i32> = keys.iter().copied().collect();
        twice.insert(extra);
        let second = twice.insert(extra);
        !second && once == twice && twice.validate().is_ok()
    }

    #[quickcheck]
    fn insert_then_delete_round_trips(keys: Vec<i32>, extra: i32) -> bool {
        let mut tree: RBTree<i32> = keys.iter().copied().collect();
        if tree.has(&extra) {
            return true;
        }
        let before = tree.in_order();
        tree.insert(extra);
        tree.delete(&extra);
        tree.in_order() == before && !tree.has(&extra) && tree.validate().is_ok()
    }

    #[quickcheck]
    fn height_is_logarithmic(keys: Vec<u32>) -> bool {
        let tree: RBTree<u32> = keys.into_iter().collect();
        tree.is_empty() || (tree.height() as f64) <= height_bound(tree.len())
    }
}
