//! Utility types to support self adjusting splay trees with range aggregation

#![warn(missing_docs)]

extern crate alloc;
use alloc::vec::Vec;

use core::{
    cmp::Ordering,
    fmt::Display,
    ops::{Deref, DerefMut},
};

use crate::aggregate::Aggregator;

//-----------------------------------------------------------------------------------------------//

/// The index of the sentinel, standing for an empty subtree
pub const NIL: usize = !0;

// Which child of a leaf to follow
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// The two child slots of a leaf, or of the sentinel
#[derive(Clone, Copy)]
struct Links {
    left: usize,
    right: usize,
}

impl Links {
    const EMPTY: Links = Links {
        left: NIL,
        right: NIL,
    };

    #[inline]
    fn get(&self, side: Side) -> usize {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn set(&mut self, side: Side, x: usize) {
        match side {
            Side::Left => self.left = x,
            Side::Right => self.right = x,
        }
    }
}

// A leaf in a splay tree
#[derive(Clone)]
struct Leaf<K, S> {
    key: K,
    agg: S,
    size: usize,
    links: Links,
}

//-----------------------------------------------------------------------------------------------//

/// A splay tree of keys, each carrying an aggregate
///
/// Leaves are stored in a single array and address each other by index. The sentinel is the
/// reserved index [`NIL`]: it has no storage of its own apart from two child slots, which point
/// back at the sentinel while the tree is at rest and hold rotated-out leaves while a splay is in
/// progress.
///
/// Removed leaves are chained through their right link into a recycle list and reused by later
/// insertions, so no leaf ever moves. The key and aggregate of a removed leaf are dropped when its
/// slot is reused, or when the tree is cleared.
///
/// Keys are ordered by `less`, a strict "less than". Two keys are the same key when neither is
/// less than the other.
///
/// Every operation, including lookups, restructures the tree, so all of them take `&mut self`.
pub struct Tree<K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    leaf: Vec<Leaf<K, A::Agg>>,
    root: usize,
    recycle: usize,
    null: Links,
    less: F,
    aggregator: A,
    #[cfg(test)]
    rotations: usize,
}

impl<K, A, F> Tree<K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    /// Construct an empty tree
    pub fn new(less: F, aggregator: A) -> Tree<K, A, F> {
        Tree::with_capacity(0, less, aggregator)
    }

    /// Construct an empty tree, pre-allocating a given capacity
    pub fn with_capacity(capacity: usize, less: F, aggregator: A) -> Tree<K, A, F> {
        Tree {
            leaf: Vec::with_capacity(capacity),
            root: NIL,
            recycle: NIL,
            null: Links::EMPTY,
            less,
            aggregator,
            #[cfg(test)]
            rotations: 0,
        }
    }

    /// Get the number of keys in the tree
    #[inline]
    pub fn len(&self) -> usize {
        self.size(self.root)
    }

    /// Check if the tree holds no keys
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    /// Remove all keys from the tree
    pub fn clear(&mut self) {
        self.leaf.clear();
        self.root = NIL;
        self.recycle = NIL;
        self.null = Links::EMPTY;
    }

    /// Reserves capacity for at least `additional` more keys
    pub fn reserve(&mut self, additional: usize) {
        self.leaf.reserve(additional);
    }

    /// Get the aggregator
    #[inline]
    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    /// Get the aggregate of the whole tree, or `None` if it is empty
    pub fn total(&self) -> Option<&A::Agg> {
        if self.root == NIL {
            None
        } else {
            Some(&self.leaf[self.root].agg)
        }
    }

    /// Get a value by key.
    ///
    /// The key (or a neighbour, if it is absent) is splayed to the root.
    pub fn get(&mut self, key: &K) -> Option<&A::Value> {
        self.splay_at(key);
        if !self.matches(self.root, key) {
            return None;
        }

        Some(self.aggregator.value(&self.leaf[self.root].agg))
    }

    /// Check if a key is in the tree
    pub fn contains_key(&mut self, key: &K) -> bool {
        self.splay_at(key);
        self.matches(self.root, key)
    }

    /// Set a value by key.
    ///
    /// If the key is already present its aggregate is rebuilt from the new value and the key
    /// itself is kept. Either way the key ends up at the root.
    pub fn put(&mut self, key: K, value: A::Value) {
        self.splay_lower_bound(&key);

        let root = self.root;
        if root == NIL {
            self.root = self.graft(key, value, NIL, NIL);
        } else if self.is_less(&key, &self.leaf[root].key) {
            let left = self.leaf[root].links.left;
            self.leaf[root].links.left = NIL;
            self.pop_up(root);
            self.root = self.graft(key, value, left, root);
        } else if self.is_less(&self.leaf[root].key, &key) {
            self.root = self.graft(key, value, root, NIL);
        } else {
            self.leaf[root].agg = self.aggregator.from_value(value);
            self.pop_up(root);
        }
    }

    /// Remove a key.
    ///
    /// Returns `true` if the key was present. If the key does not exist, then this function has no
    /// effect other than restructuring the tree.
    pub fn remove(&mut self, key: &K) -> bool {
        self.splay_at(key);

        let x = self.root;
        if !self.matches(x, key) {
            return false;
        }

        let Links { left, right } = self.leaf[x].links;
        if right != NIL {
            // Join by successor: the minimum of the right subtree has no left child
            self.root = right;
            self.splay_nth(0);
            let root = self.root;
            self.leaf[root].links.left = left;
            self.pop_up(root);
        } else {
            self.root = left;
        }

        self.release(x);
        true
    }

    /// Get the key/value pair at a position in ascending key order
    ///
    /// Returns `None` if `n` is not less than [`len`](Tree::len).
    pub fn nth(&mut self, n: usize) -> Option<(&K, &A::Value)> {
        if n >= self.len() {
            return None;
        }

        self.splay_nth(n);
        let leaf = &self.leaf[self.root];
        Some((&leaf.key, self.aggregator.value(&leaf.agg)))
    }

    /// Get the first key in the tree
    pub fn first(&mut self) -> Option<(&K, &A::Value)> {
        self.nth(0)
    }

    /// Get the last key in the tree
    pub fn last(&mut self) -> Option<(&K, &A::Value)> {
        match self.len() {
            0 => None,
            n => self.nth(n - 1),
        }
    }

    /// Visit every key/value pair in ascending key order
    ///
    /// Each visit splays its key to the root, so a full pass costs O(n log n) at worst.
    pub fn each<G>(&mut self, mut visit: G)
    where
        G: FnMut(&K, &A::Value),
    {
        for n in 0..self.len() {
            self.splay_nth(n);
            let leaf = &self.leaf[self.root];
            visit(&leaf.key, self.aggregator.value(&leaf.agg));
        }
    }

    /// Get the combined aggregate of all keys `k` with `l <= k < r`
    ///
    /// Returns `None` if no key falls in the range. The aggregate returned is the one stored in
    /// the tree for the subtree that spans exactly the range, nothing is copied.
    pub fn range(&mut self, l: &K, r: &K) -> Option<&A::Agg> {
        let span = self.span(l, r)?;
        Some(&self.leaf[span.node].agg)
    }

    /// Get mutable access to the combined aggregate of all keys `k` with `l <= k < r`
    ///
    /// This is how range updates are made: record the update in the aggregate (typically as a
    /// pending state for [`Aggregator::push_down`] to hand on later). The tree above the range is
    /// recombined when the returned guard is dropped.
    pub fn range_mut(&mut self, l: &K, r: &K) -> Option<RangeMut<'_, K, A, F>> {
        let span = self.span(l, r)?;
        Some(RangeMut { tree: self, span })
    }

    // Check the structure of the tree, panicking if it is broken
    //
    // Walks the tree without splaying it. Keys must be strictly ascending, every subtree size
    // right, the sentinel at rest, and every stored leaf either reachable or recycled.
    #[cfg(test)]
    pub(crate) fn check(&self) {
        assert_eq!(self.null.left, NIL, "sentinel left slot in use");
        assert_eq!(self.null.right, NIL, "sentinel right slot in use");

        let mut prev = NIL;
        let mut count = 0;
        self.walk(|x| {
            let Links { left, right } = self.leaf[x].links;
            assert_eq!(
                self.leaf[x].size,
                1 + self.size(left) + self.size(right),
                "size of leaf {x}"
            );
            if prev != NIL {
                assert!(
                    self.is_less(&self.leaf[prev].key, &self.leaf[x].key),
                    "leaf {x} out of order"
                );
            }
            prev = x;
            count += 1;
        });

        let mut recycled = 0;
        let mut x = self.recycle;
        while x != NIL {
            assert_eq!(self.leaf[x].links.left, NIL, "recycled leaf {x} has a left link");
            recycled += 1;
            x = self.leaf[x].links.right;
        }

        assert_eq!(count + recycled, self.leaf.len(), "unreachable leaves");
        assert_eq!(count, self.len(), "root size");
    }

    //-------------------------------------------------------------------------------------------//

    #[inline]
    fn size(&self, x: usize) -> usize {
        if x == NIL {
            0
        } else {
            self.leaf[x].size
        }
    }

    #[inline]
    fn is_less(&self, a: &K, b: &K) -> bool {
        (self.less)(a, b)
    }

    // The direction to go from `x` to reach `key`, or `None` if `x` holds it
    fn toward(&self, key: &K, x: usize) -> Option<Side> {
        let here = &self.leaf[x].key;
        if self.is_less(here, key) {
            Some(Side::Right)
        } else if self.is_less(key, here) {
            Some(Side::Left)
        } else {
            None
        }
    }

    #[inline]
    fn matches(&self, x: usize, key: &K) -> bool {
        x != NIL && self.toward(key, x).is_none()
    }

    // Allocate a leaf above two existing subtrees, reusing a recycled one if there is any
    fn graft(&mut self, key: K, value: A::Value, left: usize, right: usize) -> usize {
        let leaf = Leaf {
            key,
            agg: self.aggregator.from_value(value),
            size: 1,
            links: Links { left, right },
        };

        let x = self.recycle;
        let x = if x != NIL {
            self.recycle = self.leaf[x].links.right;
            self.leaf[x] = leaf;
            x
        } else {
            self.leaf.push(leaf);
            self.leaf.len() - 1
        };

        self.pop_up(x);
        x
    }

    // Add a leaf that is no longer linked into the tree to the recycle list
    fn release(&mut self, x: usize) {
        self.leaf[x].links = Links {
            left: NIL,
            right: self.recycle,
        };
        self.recycle = x;
    }

    // Recompute the size and aggregate of a leaf from its children
    fn pop_up(&mut self, x: usize) {
        let Links { left, right } = self.leaf[x].links;
        let size = 1 + self.size(left) + self.size(right);
        let (leaf, left, right) = family(&mut self.leaf, x, left, right);
        leaf.size = size;
        self.aggregator
            .pop_up(&mut leaf.agg, left.map(|l| &l.agg), right.map(|r| &r.agg));
    }

    // Hand any pending update of a leaf on to its children
    fn push_down(&mut self, x: usize) {
        let Links { left, right } = self.leaf[x].links;
        let (leaf, left, right) = family(&mut self.leaf, x, left, right);
        self.aggregator.push_down(
            &mut leaf.agg,
            left.map(|l| &mut l.agg),
            right.map(|r| &mut r.agg),
        );
    }

    //-------------------------------------------------------------------------------------------//

    // Move one step towards `side`, parking the old root on the sentinel
    //
    // `cleanup` must run before the splay is finished.
    fn zig(&mut self, side: Side) {
        let root = self.root;
        self.push_down(root);

        let next = self.leaf[root].links.get(side);
        self.leaf[root].links.set(side, self.null.get(side));
        self.null.set(side, root);
        self.root = next;

        #[cfg(test)]
        {
            self.rotations += 1;
        }
    }

    // Move two steps towards `side`, rotating the old root under the middle leaf and parking the
    // middle leaf on the sentinel
    //
    // `cleanup` must run before the splay is finished.
    fn zigzig(&mut self, side: Side) {
        let root = self.root;
        self.push_down(root);
        let middle = self.leaf[root].links.get(side);
        self.push_down(middle);

        let next = self.leaf[middle].links.get(side);
        let inner = self.leaf[middle].links.get(side.flip());

        self.leaf[middle].links.set(side, self.null.get(side));
        self.null.set(side, middle);

        // The old root is settled from here on
        self.leaf[root].links.set(side, inner);
        self.pop_up(root);
        self.leaf[middle].links.set(side.flip(), root);

        self.root = next;

        #[cfg(test)]
        {
            self.rotations += 2;
        }
    }

    // Drain the leaves parked on one side of the sentinel back into the tree
    //
    // They come off in the reverse order to which they were parked, so the last one parked ends
    // up deepest, directly on the opposite side of the new root.
    fn cleanup(&mut self, side: Side) {
        let root = self.root;
        self.push_down(root);

        let mut child = self.leaf[root].links.get(side.flip());
        let mut head = self.null.get(side);
        while head != NIL {
            self.push_down(head);
            let next = self.leaf[head].links.get(side);
            self.leaf[head].links.set(side, child);
            self.pop_up(head);
            child = head;
            head = next;
        }

        self.null.set(side, NIL);
        self.leaf[root].links.set(side.flip(), child);
    }

    // Splay the tree, following `toward` from the root until it says stop or runs out of leaves
    //
    // `toward` is called once per leaf on the way down, in order, so it may keep state.
    fn splay<P>(&mut self, mut toward: P)
    where
        P: FnMut(&Self, usize) -> Option<Side>,
    {
        if self.root == NIL {
            return;
        }

        loop {
            let root = self.root;
            let Some(first) = toward(&*self, root) else {
                break;
            };

            let child = self.leaf[root].links.get(first);
            if child == NIL {
                break;
            }

            let second = toward(&*self, child);
            match second {
                Some(second) if self.leaf[child].links.get(second) != NIL => {
                    if second == first {
                        self.zigzig(first);
                    } else {
                        self.zig(first);
                        self.zig(second);
                    }
                }
                _ => {
                    self.zig(first);
                    break;
                }
            }
        }

        self.cleanup(Side::Left);
        self.cleanup(Side::Right);
        self.pop_up(self.root);
    }

    // Splay the `n`th leaf (counting from zero) to the root
    //
    // If `n` is out of range the last leaf is splayed instead.
    fn splay_nth(&mut self, n: usize) {
        let mut n = n;
        self.splay(|tree, x| {
            let pos = tree.size(tree.leaf[x].links.left);
            match n.cmp(&pos) {
                Ordering::Equal => None,
                Ordering::Less => Some(Side::Left),
                Ordering::Greater => {
                    n -= pos + 1;
                    Some(Side::Right)
                }
            }
        });
    }

    // Splay the first leaf not less than `key` to the root, or the last leaf if there is none
    fn splay_lower_bound(&mut self, key: &K) {
        self.splay(|tree, x| {
            if tree.is_less(&tree.leaf[x].key, key) {
                Some(Side::Right)
            } else {
                Some(Side::Left)
            }
        });

        // The walk may stop one short, on the greatest leaf less than `key`
        let root = self.root;
        if root != NIL && self.is_less(&self.leaf[root].key, key) {
            self.splay_nth(self.size(self.leaf[root].links.left) + 1);
        }
    }

    // Splay the leaf holding `key` to the root, or a neighbour of where it would be
    fn splay_at(&mut self, key: &K) {
        self.splay(|tree, x| tree.toward(key, x));
    }

    // Arrange the tree so that one subtree holds exactly the keys in `[l, r)`
    fn span(&mut self, l: &K, r: &K) -> Option<Span> {
        self.splay_lower_bound(l);
        let root = self.root;
        if root == NIL || !self.is_less(&self.leaf[root].key, r) {
            // The first key not less than `l` is not less than `r` either
            return None;
        }

        // The position of the greatest key less than `l`, saturating if there is none
        let rank = self.size(self.leaf[root].links.left).saturating_sub(1);

        self.splay_lower_bound(r);
        let root = self.root;
        if self.is_less(&self.leaf[root].key, l) {
            // Every key is less than `l`
            return None;
        }

        if self.leaf[root].links.left != NIL {
            // Park the upper boundary so it comes back as the right child of the lower one
            self.zig(Side::Left);
            self.splay_nth(rank);
        }

        let root = self.root;
        if self.is_less(&self.leaf[root].key, l) {
            let right = self.leaf[root].links.right;
            if self.is_less(&self.leaf[right].key, r) {
                // Every key to the right of the root is in range
                Some(Span {
                    node: right,
                    parents: [root, NIL],
                })
            } else {
                let inner = self.leaf[right].links.left;
                Some(Span {
                    node: inner,
                    parents: [right, root],
                })
            }
        } else {
            // The range starts at the first key
            self.splay_lower_bound(r);
            let root = self.root;
            if self.is_less(&self.leaf[root].key, r) {
                Some(Span {
                    node: root,
                    parents: [NIL, NIL],
                })
            } else {
                Some(Span {
                    node: self.leaf[root].links.left,
                    parents: [root, NIL],
                })
            }
        }
    }

    // Visit every leaf in key order without restructuring the tree
    fn walk<G>(&self, mut visit: G)
    where
        G: FnMut(usize),
    {
        let mut stack = Vec::new();
        let mut x = self.root;
        loop {
            while x != NIL {
                stack.push(x);
                x = self.leaf[x].links.left;
            }
            let Some(y) = stack.pop() else {
                return;
            };
            visit(y);
            x = self.leaf[y].links.right;
        }
    }

    #[cfg(test)]
    pub(crate) fn rotations(&self) -> usize {
        self.rotations
    }
}

impl<K, A, F> Clone for Tree<K, A, F>
where
    K: Clone,
    A: Aggregator + Clone,
    A::Agg: Clone,
    F: Fn(&K, &K) -> bool + Clone,
{
    fn clone(&self) -> Self {
        Tree {
            leaf: self.leaf.clone(),
            root: self.root,
            recycle: self.recycle,
            null: self.null,
            less: self.less.clone(),
            aggregator: self.aggregator.clone(),
            #[cfg(test)]
            rotations: self.rotations,
        }
    }
}

impl<K, A, F> Display for Tree<K, A, F>
where
    K: Display,
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[ ")?;
        let mut result = Ok(());
        self.walk(|x| {
            if result.is_ok() {
                result = write!(f, "{} ", self.leaf[x].key);
            }
        });
        result?;
        write!(f, "]")
    }
}

//-----------------------------------------------------------------------------------------------//

// A subtree covering exactly a key range, and the leaves above it (innermost first) that need
// recombining if it changes
#[derive(Clone, Copy)]
struct Span {
    node: usize,
    parents: [usize; 2],
}

/// Mutable access to the aggregate of a key range
///
/// Returned by [`Tree::range_mut`]. Dropping it recombines the leaves above the range, so changes
/// made through it are reflected in every enclosing aggregate.
pub struct RangeMut<'a, K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    tree: &'a mut Tree<K, A, F>,
    span: Span,
}

impl<K, A, F> Deref for RangeMut<'_, K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    type Target = A::Agg;

    fn deref(&self) -> &A::Agg {
        &self.tree.leaf[self.span.node].agg
    }
}

impl<K, A, F> DerefMut for RangeMut<'_, K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    fn deref_mut(&mut self) -> &mut A::Agg {
        &mut self.tree.leaf[self.span.node].agg
    }
}

impl<K, A, F> Drop for RangeMut<'_, K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    fn drop(&mut self) {
        for x in self.span.parents {
            if x != NIL {
                self.tree.pop_up(x);
            }
        }
    }
}

//-----------------------------------------------------------------------------------------------//

// IMPLEMENTATION NOTE
//
// Aggregator hooks need a leaf and both of its children at once, mutably. The links of a
// well-formed tree never alias, so the borrows are split by index.

// Mutably borrow a leaf and whichever of its children exist
fn family<T>(
    slice: &mut [T],
    x: usize,
    left: usize,
    right: usize,
) -> (&mut T, Option<&mut T>, Option<&mut T>) {
    match (left == NIL, right == NIL) {
        (true, true) => (&mut slice[x], None, None),
        (false, true) => {
            let (a, b) = pair(slice, x, left);
            (a, Some(b), None)
        }
        (true, false) => {
            let (a, c) = pair(slice, x, right);
            (a, None, Some(c))
        }
        (false, false) => {
            let (a, b, c) = triple(slice, x, left, right);
            (a, Some(b), Some(c))
        }
    }
}

// Mutably borrow two distinct elements
fn pair<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);

    if a < b {
        let (head, tail) = slice.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = slice.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

// Mutably borrow three distinct elements
fn triple<T>(slice: &mut [T], a: usize, b: usize, c: usize) -> (&mut T, &mut T, &mut T) {
    debug_assert!(a != b && b != c && a != c);

    let (head, tail) = slice.split_at_mut(a.max(b).max(c));
    let top = &mut tail[0];
    if a > b && a > c {
        let (y, z) = pair(head, b, c);
        (top, y, z)
    } else if b > c {
        let (x, z) = pair(head, a, c);
        (x, top, z)
    } else {
        let (x, y) = pair(head, a, b);
        (x, y, top)
    }
}

//-----------------------------------------------------------------------------------------------//

#[cfg(test)]
fn sum_tree() -> Tree<i64, crate::testing::Sum, fn(&i64, &i64) -> bool> {
    let less: fn(&i64, &i64) -> bool = |a, b| a < b;
    Tree::new(less, crate::testing::Sum)
}

#[test]
// Range sums over a small fixed tree
fn test_tree_0() {
    let mut tree = sum_tree();
    for key in [1, 3, 5, 7, 9] {
        tree.put(key, key * 10);
    }
    tree.check();

    assert_eq!(tree.range(&3, &8).map(|t| t.sum), Some(150));
    assert_eq!(tree.range(&10, &20).map(|t| t.sum), None);
    assert_eq!(tree.range(&0, &1).map(|t| t.sum), None);
    assert_eq!(tree.range(&1, &10).map(|t| t.sum), Some(250));
    assert_eq!(tree.range(&2, &3).map(|t| t.sum), None);
    assert_eq!(tree.range(&9, &10).map(|t| t.sum), Some(90));
    assert_eq!(tree.range(&1, &2).map(|t| t.sum), Some(10));
    assert_eq!(tree.range(&4, &9).map(|t| t.sum), Some(120));
    assert_eq!(tree.range(&8, &4).map(|t| t.sum), None);
    assert_eq!(tree.range(&5, &5).map(|t| t.sum), None);
    tree.check();
    assert_eq!(tree.len(), 5);
}

#[test]
// Operations on an empty tree
fn test_tree_1() {
    let mut tree = sum_tree();

    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert_eq!(tree.get(&1), None);
    assert!(!tree.contains_key(&1));
    assert!(!tree.remove(&1));
    assert!(tree.range(&0, &10).is_none());
    assert!(tree.range_mut(&0, &10).is_none());
    assert_eq!(tree.nth(0), None);
    assert_eq!(tree.first(), None);
    assert_eq!(tree.last(), None);
    assert!(tree.total().is_none());

    let mut visits = 0;
    tree.each(|_, _| visits += 1);
    assert_eq!(visits, 0);

    tree.check();
}

#[test]
// Overwriting a key keeps the size and recombines the root
fn test_tree_2() {
    let mut tree = sum_tree();
    tree.put(5, 50);
    tree.put(3, 30);
    tree.put(7, 70);
    tree.put(5, 500);

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.total().map(|t| t.sum), Some(600));
    assert_eq!(tree.get(&5), Some(&500));
    assert_eq!(tree.range(&0, &10).map(|t| t.sum), Some(600));
    tree.check();
}

#[test]
// Order statistics
fn test_tree_3() {
    let mut tree = sum_tree();
    for key in [40, 10, 30, 50, 20] {
        tree.put(key, key);
    }

    assert_eq!(tree.nth(0), Some((&10, &10)));
    assert_eq!(tree.nth(2), Some((&30, &30)));
    assert_eq!(tree.nth(4), Some((&50, &50)));
    assert_eq!(tree.nth(5), None);
    assert_eq!(tree.first(), Some((&10, &10)));
    assert_eq!(tree.last(), Some((&50, &50)));

    let mut keys = Vec::new();
    tree.each(|key, _| keys.push(*key));
    assert_eq!(keys, [10, 20, 30, 40, 50]);
    tree.check();
}

#[test]
// Removing an absent key changes nothing observable
fn test_tree_4() {
    let mut tree = sum_tree();
    for key in [2, 4, 6, 8] {
        tree.put(key, key);
    }

    assert!(!tree.remove(&5));
    assert!(!tree.remove(&0));
    assert!(!tree.remove(&9));
    assert_eq!(tree.len(), 4);

    let mut keys = Vec::new();
    tree.each(|key, _| keys.push(*key));
    assert_eq!(keys, [2, 4, 6, 8]);

    assert!(tree.remove(&4));
    assert!(!tree.remove(&4));
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.total().map(|t| t.sum), Some(16));
    tree.check();

    tree.clear();
    assert!(tree.is_empty());
    tree.check();
}

#[test]
// A stress test of putting and removing against a `BTreeMap`
fn test_tree_5() {
    use alloc::collections::BTreeMap;
    use rand::prelude::*;

    const COUNT: usize = 20000;

    let mut rng = SmallRng::seed_from_u64(1234567890);

    let mut tree = sum_tree();
    let mut model = BTreeMap::new();
    for n in 0..COUNT {
        let key = rng.random_range(0..2000i64);
        if rng.random_bool(0.6) {
            let value = rng.random_range(-1000..1000i64);
            tree.put(key, value);
            model.insert(key, value);
        } else {
            assert_eq!(tree.remove(&key), model.remove(&key).is_some());
        }

        assert_eq!(tree.len(), model.len());
        if n % 1000 == 0 {
            tree.check();
        }
    }
    tree.check();

    for (key, value) in &model {
        assert_eq!(tree.get(key), Some(value));
    }

    let mut pairs = Vec::new();
    tree.each(|key, value| pairs.push((*key, *value)));
    let expected: Vec<(i64, i64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(pairs, expected);
}

#[test]
// Random range sums against a brute force sum
fn test_tree_6() {
    use alloc::collections::BTreeMap;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(9876543210);

    let mut tree = sum_tree();
    let mut model = BTreeMap::new();
    for _ in 0..500 {
        let key = rng.random_range(0..1000i64);
        let value = rng.random_range(0..100i64);
        tree.put(key, value);
        model.insert(key, value);
    }

    for _ in 0..5000 {
        let l = rng.random_range(-10..1010i64);
        let r = rng.random_range(-10..1010i64);
        let expected = if l < r {
            let mut keys = model.range(l..r).peekable();
            keys.peek().is_some().then(|| keys.map(|(_, v)| *v).sum::<i64>())
        } else {
            None
        };
        assert_eq!(tree.range(&l, &r).map(|t| t.sum), expected, "range {l}..{r}");
    }
    tree.check();
}

#[test]
// Lazy range updates through `range_mut`
fn test_tree_7() {
    use crate::testing::AddSum;
    use alloc::collections::BTreeMap;
    use rand::prelude::*;

    let mut rng = SmallRng::seed_from_u64(5678901234);

    let mut tree = Tree::new(|a: &i64, b: &i64| a < b, AddSum);
    let mut model = BTreeMap::new();
    for _ in 0..300 {
        let key = rng.random_range(0..500i64);
        tree.put(key, key);
        model.insert(key, key);
    }

    for _ in 0..2000 {
        let l = rng.random_range(0..500i64);
        let r = rng.random_range(0..500i64);
        match rng.random_range(0..3) {
            0 => {
                let delta = rng.random_range(-50..50i64);
                let touched = model.range(l..r.max(l)).count() > 0;
                match tree.range_mut(&l, &r) {
                    Some(mut agg) => {
                        assert!(touched);
                        agg.add(delta);
                    }
                    None => assert!(!touched),
                }
                for (_, value) in model.range_mut(l..r.max(l)) {
                    *value += delta;
                }
            }
            1 => {
                let expected: i64 = model.range(l..r.max(l)).map(|(_, v)| *v).sum();
                let got = tree.range(&l, &r).map(|t| t.sum).unwrap_or(0);
                assert_eq!(got, expected, "range {l}..{r}");
            }
            _ => {
                let value = rng.random_range(0..500i64);
                tree.put(l, value);
                model.insert(l, value);
            }
        }

        let expected: i64 = model.values().sum();
        assert_eq!(tree.total().map(|t| t.sum).unwrap_or(0), expected);
    }

    for (key, value) in &model {
        assert_eq!(tree.get(key), Some(value));
    }
    tree.check();
}

#[test]
// A custom ordering: keys in descending order
fn test_tree_8() {
    let mut tree = Tree::new(|a: &i64, b: &i64| a > b, crate::testing::Sum);
    for key in 1..=5 {
        tree.put(key, key);
    }

    let mut keys = Vec::new();
    tree.each(|key, _| keys.push(*key));
    assert_eq!(keys, [5, 4, 3, 2, 1]);

    // In this ordering the range [4, 1) holds 4, 3 and 2
    assert_eq!(tree.range(&4, &1).map(|t| t.sum), Some(9));
    assert_eq!(tree.range(&1, &4).map(|t| t.sum), None);
    tree.check();
}

#[test]
// The total number of rotations is bounded by O(m log n)
fn test_tree_9() {
    use rand::prelude::*;

    const KEYS: i64 = 1024;
    const OPS: usize = 20000;

    let mut rng = SmallRng::seed_from_u64(1029384756);

    let mut tree = sum_tree();
    for key in 0..KEYS {
        tree.put(key, key);
    }

    let start = tree.rotations();
    let mut splays = 0;
    for _ in 0..OPS {
        let key = rng.random_range(0..KEYS);
        match rng.random_range(0..4) {
            0 => {
                tree.get(&key);
                splays += 1;
            }
            1 => {
                tree.range(&key, &(key + 100));
                splays += 8;
            }
            2 => {
                tree.remove(&key);
                tree.put(key, key);
                splays += 4;
            }
            _ => {
                tree.nth(key as usize);
                splays += 1;
            }
        }
    }

    // Each splay costs at most 3 log2(n) + O(1) amortised rotations, plus the initial potential
    let log = 11;
    let bound = splays * (3 * log + 4) + KEYS as usize * log;
    let used = tree.rotations() - start;
    assert!(used <= bound, "{used} rotations, bound {bound}");
    tree.check();
}

#[test]
// A sequential build and teardown, which produces the deepest trees
fn test_tree_10() {
    const COUNT: i64 = 10000;

    let mut tree = sum_tree();
    for key in 0..COUNT {
        tree.put(key, 1);
    }
    tree.check();
    assert_eq!(tree.range(&100, &200).map(|t| t.sum), Some(100));

    for key in 0..COUNT {
        assert!(tree.remove(&key));
    }
    assert!(tree.is_empty());
    tree.check();
}

#[test]
// The display lists keys in order
fn test_tree_11() {
    use alloc::string::ToString;

    let mut tree = sum_tree();
    for key in [3, 1, 2] {
        tree.put(key, key);
    }
    assert_eq!(tree.to_string(), "[ 1 2 3 ]");
}

#[test]
// Removing a key leaves its successor at the root, and its slot is reused
fn test_tree_12() {
    let mut tree = sum_tree();
    for key in 0..100 {
        tree.put(key, key);
    }
    let slots = tree.leaf.len();

    // Sequential puts leave 99 at the root with 98 as its left child. With no successor, the
    // left child takes over.
    assert!(tree.remove(&99));
    assert_eq!(tree.leaf[tree.root].key, 98);
    tree.check();

    tree.get(&10);
    assert!(tree.remove(&10));
    assert_eq!(tree.leaf[tree.root].key, 11);
    assert_eq!(tree.leaf.len(), slots);
    tree.check();

    tree.put(10, 10);
    tree.put(99, 99);
    assert_eq!(tree.leaf.len(), slots);
    assert_eq!(tree.len(), 100);
    assert_eq!(tree.total().map(|t| t.sum), Some(4950));
    tree.check();
}
