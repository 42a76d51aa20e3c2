//! Implementation of maps with range aggregation, backed by a splay tree
#![warn(missing_docs)]

extern crate alloc;

use compact_str::CompactString;

use crate::{
    aggregate::Aggregator,
    util::{RangeMut, Tree},
};

// Ordering of keys that implement `Ord`
type Less<K> = fn(&K, &K) -> bool;

//-----------------------------------------------------------------------------------------------//

/// A map between keys and values with range aggregation, implemented using a splay tree.
pub struct Map<K, A>
where
    K: Ord,
    A: Aggregator,
{
    tree: Tree<K, A, Less<K>>,
}

impl<K, A> Map<K, A>
where
    K: Ord,
    A: Aggregator,
{
    /// Constructor
    pub fn new(aggregator: A) -> Map<K, A> {
        Map::with_capacity(0, aggregator)
    }

    /// Constructor
    pub fn with_capacity(capacity: usize, aggregator: A) -> Map<K, A> {
        let less: Less<K> = |a, b| a < b;
        Map {
            tree: Tree::with_capacity(capacity, less, aggregator),
        }
    }

    /// Get the number of key/value pairs in the `Map`
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if there are any key/value pairs in the `Map`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Remove all key/value pairs from the `Map`
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Reserves capacity for at least `additional` more key/value pairs
    pub fn reserve(&mut self, additional: usize) {
        self.tree.reserve(additional);
    }

    /// Get the aggregator
    pub fn aggregator(&self) -> &A {
        self.tree.aggregator()
    }

    /// Get a value by key.
    ///
    /// If the key is not in the map then `None` is returned.
    pub fn get(&mut self, key: &K) -> Option<&A::Value> {
        self.tree.get(key)
    }

    /// Check if a key is in the `Map`
    pub fn contains_key(&mut self, key: &K) -> bool {
        self.tree.contains_key(key)
    }

    /// Set a value by key.
    ///
    /// `put` reconfigures the tree for future lookups by promoting the key to the top of the tree.
    pub fn put(&mut self, key: K, value: A::Value) {
        self.tree.put(key, value);
    }

    /// Remove a value by key.
    ///
    /// Returns `true` if the key was present. If the key does not exist, then this function has no
    /// effect.
    pub fn remove(&mut self, key: &K) -> bool {
        self.tree.remove(key)
    }

    /// Get the key/value pair at a position in ascending key order
    pub fn nth(&mut self, n: usize) -> Option<(&K, &A::Value)> {
        self.tree.nth(n)
    }

    /// Get the first key in the map
    pub fn first(&mut self) -> Option<(&K, &A::Value)> {
        self.tree.first()
    }

    /// Get the last key in the map
    pub fn last(&mut self) -> Option<(&K, &A::Value)> {
        self.tree.last()
    }

    /// Visit the key/value pairs in the `Map` in ascending key order
    pub fn each<G>(&mut self, visit: G)
    where
        G: FnMut(&K, &A::Value),
    {
        self.tree.each(visit);
    }

    /// Get the aggregate of every key in `[l, r)`, or `None` if there are none
    pub fn range(&mut self, l: &K, r: &K) -> Option<&A::Agg> {
        self.tree.range(l, r)
    }

    /// Get mutable access to the aggregate of every key in `[l, r)`, or `None` if there are none
    pub fn range_mut(&mut self, l: &K, r: &K) -> Option<RangeMut<'_, K, A, Less<K>>> {
        self.tree.range_mut(l, r)
    }

    /// Get the aggregate of the whole map
    pub fn total(&self) -> Option<&A::Agg> {
        self.tree.total()
    }
}

impl<K, A> Clone for Map<K, A>
where
    K: Ord + Clone,
    A: Aggregator + Clone,
    A::Agg: Clone,
{
    fn clone(&self) -> Self {
        Map {
            tree: self.tree.clone(),
        }
    }
}

impl<K, A> Default for Map<K, A>
where
    K: Ord,
    A: Aggregator + Default,
{
    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<K, A> FromIterator<(K, A::Value)> for Map<K, A>
where
    K: Ord,
    A: Aggregator + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, A::Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0, A::default());
        map.extend(iter);
        map
    }
}

impl<K, A> Extend<(K, A::Value)> for Map<K, A>
where
    K: Ord,
    A: Aggregator,
{
    fn extend<I: IntoIterator<Item = (K, A::Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

//-----------------------------------------------------------------------------------------------//

/// A map between strings and values with range aggregation, implemented using a splay tree.
///
/// This is specialised version of `Map` that stores keys as a string.
pub struct StringMap<A>
where
    A: Aggregator,
{
    tree: Tree<CompactString, A, Less<CompactString>>,
}

impl<A> StringMap<A>
where
    A: Aggregator,
{
    /// Constructor
    pub fn new(aggregator: A) -> StringMap<A> {
        StringMap::with_capacity(0, aggregator)
    }

    /// Constructor
    pub fn with_capacity(capacity: usize, aggregator: A) -> StringMap<A> {
        let less: Less<CompactString> = |a, b| a < b;
        StringMap {
            tree: Tree::with_capacity(capacity, less, aggregator),
        }
    }

    /// Get the number of string/value pairs in the `StringMap`
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if there are any string/value pairs in the `StringMap`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Remove all string/value pairs from the `StringMap`
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Reserves capacity for at least `additional` more string/value pairs
    pub fn reserve(&mut self, additional: usize) {
        self.tree.reserve(additional);
    }

    /// Get the aggregator
    pub fn aggregator(&self) -> &A {
        self.tree.aggregator()
    }

    /// Get a value by string.
    ///
    /// If the string is not in the map then `None` is returned.
    pub fn get(&mut self, key: &str) -> Option<&A::Value> {
        self.tree.get(&CompactString::new(key))
    }

    /// Check if a string is in the `StringMap`
    pub fn contains_key(&mut self, key: &str) -> bool {
        self.tree.contains_key(&CompactString::new(key))
    }

    /// Set a value by string.
    pub fn put(&mut self, key: &str, value: A::Value) {
        self.tree.put(CompactString::new(key), value);
    }

    /// Remove a value by string.
    ///
    /// Returns `true` if the string was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.tree.remove(&CompactString::new(key))
    }

    /// Get the string/value pair at a position in ascending order
    pub fn nth(&mut self, n: usize) -> Option<(&str, &A::Value)> {
        self.tree.nth(n).map(|(key, value)| (key.as_str(), value))
    }

    /// Get the first string in the map
    pub fn first(&mut self) -> Option<(&str, &A::Value)> {
        self.tree.first().map(|(key, value)| (key.as_str(), value))
    }

    /// Get the last string in the map
    pub fn last(&mut self) -> Option<(&str, &A::Value)> {
        self.tree.last().map(|(key, value)| (key.as_str(), value))
    }

    /// Visit the string/value pairs in the `StringMap` in ascending order
    pub fn each<G>(&mut self, mut visit: G)
    where
        G: FnMut(&str, &A::Value),
    {
        self.tree.each(|key, value| visit(key.as_str(), value));
    }

    /// Get the aggregate of every string in `[l, r)`, or `None` if there are none
    pub fn range(&mut self, l: &str, r: &str) -> Option<&A::Agg> {
        self.tree
            .range(&CompactString::new(l), &CompactString::new(r))
    }

    /// Get mutable access to the aggregate of every string in `[l, r)`, or `None` if there are
    /// none
    pub fn range_mut(
        &mut self,
        l: &str,
        r: &str,
    ) -> Option<RangeMut<'_, CompactString, A, Less<CompactString>>> {
        self.tree
            .range_mut(&CompactString::new(l), &CompactString::new(r))
    }

    /// Get the aggregate of the whole map
    pub fn total(&self) -> Option<&A::Agg> {
        self.tree.total()
    }
}

impl<A> Clone for StringMap<A>
where
    A: Aggregator + Clone,
    A::Agg: Clone,
{
    fn clone(&self) -> Self {
        StringMap {
            tree: self.tree.clone(),
        }
    }
}

impl<A> Default for StringMap<A>
where
    A: Aggregator + Default,
{
    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<'a, A> FromIterator<(&'a str, A::Value)> for StringMap<A>
where
    A: Aggregator + Default,
{
    fn from_iter<I: IntoIterator<Item = (&'a str, A::Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0, A::default());
        map.extend(iter);
        map
    }
}

impl<'a, A> Extend<(&'a str, A::Value)> for StringMap<A>
where
    A: Aggregator,
{
    fn extend<I: IntoIterator<Item = (&'a str, A::Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

//-----------------------------------------------------------------------------------------------//

/// A map between keys and values with range aggregation, implemented using a splay tree.
///
/// Keys are sorted by a user supplied "less than" function rather than by `Ord`. The function must
/// be a strict weak order: irreflexive, transitive and consistent between calls.
pub struct MapBy<K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    tree: Tree<K, A, F>,
}

impl<K, A, F> MapBy<K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    /// Constructor
    pub fn new(less: F, aggregator: A) -> MapBy<K, A, F> {
        MapBy {
            tree: Tree::new(less, aggregator),
        }
    }

    /// Constructor
    pub fn with_capacity(capacity: usize, less: F, aggregator: A) -> MapBy<K, A, F> {
        MapBy {
            tree: Tree::with_capacity(capacity, less, aggregator),
        }
    }

    /// Get the number of key/value pairs in the `MapBy`
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if there are any key/value pairs in the `MapBy`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Remove all key/value pairs from the `MapBy`
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Reserves capacity for at least `additional` more key/value pairs
    pub fn reserve(&mut self, additional: usize) {
        self.tree.reserve(additional);
    }

    /// Get the aggregator
    pub fn aggregator(&self) -> &A {
        self.tree.aggregator()
    }

    /// Get a value by key.
    ///
    /// If the key is not in the map then `None` is returned.
    pub fn get(&mut self, key: &K) -> Option<&A::Value> {
        self.tree.get(key)
    }

    /// Check if a key is in the `MapBy`
    pub fn contains_key(&mut self, key: &K) -> bool {
        self.tree.contains_key(key)
    }

    /// Set a value by key.
    pub fn put(&mut self, key: K, value: A::Value) {
        self.tree.put(key, value);
    }

    /// Remove a value by key.
    ///
    /// Returns `true` if the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.tree.remove(key)
    }

    /// Get the key/value pair at a position in key order
    pub fn nth(&mut self, n: usize) -> Option<(&K, &A::Value)> {
        self.tree.nth(n)
    }

    /// Get the first key in the map
    pub fn first(&mut self) -> Option<(&K, &A::Value)> {
        self.tree.first()
    }

    /// Get the last key in the map
    pub fn last(&mut self) -> Option<(&K, &A::Value)> {
        self.tree.last()
    }

    /// Visit the key/value pairs in the `MapBy` in key order
    pub fn each<G>(&mut self, visit: G)
    where
        G: FnMut(&K, &A::Value),
    {
        self.tree.each(visit);
    }

    /// Get the aggregate of every key `k` with `!less(k, l) && less(k, r)`, or `None` if there
    /// are none
    pub fn range(&mut self, l: &K, r: &K) -> Option<&A::Agg> {
        self.tree.range(l, r)
    }

    /// Get mutable access to the aggregate of every key `k` with `!less(k, l) && less(k, r)`, or
    /// `None` if there are none
    pub fn range_mut(&mut self, l: &K, r: &K) -> Option<RangeMut<'_, K, A, F>> {
        self.tree.range_mut(l, r)
    }

    /// Get the aggregate of the whole map
    pub fn total(&self) -> Option<&A::Agg> {
        self.tree.total()
    }
}

impl<K, A, F> Clone for MapBy<K, A, F>
where
    K: Clone,
    A: Aggregator + Clone,
    A::Agg: Clone,
    F: Fn(&K, &K) -> bool + Clone,
{
    fn clone(&self) -> Self {
        MapBy {
            tree: self.tree.clone(),
        }
    }
}

impl<K, A, F> Extend<(K, A::Value)> for MapBy<K, A, F>
where
    A: Aggregator,
    F: Fn(&K, &K) -> bool,
{
    fn extend<I: IntoIterator<Item = (K, A::Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

//-----------------------------------------------------------------------------------------------//

#[test]
// A very simple test of setting a map
fn test_map_0() {
    use crate::testing::Plain;
    use alloc::string::{String, ToString};

    let mut map = Map::new(Plain::<String>::default());

    map.put(5, "Five".to_string());
    map.put(1, "One".to_string());
    map.put(9, "Nine".to_string());

    assert_eq!(map.get(&5), Some(&"Five".to_string()));
    assert_eq!(map.get(&4), None);

    let mut v: Vec<(i32, String)> = Vec::new();
    map.each(|key, value| v.push((*key, value.clone())));
    assert_eq!(
        v,
        vec![
            (1, "One".to_string()),
            (5, "Five".to_string()),
            (9, "Nine".to_string())
        ]
    );
}

#[test]
// Overwriting and removing keys
fn test_map_1() {
    use crate::testing::Plain;
    use alloc::string::{String, ToString};

    let mut map: Map<u32, Plain<String>> = [(1, "a"), (2, "b"), (3, "c")]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();

    map.put(2, "B".to_string());
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&2), Some(&"B".to_string()));

    assert!(map.remove(&2));
    assert!(!map.remove(&2));
    assert!(!map.contains_key(&2));
    assert_eq!(map.len(), 2);
    assert_eq!(map.first().map(|(k, _)| *k), Some(1));
    assert_eq!(map.last().map(|(k, _)| *k), Some(3));
}

#[test]
// Range minimums
fn test_map_2() {
    use crate::testing::Min;

    let mut map: Map<u32, Min> = [(10, 7), (20, 3), (30, 9), (40, 1), (50, 4)]
        .into_iter()
        .collect();

    assert_eq!(map.range(&10, &30).map(|l| l.min), Some(3));
    assert_eq!(map.range(&25, &45).map(|l| l.min), Some(1));
    assert_eq!(map.range(&45, &100).map(|l| l.min), Some(4));
    assert_eq!(map.range(&0, &10).map(|l| l.min), None);
    assert_eq!(map.total().map(|l| l.min), Some(1));

    map.remove(&40);
    assert_eq!(map.range(&25, &45).map(|l| l.min), Some(9));
    assert_eq!(map.total().map(|l| l.min), Some(3));
}

#[test]
// String keys
fn test_map_3() {
    use crate::testing::Sum;

    let mut map = StringMap::new(Sum);

    map.put("pear", 4);
    map.put("apple", 1);
    map.put("fig", 3);
    map.put("banana", 2);

    assert_eq!(map.get("fig"), Some(&3));
    assert_eq!(map.get("grape"), None);
    assert_eq!(map.range("b", "g").map(|t| t.sum), Some(5));
    assert_eq!(map.range("a", "z").map(|t| t.sum), Some(10));
    assert_eq!(map.range("q", "z").map(|t| t.sum), None);
    assert_eq!(map.nth(0), Some(("apple", &1)));

    let mut keys = Vec::new();
    map.each(|key, _| keys.push(alloc::string::String::from(key)));
    assert_eq!(keys, ["apple", "banana", "fig", "pear"]);

    assert!(map.remove("apple"));
    assert_eq!(map.first(), Some(("banana", &2)));
    assert_eq!(map.last(), Some(("pear", &4)));
}

#[test]
// Range updates through a map with a custom ordering
fn test_map_4() {
    use crate::testing::AddSum;

    // Order by absolute value, so -3 and 3 are the same key
    let mut map = MapBy::new(|a: &i64, b: &i64| a.abs() < b.abs(), AddSum);
    map.extend([(-1, 10), (2, 20), (-3, 30), (4, 40)]);
    map.put(3, 300);

    assert_eq!(map.len(), 4);
    assert_eq!(map.get(&-3), Some(&300));

    if let Some(mut agg) = map.range_mut(&-2, &4) {
        agg.add(1);
    }
    assert_eq!(map.get(&2), Some(&21));
    assert_eq!(map.get(&3), Some(&301));
    assert_eq!(map.get(&1), Some(&10));
    assert_eq!(map.get(&4), Some(&40));
    assert_eq!(map.total().map(|t| t.sum), Some(372));

    let mut keys = Vec::new();
    map.each(|key, _| keys.push(*key));
    assert_eq!(keys, [-1, 2, -3, 4]);
}

#[test]
// A stress test with putting and getting
fn test_map_5() {
    use crate::testing::Plain;
    use alloc::string::{String, ToString};
    use rand::prelude::*;

    const COUNT: usize = 100000;

    let mut rng = SmallRng::seed_from_u64(1234567890);

    let mut map = Map::new(Plain::<String>::default());
    for _ in 0..COUNT {
        let key = rng.random_range(0..usize::MAX);
        let value = key.to_string();
        map.put(key, value);
    }

    assert_eq!(map.len(), COUNT);

    let mut rng = SmallRng::seed_from_u64(1234567890);

    for _ in 0..COUNT {
        let key = rng.random_range(0..usize::MAX);
        let value = key.to_string();
        assert_eq!(map.get(&key), Some(&value));
    }

    assert_eq!(map.len(), COUNT);
}

#[test]
// A stress test with putting and removing
fn test_map_6() {
    use crate::testing::Sum;
    use rand::prelude::*;

    const COUNT: usize = 100000;

    let mut rng = SmallRng::seed_from_u64(5678901234);

    let mut map = Map::new(Sum);
    for _ in 0..COUNT {
        let key = rng.random_range(0..i64::MAX);
        map.put(key, 1);
    }

    assert_eq!(map.len(), COUNT);
    assert_eq!(map.total().map(|t| t.sum), Some(COUNT as i64));

    let mut rng = SmallRng::seed_from_u64(5678901234);

    for _ in 0..COUNT {
        let key = rng.random_range(0..i64::MAX);
        assert!(map.remove(&key));
    }

    assert!(map.is_empty());
    assert!(map.total().is_none());
}

#[test]
// Clones are independent of the map they were cloned from
fn test_map_7() {
    use crate::testing::{AddSum, Min};
    use crate::Aggregator;

    let mut map: Map<u32, Min> = [(1, 5), (2, 8), (3, 2)].into_iter().collect();
    let mut copy = map.clone();
    copy.put(4, 1);
    copy.remove(&1);

    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&1), Some(&5));
    assert!(!map.contains_key(&4));
    assert_eq!(map.total().map(|l| l.min), Some(2));
    assert_eq!(copy.total().map(|l| l.min), Some(1));

    let mut strings = StringMap::new(Min);
    strings.extend([("b", 2), ("a", 1)]);
    let mut copy = strings.clone();
    copy.extend([("c", 3)]);
    copy.put("a", 10);
    assert_eq!(strings.len(), 2);
    assert_eq!(strings.get("a"), Some(&1));
    assert_eq!(copy.range("a", "z").map(|l| l.min), Some(2));

    // Pending updates belong to the clone they were made in
    let mut by = MapBy::new(|a: &i64, b: &i64| a > b, AddSum);
    by.extend([(1, 10), (2, 20), (3, 30)]);
    let mut copy = by.clone();
    if let Some(mut agg) = copy.range_mut(&3, &1) {
        agg.add(5);
    }
    assert_eq!(copy.get(&2), Some(&25));
    assert_eq!(by.get(&2), Some(&20));
    assert_eq!(by.total().map(|t| t.sum), Some(60));
    assert_eq!(copy.total().map(|t| t.sum), Some(70));
    assert_eq!(copy.aggregator().from_value(4).sum, 4);
}
