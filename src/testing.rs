//! Aggregators used by the tests

use core::marker::PhantomData;

use crate::aggregate::Aggregator;

//-----------------------------------------------------------------------------------------------//

// Sums values over a subtree
pub(crate) struct Sum;

#[derive(Clone, Debug)]
pub(crate) struct Total {
    pub value: i64,
    pub sum: i64,
}

impl Aggregator for Sum {
    type Value = i64;
    type Agg = Total;

    fn from_value(&self, value: i64) -> Total {
        Total { value, sum: value }
    }

    fn pop_up(&self, agg: &mut Total, left: Option<&Total>, right: Option<&Total>) {
        agg.sum = agg.value + left.map_or(0, |l| l.sum) + right.map_or(0, |r| r.sum);
    }

    fn value<'a>(&self, agg: &'a Total) -> &'a i64 {
        &agg.value
    }
}

//-----------------------------------------------------------------------------------------------//

// Sums values over a subtree, with a lazy "add to every value" update
#[derive(Clone)]
pub(crate) struct AddSum;

#[derive(Clone, Debug)]
pub(crate) struct Lazy {
    pub value: i64,
    pub sum: i64,
    pub count: i64,
    pub pending: i64,
}

impl Lazy {
    // Add `delta` to every value in the subtree
    pub fn add(&mut self, delta: i64) {
        self.value += delta;
        self.sum += delta * self.count;
        self.pending += delta;
    }
}

impl Aggregator for AddSum {
    type Value = i64;
    type Agg = Lazy;

    fn from_value(&self, value: i64) -> Lazy {
        Lazy {
            value,
            sum: value,
            count: 1,
            pending: 0,
        }
    }

    fn pop_up(&self, agg: &mut Lazy, left: Option<&Lazy>, right: Option<&Lazy>) {
        debug_assert_eq!(agg.pending, 0);
        agg.count = 1 + left.map_or(0, |l| l.count) + right.map_or(0, |r| r.count);
        agg.sum = agg.value + left.map_or(0, |l| l.sum) + right.map_or(0, |r| r.sum);
    }

    fn push_down(&self, agg: &mut Lazy, left: Option<&mut Lazy>, right: Option<&mut Lazy>) {
        if agg.pending == 0 {
            return;
        }
        for child in [left, right].into_iter().flatten() {
            child.add(agg.pending);
        }
        agg.pending = 0;
    }

    fn value<'a>(&self, agg: &'a Lazy) -> &'a i64 {
        &agg.value
    }
}

//-----------------------------------------------------------------------------------------------//

// Tracks the smallest value in a subtree
#[derive(Clone, Default)]
pub(crate) struct Min;

#[derive(Clone, Debug)]
pub(crate) struct Least {
    pub value: u32,
    pub min: u32,
}

impl Aggregator for Min {
    type Value = u32;
    type Agg = Least;

    fn from_value(&self, value: u32) -> Least {
        Least { value, min: value }
    }

    fn pop_up(&self, agg: &mut Least, left: Option<&Least>, right: Option<&Least>) {
        agg.min = [left.map(|l| l.min), right.map(|r| r.min)]
            .into_iter()
            .flatten()
            .fold(agg.value, u32::min);
    }

    fn value<'a>(&self, agg: &'a Least) -> &'a u32 {
        &agg.value
    }
}

//-----------------------------------------------------------------------------------------------//

// Stores a value with no aggregation at all
pub(crate) struct Plain<V>(PhantomData<V>);

impl<V> Default for Plain<V> {
    fn default() -> Self {
        Plain(PhantomData)
    }
}

impl<V> Aggregator for Plain<V> {
    type Value = V;
    type Agg = V;

    fn from_value(&self, value: V) -> V {
        value
    }

    fn pop_up(&self, _agg: &mut V, _left: Option<&V>, _right: Option<&V>) {}

    fn value<'a>(&self, agg: &'a V) -> &'a V {
        agg
    }
}

//-----------------------------------------------------------------------------------------------//

// Model based testing against `BTreeMap`, in the manner of a fuzz harness
mod model {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::AddSum;
    use crate::util::Tree;

    #[derive(Clone, Debug)]
    enum Op {
        Put(u8, i64),
        Remove(u8),
        Get(u8),
        Nth(usize),
        Range(u8, u8),
        Add(u8, u8, i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), -100i64..100).prop_map(|(k, v)| Op::Put(k, v)),
            any::<u8>().prop_map(Op::Remove),
            any::<u8>().prop_map(Op::Get),
            (0usize..300).prop_map(Op::Nth),
            (any::<u8>(), any::<u8>()).prop_map(|(l, r)| Op::Range(l, r)),
            (any::<u8>(), any::<u8>(), -10i64..10).prop_map(|(l, r, d)| Op::Add(l, r, d)),
        ]
    }

    proptest! {
        #[test]
        fn tree_matches_btree_map(ops in proptest::collection::vec(op_strategy(), 1..400)) {
            let mut tree = Tree::new(|a: &u8, b: &u8| a < b, AddSum);
            let mut model: BTreeMap<u8, i64> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Put(k, v) => {
                        tree.put(k, v);
                        model.insert(k, v);
                    }
                    Op::Remove(k) => {
                        prop_assert_eq!(tree.remove(&k), model.remove(&k).is_some());
                    }
                    Op::Get(k) => {
                        prop_assert_eq!(tree.get(&k).copied(), model.get(&k).copied());
                    }
                    Op::Nth(n) => {
                        let got = tree.nth(n).map(|(k, v)| (*k, *v));
                        let expected = model.iter().nth(n).map(|(k, v)| (*k, *v));
                        prop_assert_eq!(got, expected);
                    }
                    Op::Range(l, r) => {
                        let got = tree.range(&l, &r).map(|agg| (agg.count, agg.sum));
                        let expected = if l < r {
                            let values: Vec<i64> = model.range(l..r).map(|(_, v)| *v).collect();
                            (!values.is_empty()).then(|| (values.len() as i64, values.iter().sum::<i64>()))
                        } else {
                            None
                        };
                        prop_assert_eq!(got, expected);
                    }
                    Op::Add(l, r, d) => {
                        if let Some(mut agg) = tree.range_mut(&l, &r) {
                            agg.add(d);
                        }
                        if l < r {
                            for (_, v) in model.range_mut(l..r) {
                                *v += d;
                            }
                        }
                    }
                }
                prop_assert_eq!(tree.len(), model.len());
            }

            tree.check();
            let mut pairs = Vec::new();
            tree.each(|k, v| pairs.push((*k, *v)));
            let expected: Vec<(u8, i64)> = model.into_iter().collect();
            prop_assert_eq!(pairs, expected);
        }
    }
}
