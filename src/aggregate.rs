//! The aggregation contract used by every tree in this crate
#![warn(missing_docs)]

//-----------------------------------------------------------------------------------------------//

/// Defines how per-key values fold into subtree summaries, and how pending (lazy) updates travel
/// down the tree.
///
/// Every leaf of a tree owns exactly one `Agg`. The tree never looks inside it: it only calls the
/// hooks below, in a fixed order. Before a leaf's children are read, rotated or handed out, the
/// tree calls [`push_down`](Aggregator::push_down) on that leaf. After the children of a leaf have
/// settled, the tree calls [`pop_up`](Aggregator::pop_up) on it. An empty subtree is always passed
/// as `None`.
///
/// Range queries are only as correct as this pair: `pop_up` has to be an associative combine and
/// `push_down` has to distribute over it.
///
/// A plain ordered map needs nothing more than storing the value:
///
/// ```
/// use copse::Aggregator;
///
/// struct Plain;
///
/// impl Aggregator for Plain {
///     type Value = u32;
///     type Agg = u32;
///
///     fn from_value(&self, value: u32) -> u32 {
///         value
///     }
///
///     fn pop_up(&self, _agg: &mut u32, _left: Option<&u32>, _right: Option<&u32>) {}
///
///     fn value<'a>(&self, agg: &'a u32) -> &'a u32 {
///         agg
///     }
/// }
/// ```
pub trait Aggregator {
    /// The value associated with each key
    type Value;

    /// The per-leaf summary of a subtree
    type Agg;

    /// Build the summary of a freshly inserted leaf that has no children
    fn from_value(&self, value: Self::Value) -> Self::Agg;

    /// Recombine `agg` from its own value and the summaries of its two children
    ///
    /// The children have already been brought up to date. `None` stands for an empty subtree.
    fn pop_up(&self, agg: &mut Self::Agg, left: Option<&Self::Agg>, right: Option<&Self::Agg>);

    /// Apply any update pending in `agg` to its two children, then clear it from `agg`
    ///
    /// `None` stands for an empty subtree, which has nothing to receive the update. The default
    /// does nothing, which is right for aggregators that never hold pending state.
    #[allow(unused_variables)]
    fn push_down(
        &self,
        agg: &mut Self::Agg,
        left: Option<&mut Self::Agg>,
        right: Option<&mut Self::Agg>,
    ) {
    }

    /// Project the value of the leaf itself out of its summary
    fn value<'a>(&self, agg: &'a Self::Agg) -> &'a Self::Value;
}
