//! ## Introduction
//!
//! This crate implements ordered maps based on splay trees that can also summarise, and update,
//! whole ranges of keys at once. Splay trees are self-organising: every access rotates the key it
//! touches to the root, so keys that are used together stay close to the top and cost less to
//! reach again. Lookup, insertion and removal take amortised logarithmic time.
//!
//! What sets these maps apart is that every leaf also carries an *aggregate*, a summary of the
//! subtree below it (a sum, a minimum, a count, or anything else that combines associatively).
//! Asking for the aggregate of every key in `[l, r)` is then also amortised logarithmic, and so
//! is applying a bulk update to that range, recorded lazily and handed down the tree only when
//! something below is next touched.
//!
//! ## Aggregators
//!
//! How values combine is supplied by the caller, by implementing [`Aggregator`]. The crate ships
//! no concrete aggregator: a sum with range-add, a range minimum and a plain value store are all a
//! few lines each.
//!
//! ## Contents
//!
//! <center>
//!
//! | Type             | Keys          | Sorts By  |
//! |:-----------------|:--------------|:----------|
//! | `Map`            | Key           | Ord       |
//! | `MapBy`          | Key           | Function  |
//! | `StringMap`      | String        | Ord       |
//!
//! </center>
//!
//! The crate exposes an additional type `util::Tree` that provides the foundation of the other
//! types. It is a splay tree over keys ordered by a "less than" function, storing its leaves in a
//! single array addressed by `usize` indices. It is provided to support development of additional
//! collection types.
//!
//! ## Caveats
//!
//! - Every operation restructures the tree, including lookups, so even reads take `&mut self`.
//! - A single access can take linear time; only sequences of accesses are logarithmic on average.
//! - Nothing is synchronised. Share a map between threads behind a lock.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

mod aggregate;
mod map;
pub mod util;

#[cfg(test)]
mod testing;

pub use aggregate::Aggregator;
pub use map::*;
pub use util::RangeMut;
