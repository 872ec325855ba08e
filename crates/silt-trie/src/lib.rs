//! # silt-trie
//!
//! A persistent (copy-on-write) trie and a concurrent store over it.
//!
//! - [`Trie`] maps byte-string keys to values; `put` and `remove` return a
//!   new trie that shares every untouched subtree with the old one, and no
//!   published node is ever mutated in place.
//! - [`TrieStore`] wraps a trie for concurrent use: readers walk an
//!   immutable snapshot lock-free, writers are serialized and publish new
//!   roots with a pointer swap, so writers never block readers.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod store;
mod trie;

pub use store::{TrieStore, ValueGuard};
pub use trie::Trie;
