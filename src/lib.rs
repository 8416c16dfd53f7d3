//! # ordered-collections
//!
//! `ordered-collections` provides an ordered associative container backed by a 2-3 red-black
//! tree: a red-black tree that never allows a node to have two red children, making it
//! isomorphic to a 2-3 tree. Insertion and deletion are implemented as a single top-down
//! descent followed by a bottom-up rebalancing walk over parent-linked, direction-tagged
//! nodes, so no operation needs an explicit stack or recursion.
//!
//! Two containers are exposed: [`red_black_tree::RedBlackMap`], generic over key, value, and
//! comparator, and [`red_black_tree::RawMap`], a type-erased variant that packs opaque key and
//! value bytes into a single block per node using a runtime [`layout::Layout`] and a
//! comparison function from the [`comparator`] catalogue.
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! ordered-collections = "*"
//! ```
//!
//! ## References
//!  - [A pedagogically sound yet efficient deletion algorithm for red-black trees: the
//!    parity-seeking delete algorithm](https://arxiv.org/abs/2004.04344)
//!  > Ghiasi-Shirazi, Kamaledin, Taraneh Ghandi, Ali Taghizadeh, and Ali Rahimi-Baigi. 2022.
//!  > "A Pedagogically Sound yet Efficient Deletion Algorithm for Red-Black Trees: The
//!  > Parity-Seeking Delete Algorithm." *CoRR* abs/2004.04344.
//!  - [Left-leaning Red-Black Trees](https://www.cs.princeton.edu/~rs/talks/LLRB/LLRB.pdf)
//!  > Sedgewick, Robert. 2008. "Left-Leaning Red-Black Trees."

#![warn(missing_docs)]

extern crate byteorder;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod arena;
pub mod comparator;
mod entry;
pub mod layout;
pub mod red_black_tree;
