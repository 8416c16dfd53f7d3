//! Ordered maps backed by a 2-3 red-black tree.
//!
//! A 2-3 red-black tree is a red-black tree that forbids a node from having two red
//! children, making it isomorphic to a 2-3 tree. Nodes carry parent links and a cached
//! direction tag, so insertion and removal each run as one top-down descent plus one
//! bottom-up rebalancing walk built from a small closed set of local rotations, and the
//! whole tree can be streamed in post-order without a stack for teardown and copying.
//!
//! [`RedBlackMap`] is the typed container, generic over key, value, and comparator.
//! [`RawMap`] erases both key and value to raw bytes packed into a single block per node,
//! for callers that only know their element types at run time.

mod map;
mod node;
mod raw;
mod tree;

pub use self::map::RedBlackMap;
pub use self::raw::RawMap;

use crate::arena::AllocationError;
use std::error;
use std::fmt;

/// The error type for map operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// Memory for a node could not be obtained. The operation had no effect: a failed
    /// insertion leaves the map as it was, and a failed copy releases everything it
    /// allocated.
    AllocationFailed,
    /// An internal invariant of the tree does not hold. Returned by `check` only; seeing
    /// this value means the container implementation has a bug.
    InvariantViolation(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AllocationFailed => write!(f, "node allocation failed"),
            Error::InvariantViolation(description) => {
                write!(f, "invariant violation: {}", description)
            }
        }
    }
}

impl error::Error for Error {}

impl From<AllocationError> for Error {
    fn from(_: AllocationError) -> Error {
        Error::AllocationFailed
    }
}
