#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
extern crate log;

// not concurrent
pub mod non_concurrent;

pub mod logging;

pub use non_concurrent::{RBMap, RBSet, RBTree, RBTreeError};
