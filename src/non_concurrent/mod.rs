//! Ordered containers for single-threaded use.

pub mod rbtree;
pub mod rb_set;
pub mod rb_map;

pub use rbtree::{RBTree, RBTreeError};
pub use rb_set::RBSet;
pub use rb_map::RBMap;
