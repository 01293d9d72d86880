use std::borrow::Borrow;
use std::fmt::{self, Debug};

use super::rbtree::{self, or_alloc_error, RBTree};


/// An ordered set of unique values, backed by an [`RBTree`].
pub struct RBSet<T> {
    tree: RBTree<T>,
}

impl<T> RBSet<T> {
    pub const fn new() -> Self {
        Self { tree: RBTree::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn iter(&self) -> rbtree::Iter<'_, T> {
        self.tree.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.tree.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.tree.last_value()
    }

    pub fn pop_first(&mut self) -> Option<T> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<T> {
        self.tree.pop_last()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T: Ord> RBSet<T> {
    /// Adds a value, returning whether it was new. An equal value already in the set is kept.
    pub fn insert(&mut self, value: T) -> bool {
        or_alloc_error(self.tree.insert(value, true).map(|(_, inserted)| inserted))
    }

    pub fn contains<Q: Ord + ?Sized>(&self, value: &Q) -> bool where T: Borrow<Q> {
        self.tree.contains(value)
    }

    /// The stored value equal to `value`, if any.
    pub fn get<Q: Ord + ?Sized>(&self, value: &Q) -> Option<&T> where T: Borrow<Q> {
        self.tree.find(value).get()
    }

    pub fn remove<Q: Ord + ?Sized>(&mut self, value: &Q) -> bool where T: Borrow<Q> {
        self.take(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`, if any.
    pub fn take<Q: Ord + ?Sized>(&mut self, value: &Q) -> Option<T> where T: Borrow<Q> {
        self.tree.remove(value)
    }
}

impl<T> Default for RBSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for RBSet<T> {
    fn clone(&self) -> Self {
        Self { tree: self.tree.clone() }
    }
}

impl<T: Debug> Debug for RBSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for RBSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T: Eq> Eq for RBSet<T> {}

impl<T: Ord> Extend<T> for RBSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord> FromIterator<T> for RBSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for RBSet<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<'a, T> IntoIterator for &'a RBSet<T> {
    type Item = &'a T;
    type IntoIter = rbtree::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for RBSet<T> {
    type Item = T;
    type IntoIter = rbtree::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}
