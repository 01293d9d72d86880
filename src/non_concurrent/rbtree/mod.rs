//! A red-black tree over owned values, the storage engine behind [`RBSet`] and [`RBMap`].
//!
//! Nodes are individually heap allocated and linked with raw pointers: children are owned by their
//! parent, and every node keeps a non-owning back-reference to its parent so cursors can step in
//! sorted order without a stack.
//!
//! [`RBSet`]: super::RBSet
//! [`RBMap`]: super::RBMap

use std::alloc::Layout;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::ptr::NonNull;

mod balance;
mod cursor;
mod node;
#[cfg(any(test, feature = "verify"))]
mod verify;
#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut, IntoIter, Iter};
#[cfg(any(test, feature = "verify"))]
pub use verify::InvariantViolation;

use node::{Link, Node};
#[cfg(test)]
pub(crate) use node::alloc_failure;


#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RBTreeError {
    /// The allocator could not provide memory for a node of the given layout.
    OutOfMemory(Layout),
}

impl Display for RBTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory(layout) => write!(f, "out of memory allocating a tree node ({} bytes)", layout.size()),
        }
    }
}

impl std::error::Error for RBTreeError {}

/// Aborts on allocation failure, like the std collections do.
pub(crate) fn or_alloc_error<R>(result: Result<R, RBTreeError>) -> R {
    match result {
        Ok(r) => r,
        Err(RBTreeError::OutOfMemory(layout)) => std::alloc::handle_alloc_error(layout),
    }
}

/// A red-black tree ordered by `T: Ord`, optionally holding equal values side by side.
pub struct RBTree<T> {
    root: Link<T>,
    len: usize,
    // the tree owns its nodes, and through them the values
    _marker: PhantomData<Box<Node<T>>>,
}

impl<T> RBTree<T> {
    pub const fn new() -> Self {
        Self { root: None, len: 0, _marker: PhantomData }
    }

    /// The number of values in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A cursor at the smallest value, or at the end if the tree is empty.
    pub fn begin(&self) -> Cursor<'_, T> {
        // SAFETY: the root is a live node owned by `self`.
        Cursor::new(self.root.map(|root| unsafe { Node::leftmost(root) }))
    }

    /// The past-the-end cursor.
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::new(None)
    }

    /// A cursor at the greatest value, where a backwards walk starts.
    pub fn last(&self) -> Cursor<'_, T> {
        // SAFETY: the root is a live node owned by `self`.
        Cursor::new(self.root.map(|root| unsafe { Node::rightmost(root) }))
    }

    pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
        let first = self.begin().node;
        CursorMut::new(self, first)
    }

    pub fn first(&self) -> Option<&T> {
        self.begin().get()
    }

    pub fn last_value(&self) -> Option<&T> {
        self.last().get()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.begin().node, self.last().node, self.len)
    }

    /// Removes every value, children before their parents.
    pub fn clear(&mut self) {
        if self.root.is_none() { return }

        debug!("Clearing tree of {} nodes", self.len);
        // SAFETY: the root and everything below it is owned by `self`, and we forget about it right after.
        unsafe { Self::free_subtree(self.root) };
        self.root = None;
        self.len = 0;
    }

    /// SAFETY: `link` must own its whole subtree, and nothing may use the subtree afterwards.
    unsafe fn free_subtree(link: Link<T>) {
        let Some(node) = link else { return };
        // a tree with `n` nodes has height at most `2*log₂(n+1)`, so the recursion can't get deep
        unsafe {
            Self::free_subtree((*node.as_ptr()).left);
            Self::free_subtree((*node.as_ptr()).right);
            drop(Node::free(node));
        }
    }

    /// Exchanges the contents of two trees in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.root, &mut other.root);
        std::mem::swap(&mut self.len, &mut other.len);
    }

    /// Descends from the root, steering with `cmp` (the ordering of the target relative to each
    /// visited value), and returns the first node where it reports `Equal`.
    fn find_node_by(&self, mut cmp: impl FnMut(&T) -> Ordering) -> Link<T> {
        let mut current = self.root;
        while let Some(node) = current {
            // SAFETY: `node` is owned by `self`, which is borrowed for the whole loop.
            let value = unsafe { Node::value(node) };
            current = match cmp(value) {
                Ordering::Less => unsafe { (*node.as_ptr()).left },
                Ordering::Greater => unsafe { (*node.as_ptr()).right },
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    pub(crate) fn find_by(&self, cmp: impl FnMut(&T) -> Ordering) -> Cursor<'_, T> {
        Cursor::new(self.find_node_by(cmp))
    }

    /// Mutable access to a stored value found with `cmp`.
    ///
    /// The caller must not change anything the ordering depends on.
    pub(crate) fn find_value_mut_by(&mut self, cmp: impl FnMut(&T) -> Ordering) -> Option<&mut T> {
        let node = self.find_node_by(cmp)?;
        // SAFETY: `self` is borrowed mutably for the lifetime of the reference.
        Some(unsafe { &mut (*node.as_ptr()).value })
    }

    pub(crate) fn remove_by(&mut self, cmp: impl FnMut(&T) -> Ordering) -> Option<T> {
        let node = self.find_node_by(cmp)?;
        // SAFETY: `node` was just found in `self`.
        Some(unsafe { self.erase_node(node) }.0)
    }

    pub fn pop_first(&mut self) -> Option<T> {
        self.begin_mut().erase()
    }

    pub fn pop_last(&mut self) -> Option<T> {
        let last = self.last().node;
        CursorMut::new(self, last).erase()
    }

    /// Deep copy of the tree, keeping its exact shape and colors.
    pub fn try_clone(&self) -> Result<Self, RBTreeError> where T: Clone {
        let mut out = Self::new();
        let Some(root) = self.root else { return Ok(out) };

        debug!("Cloning tree of {} nodes", self.len);
        // SAFETY: `root` is owned by `self`; every node allocated so far is already linked into
        //         `out`, so an early return frees them when `out` drops.
        unsafe {
            let new_root = Self::clone_node(root)?;
            out.root = Some(new_root);
            out.len = 1;
            out.clone_children(root, new_root)?;
        }
        Ok(out)
    }

    unsafe fn clone_node(source: NonNull<Node<T>>) -> Result<NonNull<Node<T>>, RBTreeError> where T: Clone {
        unsafe {
            let node = Node::try_alloc(Node::value(source).clone()).map_err(|(err, _)| err)?;
            Node::set_color(node, (*source.as_ptr()).color);
            Ok(node)
        }
    }

    unsafe fn clone_children(&mut self, source: NonNull<Node<T>>, target: NonNull<Node<T>>) -> Result<(), RBTreeError> where T: Clone {
        unsafe {
            if let Some(left) = (*source.as_ptr()).left {
                let copy = Self::clone_node(left)?;
                Node::attach_left(target, Some(copy));
                self.len += 1;
                self.clone_children(left, copy)?;
            }
            if let Some(right) = (*source.as_ptr()).right {
                let copy = Self::clone_node(right)?;
                Node::attach_right(target, Some(copy));
                self.len += 1;
                self.clone_children(right, copy)?;
            }
        }
        Ok(())
    }
}

impl<T: Ord> RBTree<T> {
    /// A cursor at a value equal to `value`, or at the end if there is none.
    pub fn find<Q: Ord + ?Sized>(&self, value: &Q) -> Cursor<'_, T> where T: Borrow<Q> {
        self.find_by(|v| value.cmp(v.borrow()))
    }

    pub fn find_mut<Q: Ord + ?Sized>(&mut self, value: &Q) -> CursorMut<'_, T> where T: Borrow<Q> {
        let node = self.find_node_by(|v| value.cmp(v.borrow()));
        CursorMut::new(self, node)
    }

    pub fn contains<Q: Ord + ?Sized>(&self, value: &Q) -> bool where T: Borrow<Q> {
        !self.find(value).is_end()
    }

    /// Inserts `value`, returning a cursor at it and whether it was inserted.
    ///
    /// With `unique` set, an equal value already in the tree wins: the cursor points at it, the
    /// tree is left alone and `value` is dropped. Otherwise equal values are kept side by side,
    /// later ones after earlier ones.
    ///
    /// On allocation failure the tree is left exactly as it was.
    pub fn insert(&mut self, value: T, unique: bool) -> Result<(Cursor<'_, T>, bool), RBTreeError> {
        let mut parent = None;
        let mut goes_left = false;
        let mut current = self.root;

        while let Some(node) = current {
            // SAFETY: `node` is owned by `self`, and nothing is mutated during the descent.
            let ordering = value.cmp(unsafe { Node::value(node) });
            if ordering == Ordering::Equal && unique {
                return Ok((Cursor::new(Some(node)), false))
            }

            parent = Some(node);
            goes_left = ordering == Ordering::Less;
            current = unsafe {
                if goes_left { (*node.as_ptr()).left } else { (*node.as_ptr()).right }
            };
        }

        let node = Node::try_alloc(value).map_err(|(err, _)| err)?;

        // SAFETY: `parent` is owned by `self` and has a free slot on the chosen side; `node` is fresh.
        unsafe {
            match parent {
                None => self.root = Some(node),
                Some(parent) if goes_left => Node::attach_left(parent, Some(node)),
                Some(parent) => Node::attach_right(parent, Some(node)),
            }
            self.len += 1;
            self.insert_fixup(node);
        }

        Ok((Cursor::new(Some(node)), true))
    }

    /// Removes one value equal to `value`, if any.
    pub fn remove<Q: Ord + ?Sized>(&mut self, value: &Q) -> Option<T> where T: Borrow<Q> {
        self.remove_by(|v| value.cmp(v.borrow()))
    }
}

impl<T> Drop for RBTree<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for RBTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for RBTree<T> {
    fn clone(&self) -> Self {
        or_alloc_error(self.try_clone())
    }
}

impl<T: Debug> Debug for RBTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for RBTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for RBTree<T> {}

impl<T: Ord> Extend<T> for RBTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            or_alloc_error(self.insert(value, false).map(|_| ()));
        }
    }
}

/// Builds a tree by inserting every value in turn, duplicates included.
impl<T: Ord> FromIterator<T> for RBTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for RBTree<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<'a, T> IntoIterator for &'a RBTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for RBTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
