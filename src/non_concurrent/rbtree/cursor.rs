use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::node::{Link, Node};
use super::RBTree;


/// A shared position in a tree: either a value, or the end.
///
/// Steps in sorted order using only the links around the current node. Moving past either edge
/// lands on the end, and stepping from the end stays there.
pub struct Cursor<'a, T> {
    pub(super) node: Link<T>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Cursor<'a, T> {
    pub(super) fn new(node: Link<T>) -> Self {
        Self { node, _marker: PhantomData }
    }

    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// The value under the cursor. Stored values are never handed out mutably, since that could
    /// break the ordering.
    pub fn get(&self) -> Option<&'a T> {
        // SAFETY: the tree is borrowed for `'a`, so the node stays alive and unchanged.
        self.node.map(|node| unsafe { Node::value(node) })
    }

    /// Moves to the in-order successor.
    pub fn move_next(&mut self) {
        if let Some(node) = self.node {
            // SAFETY: see `get`.
            self.node = unsafe { Node::successor(node) };
        }
    }

    /// Moves to the in-order predecessor.
    pub fn move_prev(&mut self) {
        if let Some(node) = self.node {
            // SAFETY: see `get`.
            self.node = unsafe { Node::predecessor(node) };
        }
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self { *self }
}
impl<T> Copy for Cursor<'_, T> {}

/// Cursors are equal when they sit on the same node (or are both at the end).
impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}
impl<T> Eq for Cursor<'_, T> {}

impl<T: Debug> Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}


/// An exclusive position in a tree, which can also erase the value under it.
pub struct CursorMut<'a, T> {
    tree: &'a mut RBTree<T>,
    node: Link<T>,
}

impl<'a, T> CursorMut<'a, T> {
    pub(super) fn new(tree: &'a mut RBTree<T>, node: Link<T>) -> Self {
        Self { tree, node }
    }

    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        self.as_cursor().get()
    }

    pub fn move_next(&mut self) {
        let mut cursor = self.as_cursor();
        cursor.move_next();
        self.node = cursor.node;
    }

    pub fn move_prev(&mut self) {
        let mut cursor = self.as_cursor();
        cursor.move_prev();
        self.node = cursor.node;
    }

    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(self.node)
    }

    pub fn into_cursor(self) -> Cursor<'a, T> {
        Cursor::new(self.node)
    }

    /// Removes the value under the cursor and moves to its in-order successor (or the end).
    ///
    /// At the end this does nothing and returns `None`.
    pub fn erase(&mut self) -> Option<T> {
        let node = self.node?;
        // SAFETY: `node` belongs to `self.tree`, which we borrow exclusively.
        let (value, next) = unsafe { self.tree.erase_node(node) };
        self.node = next;
        Some(value)
    }
}

impl<T: Debug> Debug for CursorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}


/// In-order iterator over the values of a tree.
pub struct Iter<'a, T> {
    front: Link<T>,
    back: Link<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

impl<T> Iter<'_, T> {
    pub(super) fn new(front: Link<T>, back: Link<T>, len: usize) -> Self {
        Self { front, back, remaining: len, _marker: PhantomData }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        // `remaining` stops us once the two ends have crossed
        if self.remaining == 0 { return None }
        let node = self.front?;
        self.remaining -= 1;
        // SAFETY: the tree is borrowed for `'a`.
        unsafe {
            self.front = Node::successor(node);
            Some(Node::value(node))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 { return None }
        let node = self.back?;
        self.remaining -= 1;
        // SAFETY: the tree is borrowed for `'a`.
        unsafe {
            self.back = Node::predecessor(node);
            Some(Node::value(node))
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}


/// Owning in-order iterator, taking values off either end of the tree.
pub struct IntoIter<T> {
    tree: RBTree<T>,
}

impl<T> IntoIter<T> {
    pub(super) fn new(tree: RBTree<T>) -> Self {
        Self { tree }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.tree.pop_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}
