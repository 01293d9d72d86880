use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::ops::Index;

use super::rbtree::{self, or_alloc_error, RBTree};


/// A key/value pair, ordered by key alone.
#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

impl<K: PartialEq, V> PartialEq for Entry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, V> Eq for Entry<K, V> {}

impl<K: Ord, V> PartialOrd for Entry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for Entry<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// An ordered map with unique keys, backed by an [`RBTree`] of entries.
pub struct RBMap<K, V> {
    tree: RBTree<Entry<K, V>>,
}

impl<K, V> RBMap<K, V> {
    pub const fn new() -> Self {
        Self { tree: RBTree::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { inner: self.tree.iter() }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, v)| v)
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|e| (&e.key, &e.value))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last_value().map(|e| (&e.key, &e.value))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(|e| (e.key, e.value))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(|e| (e.key, e.value))
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K: Ord, V> RBMap<K, V> {
    /// Inserts a pair. If the key was already present, its value is replaced and the old one
    /// returned; the stored key is kept.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(entry) = self.tree.find_value_mut_by(|e| key.cmp(&e.key)) {
            return Some(std::mem::replace(&mut entry.value, value))
        }
        or_alloc_error(self.tree.insert(Entry { key, value }, true).map(|_| ()));
        None
    }

    pub fn get<Q: Ord + ?Sized>(&self, key: &Q) -> Option<&V> where K: Borrow<Q> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q: Ord + ?Sized>(&self, key: &Q) -> Option<(&K, &V)> where K: Borrow<Q> {
        let entry = self.tree.find_by(|e| key.cmp(e.key.borrow())).get()?;
        Some((&entry.key, &entry.value))
    }

    /// Mutable access to a value. Keys stay immutable, since changing one could break the ordering.
    pub fn get_mut<Q: Ord + ?Sized>(&mut self, key: &Q) -> Option<&mut V> where K: Borrow<Q> {
        self.tree.find_value_mut_by(|e| key.cmp(e.key.borrow())).map(|e| &mut e.value)
    }

    pub fn contains_key<Q: Ord + ?Sized>(&self, key: &Q) -> bool where K: Borrow<Q> {
        !self.tree.find_by(|e| key.cmp(e.key.borrow())).is_end()
    }

    pub fn remove<Q: Ord + ?Sized>(&mut self, key: &Q) -> Option<V> where K: Borrow<Q> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q: Ord + ?Sized>(&mut self, key: &Q) -> Option<(K, V)> where K: Borrow<Q> {
        self.tree.remove_by(|e| key.cmp(e.key.borrow())).map(|e| (e.key, e.value))
    }
}

impl<K, V> Default for RBMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for RBMap<K, V> {
    fn clone(&self) -> Self {
        Self { tree: self.tree.clone() }
    }
}

impl<K: Debug, V: Debug> Debug for RBMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for RBMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for RBMap<K, V> {}

impl<K: Ord, V> Extend<(K, V)> for RBMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Later pairs overwrite the values of earlier ones with the same key.
impl<K: Ord, V> FromIterator<(K, V)> for RBMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for RBMap<K, V> {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

impl<K: Ord + Borrow<Q>, Q: Ord + ?Sized, V> Index<&Q> for RBMap<K, V> {
    type Output = V;

    /// Panics if the key is missing.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

/// In-order iterator over the entries of an [`RBMap`].
pub struct Iter<'a, K, V> {
    inner: rbtree::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|e| (&e.key, &e.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a RBMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for RBMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self.tree.into_iter() }
    }
}

/// Owning in-order iterator over the entries of an [`RBMap`].
pub struct IntoIter<K, V> {
    inner: rbtree::IntoIter<Entry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|e| (e.key, e.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
