//! Insertion-ordered map without hashing.
//!
//! Entries live in a single `Vec` and lookups are a linear scan. Histograms
//! hold a few thousand classes at most, so the scan is cheap, and the map
//! allocates nothing besides its one backing buffer.

use std::borrow::Borrow;
use std::slice;
use std::vec;

/// A key-unique map that iterates in first-insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: PartialEq, V> OrderedMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace the value for `key`.
    ///
    /// A replaced value keeps the position of the first insertion.
    pub fn put(&mut self, key: K, value: V) {
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Iterate over values in insertion order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.entries.iter(),
        }
    }

    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues {
            inner: self.entries.into_iter(),
        }
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries.iter().position(|(k, _)| k.borrow() == key)
    }
}

impl<K: PartialEq, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (key, value) in iter {
            map.put(key, value);
        }
        map
    }
}

/// Iterator over `(key, value)` pairs of an [`OrderedMap`].
#[derive(Debug)]
pub struct Iter<'a, K, V> {
    inner: slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over the values of an [`OrderedMap`].
#[derive(Debug)]
pub struct Values<'a, K, V> {
    inner: slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Owning iterator over the values of an [`OrderedMap`].
#[derive(Debug)]
pub struct IntoValues<K, V> {
    inner: vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoValues<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoValues<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let mut map = OrderedMap::new();
        map.put("a", 1);
        map.put("b", 2);

        assert_eq!(map.get(&"a"), Some(&1));
        assert_eq!(map.get(&"b"), Some(&2));
        assert_eq!(map.get(&"c"), None);
        assert!(map.contains_key(&"a"));
        assert!(!map.contains_key(&"c"));
    }

    #[test]
    fn upsert_keeps_first_position() {
        let mut map = OrderedMap::new();
        map.put("a", 1);
        map.put("b", 2);
        map.put("c", 3);
        map.put("a", 10);

        assert_eq!(map.len(), 3);
        let values: Vec<_> = map.values().copied().collect();
        assert_eq!(values, vec![10, 2, 3]);
    }

    #[test]
    fn iterates_in_insertion_order() {
        let map: OrderedMap<_, _> = [("z", 1), ("a", 2), ("m", 3)].into_iter().collect();

        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        let owned: Vec<_> = map.into_values().collect();
        assert_eq!(owned, vec![1, 2, 3]);
    }

    #[test]
    fn collect_folds_duplicate_keys() {
        let map: OrderedMap<_, _> = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"a"), Some(&3));
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn with_capacity_starts_empty() {
        let mut map = OrderedMap::with_capacity(8);
        assert!(map.is_empty());

        map.put("x", 1);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn empty_map() {
        let map: OrderedMap<String, i64> = OrderedMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.values().next(), None);
    }
}
