use crate::comparator::{Comparator, OrdComparator};
use crate::entry::Entry;
use crate::red_black_tree::tree::{Location, Tree};
use crate::red_black_tree::Error;
use serde::de::{Deserialize, Deserializer, Error as DeError, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};

/// An ordered map implemented with a 2-3 red-black tree.
///
/// Keys are ordered by the map's comparator: the natural `Ord` ordering by default, or any
/// [`Comparator`] capability supplied at construction. Keys and values are owned by the map.
/// Inserting an existing key overwrites the stored value and keeps the stored key; lookup,
/// insertion, and removal run in O(log n) worst case.
///
/// References returned by lookups follow the usual borrowing rules, so they cannot outlive a
/// later structural mutation of the map.
///
/// # Examples
///
/// ```
/// use ordered_collections::red_black_tree::RedBlackMap;
///
/// let mut map = RedBlackMap::new();
/// map.insert(0, 1).unwrap();
/// map.insert(3, 4).unwrap();
///
/// assert_eq!(map[&0], 1);
/// assert_eq!(map.get(&1), None);
/// assert_eq!(map.len(), 2);
///
/// map[&0] = 2;
/// assert_eq!(map.remove(&0), Some((0, 2)));
/// assert_eq!(map.remove(&1), None);
/// ```
pub struct RedBlackMap<T, U, C = OrdComparator> {
    tree: Tree<Entry<T, U>>,
    len: usize,
    comparator: C,
}

impl<T, U> RedBlackMap<T, U>
where
    T: Ord,
{
    /// Constructs a new, empty `RedBlackMap<T, U>` ordered by the keys' natural ordering.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<u32, u32> = RedBlackMap::new();
    /// ```
    pub fn new() -> Self {
        RedBlackMap::with_comparator(OrdComparator)
    }
}

impl<T, U, C> RedBlackMap<T, U, C> {
    /// Constructs a new, empty `RedBlackMap<T, U, C>` ordered by a comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::comparator::FloatComparator;
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::with_comparator(FloatComparator);
    /// map.insert(-0.0, 1).unwrap();
    /// map.insert(0.0, 2).unwrap();
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn with_comparator(comparator: C) -> Self {
        RedBlackMap {
            tree: Tree::new(),
            len: 0,
            comparator,
        }
    }

    /// Inserts a key-value pair into the map. If the key already exists, the stored value is
    /// overwritten and returned; the stored key is kept. Reports allocation failure on the
    /// new-node path, leaving the map unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// assert_eq!(map.insert(1, 1).unwrap(), None);
    /// assert_eq!(map.insert(1, 2).unwrap(), Some(1));
    /// assert_eq!(map.get(&1), Some(&2));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: T, value: U) -> Result<Option<U>, Error>
    where
        C: Comparator<T>,
    {
        let RedBlackMap {
            ref mut tree,
            ref mut len,
            ref comparator,
        } = *self;

        match tree.locate(|entry| comparator.compare(&key, &entry.key)) {
            Location::Occupied(node) => {
                Ok(Some(mem::replace(&mut tree.payload_mut(node).value, value)))
            }
            Location::Vacant { parent, direction } => {
                tree.insert_at(parent, direction, Entry { key, value })?;
                *len += 1;
                Ok(None)
            }
        }
    }

    /// Removes a key from the map, returning the stored key-value pair, or `None` if the key
    /// was absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert_eq!(map.remove(&1), Some((1, 1)));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &T) -> Option<(T, U)>
    where
        C: Comparator<T>,
    {
        let RedBlackMap {
            ref mut tree,
            ref mut len,
            ref comparator,
        } = *self;

        let node = tree.find(|entry| comparator.compare(key, &entry.key))?;
        let Entry { key, value } = tree.remove_at(node);
        *len -= 1;
        Some((key, value))
    }

    /// Returns an immutable reference to the value associated with a key, or `None` if the
    /// key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert_eq!(map.get(&0), None);
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    pub fn get(&self, key: &T) -> Option<&U>
    where
        C: Comparator<T>,
    {
        let node = self
            .tree
            .find(|entry| self.comparator.compare(key, &entry.key))?;
        Some(&self.tree.payload(node).value)
    }

    /// Returns a mutable reference to the value associated with a key, or `None` if the key
    /// is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// *map.get_mut(&1).unwrap() = 2;
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn get_mut(&mut self, key: &T) -> Option<&mut U>
    where
        C: Comparator<T>,
    {
        let RedBlackMap {
            ref mut tree,
            ref comparator,
            ..
        } = *self;

        let node = tree.find(|entry| comparator.compare(key, &entry.key))?;
        Some(&mut tree.payload_mut(node).value)
    }

    /// Checks if a key exists in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert!(!map.contains_key(&0));
    /// assert!(map.contains_key(&1));
    /// ```
    pub fn contains_key(&self, key: &T) -> bool
    where
        C: Comparator<T>,
    {
        self.get(key).is_some()
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<u32, u32> = RedBlackMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the map, removing all entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// map.insert(2, 2).unwrap();
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.tree.clear();
        self.len = 0;
    }

    /// Copies the map into a new, independent map holding the same entries. Reports
    /// allocation failure, in which case everything allocated so far is released and the
    /// source map is untouched.
    ///
    /// A `Clone` implementation is deliberately not provided: copying allocates one node per
    /// entry and this operation reports failure instead of aborting.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    ///
    /// let mut copy = map.try_clone().unwrap();
    /// copy.insert(1, 2).unwrap();
    ///
    /// assert_eq!(map.get(&1), Some(&1));
    /// assert_eq!(copy.get(&1), Some(&2));
    /// ```
    pub fn try_clone(&self) -> Result<Self, Error>
    where
        T: Clone,
        U: Clone,
        C: Clone,
    {
        Ok(RedBlackMap {
            tree: self.tree.try_clone()?,
            len: self.len,
            comparator: self.comparator.clone(),
        })
    }

    /// Validates the internal invariants of the map: parent/child link symmetry, the red
    /// rules of 2-3 red-black trees, equal black depth on every path, a black root, strictly
    /// increasing unique keys, and an accurate entry count.
    ///
    /// This is a diagnostic hook: a violation means the container implementation has a bug.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1).unwrap();
    /// map.check().unwrap();
    /// ```
    pub fn check(&self) -> Result<(), Error>
    where
        C: Comparator<T>,
    {
        let RedBlackMap {
            ref tree,
            len,
            ref comparator,
        } = *self;

        tree.check(len, |x, y| comparator.compare(&x.key, &y.key))
    }

    #[cfg(test)]
    fn keys_in_order(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut keys = Vec::new();
        self.tree.in_order(|entry| keys.push(entry.key.clone()));
        keys
    }
}

impl<T, U> Default for RedBlackMap<T, U>
where
    T: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T, U, C> Index<&'a T> for RedBlackMap<T, U, C>
where
    C: Comparator<T>,
{
    type Output = U;

    fn index(&self, key: &T) -> &Self::Output {
        self.get(key).expect("key does not exist")
    }
}

impl<'a, T, U, C> IndexMut<&'a T> for RedBlackMap<T, U, C>
where
    C: Comparator<T>,
{
    fn index_mut(&mut self, key: &T) -> &mut Self::Output {
        self.get_mut(key).expect("key does not exist")
    }
}

impl<T, U, C> Serialize for RedBlackMap<T, U, C>
where
    T: Serialize,
    U: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries = Vec::with_capacity(self.len);
        self.tree.in_order(|entry| entries.push(entry));

        let mut state = serializer.serialize_map(Some(self.len))?;
        for entry in entries {
            state.serialize_entry(&entry.key, &entry.value)?;
        }
        state.end()
    }
}

impl<'de, T, U, C> Deserialize<'de> for RedBlackMap<T, U, C>
where
    T: Deserialize<'de>,
    U: Deserialize<'de>,
    C: Comparator<T> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapVisitor<T, U, C> {
            marker: PhantomData<RedBlackMap<T, U, C>>,
        }

        impl<'de, T, U, C> Visitor<'de> for MapVisitor<T, U, C>
        where
            T: Deserialize<'de>,
            U: Deserialize<'de>,
            C: Comparator<T> + Default,
        {
            type Value = RedBlackMap<T, U, C>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = RedBlackMap::with_comparator(C::default());
                while let Some((key, value)) = access.next_entry()? {
                    map.insert(key, value).map_err(A::Error::custom)?;
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor {
            marker: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RedBlackMap;
    use crate::comparator::FloatComparator;
    use std::f64;

    #[test]
    fn test_len_empty() {
        let map: RedBlackMap<u32, u32> = RedBlackMap::new();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_is_empty() {
        let map: RedBlackMap<u32, u32> = RedBlackMap::new();
        assert!(map.is_empty());
    }

    #[test]
    fn test_insert() {
        let mut map = RedBlackMap::new();
        assert_eq!(map.insert(1, 1).unwrap(), None);
        assert!(map.contains_key(&1));
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_insert_replaces_value_only() {
        let mut map = RedBlackMap::new();
        assert_eq!(map.insert(1, 1).unwrap(), None);
        assert_eq!(map.insert(1, 3).unwrap(), Some(1));
        assert_eq!(map.get(&1), Some(&3));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut map = RedBlackMap::new();
        map.insert(1, 1).unwrap();
        assert_eq!(map.remove(&1), Some((1, 1)));
        assert!(!map.contains_key(&1));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut map = RedBlackMap::new();
        for key in 0..16 {
            map.insert(key, -key).unwrap();
        }

        assert_eq!(map.remove(&7), Some((7, -7)));
        map.check().unwrap();
        let len = map.len();
        let keys = map.keys_in_order();

        assert_eq!(map.remove(&7), None);
        map.check().unwrap();
        assert_eq!(map.len(), len);
        assert_eq!(map.keys_in_order(), keys);
    }

    #[test]
    fn test_digits_of_pi() {
        let mut map = RedBlackMap::new();
        for &key in &[3, 1, 4, 1, 5, 9, 2, 6] {
            map.insert(key, -key).unwrap();
        }

        assert_eq!(map.len(), 7);
        assert_eq!(map.get(&1), Some(&-1));
        assert_eq!(map.get(&7), None);
    }

    #[test]
    fn test_get_mut() {
        let mut map = RedBlackMap::new();
        map.insert(1, 1).unwrap();
        {
            let value = map.get_mut(&1);
            *value.unwrap() = 3;
        }
        assert_eq!(map.get(&1), Some(&3));
    }

    #[test]
    fn test_shuffled_insert_remove() {
        // multiplying by numbers coprime with 1024 yields two fixed shuffles
        let mut map = RedBlackMap::new();
        for i in 0..1024u32 {
            let key = (i * 389) % 1024;
            map.insert(key, key).unwrap();
            map.check().unwrap();
        }
        assert_eq!(map.len(), 1024);

        for i in 0..1024u32 {
            let key = (i * 653) % 1024;
            assert_eq!(map.remove(&key), Some((key, key)));
            map.check().unwrap();
        }
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_copy_independence() {
        let mut map = RedBlackMap::new();
        for key in 0..100 {
            map.insert(key, -key).unwrap();
        }

        let mut copy = map.try_clone().unwrap();
        copy.check().unwrap();
        for key in 0..100 {
            if key % 2 == 0 {
                assert_eq!(copy.remove(&key), Some((key, -key)));
            }
        }

        assert_eq!(map.len(), 100);
        assert_eq!(copy.len(), 50);
        assert_eq!(map.get(&2), Some(&-2));
        assert_eq!(copy.get(&2), None);
        map.check().unwrap();
        copy.check().unwrap();
    }

    #[test]
    fn test_clear() {
        let mut map = RedBlackMap::new();
        for key in 0..32 {
            map.insert(key, key).unwrap();
        }

        map.clear();
        assert_eq!(map.len(), 0);
        for key in 0..32 {
            assert_eq!(map.get(&key), None);
        }
        map.check().unwrap();

        map.insert(1, 1).unwrap();
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_float_keys_sort_totally() {
        let mut map = RedBlackMap::with_comparator(FloatComparator);
        for (index, &key) in [0.0, -0.0, f64::NAN, -f64::NAN, 1.0, -1.0].iter().enumerate() {
            map.insert(key, index).unwrap();
        }

        assert_eq!(map.len(), 6);
        map.check().unwrap();

        let keys = map.keys_in_order();
        assert!(keys[0].is_nan() && keys[0].is_sign_negative());
        assert_eq!(keys[1], -1.0);
        assert_eq!(keys[2].to_bits(), (-0.0f64).to_bits());
        assert_eq!(keys[3].to_bits(), 0.0f64.to_bits());
        assert_eq!(keys[4], 1.0);
        assert!(keys[5].is_nan() && !keys[5].is_sign_negative());

        assert_eq!(map.get(&-0.0), Some(&1));
        assert_eq!(map.get(&0.0), Some(&0));
        assert_eq!(map.get(&-f64::NAN), Some(&3));
    }

    #[test]
    fn test_index() {
        let mut map = RedBlackMap::new();
        map.insert(1, 1).unwrap();
        assert_eq!(map[&1], 1);
        map[&1] = 2;
        assert_eq!(map[&1], 2);
    }

    #[test]
    #[should_panic]
    fn test_index_absent_key() {
        let map: RedBlackMap<u32, u32> = RedBlackMap::new();
        let _ = map[&0];
    }

    #[test]
    fn test_serde_round_trip() {
        let mut map = RedBlackMap::new();
        for key in 0..32u32 {
            map.insert(key, key * 2).unwrap();
        }

        let bytes = bincode::serialize(&map).unwrap();
        let decoded: RedBlackMap<u32, u32> = bincode::deserialize(&bytes).unwrap();

        decoded.check().unwrap();
        assert_eq!(decoded.len(), 32);
        for key in 0..32u32 {
            assert_eq!(decoded.get(&key), Some(&(key * 2)));
        }
    }
}
