use crate::comparator::RawComparator;
use crate::layout::Layout;
use crate::red_black_tree::tree::{Location, Tree};
use crate::red_black_tree::Error;
use std::ops::Range;

/// The cached layout of a node's packed payload block: key bytes first, value bytes after,
/// each at an offset honoring its declared alignment, with the total padded to the block
/// alignment.
#[derive(Clone, Copy, Debug)]
struct NodeLayout {
    size: usize,
    key_offset: usize,
    key_size: usize,
    value_offset: usize,
    value_size: usize,
}

impl NodeLayout {
    fn new(key_layout: Layout, value_layout: Layout) -> Self {
        let mut layout = Layout::empty();
        let key_offset = layout.extend(key_layout);
        let value_offset = layout.extend(value_layout);
        let size = layout.pad_to_align();

        NodeLayout {
            size,
            key_offset,
            key_size: key_layout.size(),
            value_offset,
            value_size: value_layout.size(),
        }
    }

    fn key_range(&self) -> Range<usize> {
        self.key_offset..self.key_offset + self.key_size
    }

    fn value_range(&self) -> Range<usize> {
        self.value_offset..self.value_offset + self.value_size
    }
}

/// An ordered map over type-erased keys and values.
///
/// `RawMap` serves callers that only know their element types at run time: keys and values
/// are opaque byte blocks whose sizes and alignments are declared once at construction, and
/// ordering comes from a [`RawComparator`] that decodes keys out of their stored bytes. Each
/// entry is kept in a single packed block, key bytes then value bytes, at offsets computed by
/// the layout helper. Both containers in this module share one tree implementation, so the
/// erased map has exactly the typed map's balancing behavior.
///
/// Keys and values are stored and returned as bit copies; every key or value passed in must
/// match the declared layout's size.
///
/// # Examples
///
/// ```
/// use ordered_collections::comparator;
/// use ordered_collections::layout::Layout;
/// use ordered_collections::red_black_tree::RawMap;
///
/// let mut map = RawMap::new(Layout::of::<i32>(), Layout::of::<i32>(), comparator::i32_order);
///
/// map.insert(&1i32.to_ne_bytes(), &(-1i32).to_ne_bytes()).unwrap();
/// assert_eq!(map.get(&1i32.to_ne_bytes()), Some(&(-1i32).to_ne_bytes()[..]));
/// assert_eq!(map.get(&2i32.to_ne_bytes()), None);
/// ```
pub struct RawMap {
    tree: Tree<Box<[u8]>>,
    len: usize,
    compare: RawComparator,
    layout: NodeLayout,
}

impl RawMap {
    /// Constructs a new, empty `RawMap` for keys and values of the given layouts, ordered by
    /// a comparison function over stored key bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::comparator;
    /// use ordered_collections::layout::Layout;
    /// use ordered_collections::red_black_tree::RawMap;
    ///
    /// let map = RawMap::new(Layout::of::<u64>(), Layout::of::<u8>(), comparator::u64_order);
    /// assert!(map.is_empty());
    /// ```
    pub fn new(key_layout: Layout, value_layout: Layout, compare: RawComparator) -> Self {
        RawMap {
            tree: Tree::new(),
            len: 0,
            compare,
            layout: NodeLayout::new(key_layout, value_layout),
        }
    }

    /// Inserts a key-value pair, bit-copying both into the map. If the key already exists,
    /// only the stored value bytes are overwritten. Reports allocation failure on the
    /// new-node path, leaving the map unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `key` or `value` does not match the declared layout's size.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::comparator;
    /// use ordered_collections::layout::Layout;
    /// use ordered_collections::red_black_tree::RawMap;
    ///
    /// let mut map = RawMap::new(Layout::of::<i32>(), Layout::of::<i32>(), comparator::i32_order);
    /// map.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
    /// map.insert(&1i32.to_ne_bytes(), &20i32.to_ne_bytes()).unwrap();
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get(&1i32.to_ne_bytes()), Some(&20i32.to_ne_bytes()[..]));
    /// ```
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        assert_eq!(key.len(), self.layout.key_size, "key size mismatch");
        assert_eq!(value.len(), self.layout.value_size, "value size mismatch");

        let RawMap {
            ref mut tree,
            ref mut len,
            compare,
            layout,
        } = *self;

        match tree.locate(|block| compare(key, &block[layout.key_range()])) {
            Location::Occupied(node) => {
                tree.payload_mut(node)[layout.value_range()].copy_from_slice(value);
                Ok(())
            }
            Location::Vacant { parent, direction } => {
                let mut block = vec![0; layout.size];
                block[layout.key_range()].copy_from_slice(key);
                block[layout.value_range()].copy_from_slice(value);
                tree.insert_at(parent, direction, block.into_boxed_slice())?;
                *len += 1;
                Ok(())
            }
        }
    }

    /// Removes a key and its value from the map. Returns `true` if the key was present and
    /// `false` if the map is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not match the declared layout's size.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::comparator;
    /// use ordered_collections::layout::Layout;
    /// use ordered_collections::red_black_tree::RawMap;
    ///
    /// let mut map = RawMap::new(Layout::of::<i32>(), Layout::of::<i32>(), comparator::i32_order);
    /// map.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
    /// assert!(map.remove(&1i32.to_ne_bytes()));
    /// assert!(!map.remove(&1i32.to_ne_bytes()));
    /// ```
    pub fn remove(&mut self, key: &[u8]) -> bool {
        assert_eq!(key.len(), self.layout.key_size, "key size mismatch");

        let RawMap {
            ref mut tree,
            ref mut len,
            compare,
            layout,
        } = *self;

        match tree.find(|block| compare(key, &block[layout.key_range()])) {
            Some(node) => {
                tree.remove_at(node);
                *len -= 1;
                true
            }
            None => false,
        }
    }

    /// Returns the stored value bytes for a key, or `None` if the key is absent.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not match the declared layout's size.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        assert_eq!(key.len(), self.layout.key_size, "key size mismatch");

        let node = self
            .tree
            .find(|block| (self.compare)(key, &block[self.layout.key_range()]))?;
        Some(&self.tree.payload(node)[self.layout.value_range()])
    }

    /// Returns the stored value bytes for a key mutably, or `None` if the key is absent.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not match the declared layout's size.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::comparator;
    /// use ordered_collections::layout::Layout;
    /// use ordered_collections::red_black_tree::RawMap;
    ///
    /// let mut map = RawMap::new(Layout::of::<i32>(), Layout::of::<i32>(), comparator::i32_order);
    /// map.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
    /// map.get_mut(&1i32.to_ne_bytes()).unwrap().copy_from_slice(&30i32.to_ne_bytes());
    /// assert_eq!(map.get(&1i32.to_ne_bytes()), Some(&30i32.to_ne_bytes()[..]));
    /// ```
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut [u8]> {
        assert_eq!(key.len(), self.layout.key_size, "key size mismatch");

        let RawMap {
            ref mut tree,
            compare,
            layout,
            ..
        } = *self;

        let node = tree.find(|block| compare(key, &block[layout.key_range()]))?;
        Some(&mut tree.payload_mut(node)[layout.value_range()])
    }

    /// Checks if a key exists in the map.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the map, removing all entries.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.len = 0;
    }

    /// Copies the map into a new, independent map holding bit copies of every entry.
    /// Reports allocation failure, in which case everything allocated so far is released
    /// and the source map is untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_collections::comparator;
    /// use ordered_collections::layout::Layout;
    /// use ordered_collections::red_black_tree::RawMap;
    ///
    /// let mut map = RawMap::new(Layout::of::<i32>(), Layout::of::<i32>(), comparator::i32_order);
    /// map.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
    ///
    /// let mut copy = map.try_clone().unwrap();
    /// copy.remove(&1i32.to_ne_bytes());
    ///
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(copy.len(), 0);
    /// ```
    pub fn try_clone(&self) -> Result<Self, Error> {
        Ok(RawMap {
            tree: self.tree.try_clone()?,
            len: self.len,
            compare: self.compare,
            layout: self.layout,
        })
    }

    /// Validates the internal invariants of the map, as
    /// [`RedBlackMap::check`](struct.RedBlackMap.html#method.check).
    pub fn check(&self) -> Result<(), Error> {
        let RawMap {
            ref tree,
            len,
            compare,
            layout,
        } = *self;

        tree.check(len, |x, y| {
            compare(&x[layout.key_range()], &y[layout.key_range()])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RawMap;
    use crate::comparator;
    use crate::layout::Layout;

    fn i32_map() -> RawMap {
        RawMap::new(Layout::of::<i32>(), Layout::of::<i32>(), comparator::i32_order)
    }

    #[test]
    fn test_len_empty() {
        let map = i32_map();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = i32_map();
        for key in -16i32..16 {
            map.insert(&key.to_ne_bytes(), &(-key).to_ne_bytes()).unwrap();
            map.check().unwrap();
        }

        assert_eq!(map.len(), 32);
        for key in -16i32..16 {
            assert_eq!(map.get(&key.to_ne_bytes()), Some(&(-key).to_ne_bytes()[..]));
        }
        assert_eq!(map.get(&99i32.to_ne_bytes()), None);
    }

    #[test]
    fn test_insert_overwrites_value_bytes() {
        let mut map = i32_map();
        map.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
        map.insert(&1i32.to_ne_bytes(), &20i32.to_ne_bytes()).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1i32.to_ne_bytes()), Some(&20i32.to_ne_bytes()[..]));
    }

    #[test]
    fn test_remove() {
        let mut map = i32_map();
        for key in 0i32..64 {
            map.insert(&key.to_ne_bytes(), &key.to_ne_bytes()).unwrap();
        }

        for key in 0i32..64 {
            assert!(map.remove(&key.to_ne_bytes()));
            assert!(!map.remove(&key.to_ne_bytes()));
            map.check().unwrap();
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_get_mut() {
        let mut map = i32_map();
        map.insert(&1i32.to_ne_bytes(), &10i32.to_ne_bytes()).unwrap();
        map.get_mut(&1i32.to_ne_bytes())
            .unwrap()
            .copy_from_slice(&30i32.to_ne_bytes());
        assert_eq!(map.get(&1i32.to_ne_bytes()), Some(&30i32.to_ne_bytes()[..]));
    }

    #[test]
    fn test_clear() {
        let mut map = i32_map();
        for key in 0i32..32 {
            map.insert(&key.to_ne_bytes(), &key.to_ne_bytes()).unwrap();
        }

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get(&1i32.to_ne_bytes()), None);
        map.check().unwrap();
    }

    #[test]
    fn test_try_clone_is_independent() {
        let mut map = i32_map();
        for key in 0i32..32 {
            map.insert(&key.to_ne_bytes(), &(-key).to_ne_bytes()).unwrap();
        }

        let mut copy = map.try_clone().unwrap();
        copy.check().unwrap();
        assert!(copy.remove(&1i32.to_ne_bytes()));

        assert_eq!(map.len(), 32);
        assert_eq!(copy.len(), 31);
        assert_eq!(map.get(&1i32.to_ne_bytes()), Some(&(-1i32).to_ne_bytes()[..]));
        assert_eq!(copy.get(&1i32.to_ne_bytes()), None);
    }

    #[test]
    fn test_string_keys() {
        let mut map = RawMap::new(
            Layout::new(8, 1),
            Layout::of::<u32>(),
            comparator::string_order,
        );

        map.insert(b"bravo\0\0\0", &2u32.to_ne_bytes()).unwrap();
        map.insert(b"alpha\0\0\0", &1u32.to_ne_bytes()).unwrap();
        map.insert(b"charlie\0", &3u32.to_ne_bytes()).unwrap();
        map.check().unwrap();

        assert_eq!(map.get(b"alpha\0\0\0"), Some(&1u32.to_ne_bytes()[..]));
        // bytes past the terminator do not take part in comparisons
        assert_eq!(map.get(&b"bravo\0zz\0"[..8]), Some(&2u32.to_ne_bytes()[..]));
        assert_eq!(map.get(b"delta\0\0\0"), None);
    }

    #[test]
    #[should_panic]
    fn test_key_size_mismatch() {
        let mut map = i32_map();
        map.insert(&[1, 2], &3i32.to_ne_bytes()).unwrap();
    }

    #[test]
    fn test_padded_value_layout() {
        // a one-byte value after an eight-byte key, block padded to the key alignment
        let mut map = RawMap::new(
            Layout::of::<u64>(),
            Layout::of::<u8>(),
            comparator::u64_order,
        );

        map.insert(&7u64.to_ne_bytes(), &[42]).unwrap();
        assert_eq!(map.get(&7u64.to_ne_bytes()), Some(&[42u8][..]));
    }
}
