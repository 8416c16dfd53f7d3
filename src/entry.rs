/// A key-value pair stored as the payload of a tree node.
///
/// `Entry` carries no ordering of its own: all key comparisons go through the comparator the
/// owning map was constructed with.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Entry<T, U> {
    pub key: T,
    pub value: U,
}
