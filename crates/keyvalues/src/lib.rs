//! # KeyValues - in-memory appinfo content trees
//!
//! The decoded form of one application's metadata: a recursive map from
//! string keys to typed values. Keys keep their insertion order because the
//! binary encoding, the text rendering and both checksums all depend on it.
//!
//! ```rust
//! use keyvalues::{ContentTree, Value};
//!
//! let mut tree = ContentTree::new();
//! tree.set_path(&["appinfo", "common", "name"], Value::from("Half-Life"));
//! assert_eq!(
//!     tree.get_path(&["appinfo", "common", "name"]).and_then(Value::as_str),
//!     Some("Half-Life")
//! );
//! ```

mod string;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub use string::{Encoding, VdfString};

/// A value stored under a key of a [`ContentTree`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ValueRepr")]
pub enum Value {
    Dict(ContentTree),
    Str(VdfString),
    Int32(i32),
    /// 8-byte integer (tag `0x07`).
    Int64(u64),
}

impl Value {
    pub fn as_dict(&self) -> Option<&ContentTree> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut ContentTree> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(VdfString::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(VdfString::new(s))
    }
}

impl From<VdfString> for Value {
    fn from(s: VdfString) -> Self {
        Value::Str(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<ContentTree> for Value {
    fn from(tree: ContentTree) -> Self {
        Value::Dict(tree)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Dict(d) => d.serialize(serializer),
            Value::Str(s) => s.serialize(serializer),
            // same unsigned reading as the text rendering
            Value::Int32(n) => serializer.serialize_u32(*n as u32),
            Value::Int64(n) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$int64", n)?;
                map.end()
            }
        }
    }
}

/// JSON shape of a [`Value`]; 8-byte integers are wrapped so they do not
/// come back as 4-byte ones. 4-byte integers are accepted in both their
/// unsigned and signed readings.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Str(VdfString),
    UInt32(u32),
    Int32(i32),
    Int64 {
        #[serde(rename = "$int64")]
        int64: u64,
    },
    Dict(ContentTree),
}

impl From<ValueRepr> for Value {
    fn from(repr: ValueRepr) -> Self {
        match repr {
            ValueRepr::Str(s) => Value::Str(s),
            ValueRepr::UInt32(n) => Value::Int32(n as i32),
            ValueRepr::Int32(n) => Value::Int32(n),
            ValueRepr::Int64 { int64 } => Value::Int64(int64),
            ValueRepr::Dict(d) => Value::Dict(d),
        }
    }
}

/// Insertion-ordered mapping from keys to [`Value`]s.
///
/// Inserting an existing key replaces its value in place (the key keeps its
/// original position), so duplicate keys in a source resolve to the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTree {
    entries: IndexMap<VdfString, Value>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<VdfString>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes `key`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&VdfString, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &VdfString> {
        self.entries.keys()
    }

    /// Follows `path` through nested dicts.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut node = self;
        for key in parents {
            node = node.get(key)?.as_dict()?;
        }
        node.get(last)
    }

    pub fn get_path_mut(&mut self, path: &[&str]) -> Option<&mut Value> {
        let (last, parents) = path.split_last()?;
        let mut node = self;
        for key in parents {
            node = node.get_mut(key)?.as_dict_mut()?;
        }
        node.get_mut(last)
    }

    /// Returns the dict under `key`, creating an empty one if the key is
    /// missing or holds a non-dict value.
    pub fn dict_entry(&mut self, key: &str) -> &mut ContentTree {
        let slot = self
            .entries
            .entry(VdfString::new(key))
            .or_insert_with(|| Value::Dict(ContentTree::new()));
        if !matches!(slot, Value::Dict(_)) {
            *slot = Value::Dict(ContentTree::new());
        }
        match slot {
            Value::Dict(d) => d,
            _ => unreachable!("slot was just made a dict"),
        }
    }

    /// Stores `value` at `path`, creating intermediate dicts as needed.
    ///
    /// Returns the previous value. An empty path is a no-op.
    pub fn set_path(&mut self, path: &[&str], value: impl Into<Value>) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut node = self;
        for key in parents {
            node = node.dict_entry(key);
        }
        node.insert(*last, value)
    }
}

impl<K: Into<VdfString>, V: Into<Value>> FromIterator<(K, V)> for ContentTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = ContentTree::new();
        for (k, v) in iter {
            tree.insert(k, v);
        }
        tree
    }
}

impl<'a> IntoIterator for &'a ContentTree {
    type Item = (&'a VdfString, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, VdfString, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
