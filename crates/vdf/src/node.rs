//! The tree shape shared by the text and binary codecs.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A leaf value.
///
/// The text format only ever yields [`Scalar::String`]; the binary format
/// carries a type tag per entry and maps onto every variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Int32(i32),
    Float32(f32),
    /// Pointer-sized integer, stored as 32 bits on disk.
    Pointer(u32),
    WideString(String),
    /// Packed RGBA color.
    Color(u32),
    UInt64(u64),
    Int64(i64),
}

impl Scalar {
    /// Returns true for the integer and float kinds.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::String(_) | Scalar::WideString(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) | Scalar::WideString(s) => f.write_str(s),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v}"),
            Scalar::Pointer(v) | Scalar::Color(v) => write!(f, "{v}"),
            Scalar::UInt64(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
        }
    }
}

/// A parsed value: a leaf, a nested section, or a materialized sequence.
///
/// `List` never comes out of the text or appinfo decoders. The shortcuts
/// decoder produces it for sub-sections keyed "0", "1", ... so that the
/// numeric-key emulation does not leak into consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Scalar(Scalar),
    Section(Section),
    List(Vec<Node>),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Node::Section(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the text of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s) | Scalar::WideString(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns an integer value, parsing string scalars as the text format
    /// stores numbers as strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()? {
            Scalar::String(s) | Scalar::WideString(s) => s.trim().parse().ok(),
            Scalar::Int32(v) => Some(i64::from(*v)),
            Scalar::Pointer(v) | Scalar::Color(v) => Some(i64::from(*v)),
            Scalar::UInt64(v) => i64::try_from(*v).ok(),
            Scalar::Int64(v) => Some(*v),
            Scalar::Float32(_) => None,
        }
    }

    /// Unsigned counterpart of [`Node::as_i64`].
    pub fn as_u64(&self) -> Option<u64> {
        match self.as_scalar()? {
            Scalar::String(s) | Scalar::WideString(s) => s.trim().parse().ok(),
            Scalar::UInt64(v) => Some(*v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl From<Section> for Node {
    fn from(s: Section) -> Self {
        Node::Section(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

/// Ordered key -> [`Node`] map. Keys are unique; insertion order is kept.
#[derive(Debug, Clone, Default)]
pub struct Section {
    entries: IndexMap<String, Node>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a value. An existing key is overwritten in place and keeps its
    /// original position; the previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    /// Looks a key up ignoring ASCII case. An exact match wins.
    pub fn get_ci(&self, key: &str) -> Option<&Node> {
        self.entries.get(key).or_else(|| {
            self.entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Walks nested sections with exact key matches.
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        self.walk(path, Section::get)
    }

    /// Walks nested sections ignoring ASCII case at every level.
    pub fn get_path_ci(&self, path: &[&str]) -> Option<&Node> {
        self.walk(path, Section::get_ci)
    }

    fn walk<'a>(
        &'a self,
        path: &[&str],
        lookup: impl Fn(&'a Section, &str) -> Option<&'a Node>,
    ) -> Option<&'a Node> {
        let (last, parents) = path.split_last()?;
        let mut section = self;
        for &key in parents {
            section = lookup(section, key)?.as_section()?;
        }
        lookup(section, *last)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }

    pub fn get_section(&self, key: &str) -> Option<&Section> {
        self.get(key).and_then(Node::as_section)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Node> {
        self.entries.values()
    }

    /// Returns true when the keys are exactly "0", "1", ..., "n-1" in order.
    /// An empty section does not qualify.
    pub fn is_sequence(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .keys()
                .enumerate()
                .all(|(i, k)| *k == i.to_string())
    }

    /// Returns the values in order if the section emulates an array.
    pub fn as_sequence(&self) -> Option<Vec<&Node>> {
        self.is_sequence().then(|| self.entries.values().collect())
    }

    /// Consuming form of [`Section::as_sequence`]; hands the section back
    /// unchanged when it is not array-shaped.
    pub fn into_sequence(self) -> Result<Vec<Node>, Section> {
        if self.is_sequence() {
            Ok(self.entries.into_values().collect())
        } else {
            Err(self)
        }
    }
}

// Order is part of a section's identity; `IndexMap`'s own equality is not
// order-sensitive.
impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (k, v) in iter {
            section.insert(k, v);
        }
        section
    }
}

impl IntoIterator for Section {
    type Item = (String, Node);
    type IntoIter = indexmap::map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
