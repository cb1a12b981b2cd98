//! The object model: a closed set of PDF node variants.
//!
//! Containers never embed their children. A dictionary maps names to
//! [`NodeId`] handles and an array is a sequence of handles, both resolved
//! against the arena of the document that owns the container. This keeps
//! node identity explicit, which is what lets the copier tell a shared
//! instance apart from two structurally equal ones.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::{NodeId, ObjectId};

/// A PDF name (`/Type`, `/Font`, ...), stored without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name(String);

impl Name {
    /// Create a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name text without the slash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// How a string was written in the source syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StringFormat {
    /// `(...)` literal string.
    #[default]
    Literal,
    /// `<...>` hexadecimal string.
    Hexadecimal,
}

/// A PDF string: raw bytes plus the form it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PdfString {
    /// Decoded bytes.
    pub bytes: Vec<u8>,
    /// Literal or hexadecimal.
    pub format: StringFormat,
}

impl PdfString {
    /// Create a literal string.
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into(), format: StringFormat::Literal }
    }

    /// Create a hexadecimal string.
    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into(), format: StringFormat::Hexadecimal }
    }

    /// Byte content.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Ordered mapping from names to child nodes. Keys are unique; replacing a
/// key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    entries: IndexMap<Name, NodeId>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the child stored under `key`.
    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    /// Insert or replace an entry.
    pub fn set(&mut self, key: impl Into<Name>, value: NodeId) {
        self.entries.insert(key.into(), value);
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<NodeId> {
        self.entries.shift_remove(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Name, NodeId)> + ExactSizeIterator {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::borrow::Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromIterator<(Name, NodeId)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Name, NodeId)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// A stream: a dictionary plus an opaque payload that is never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream dictionary (`/Length`, `/Filter`, ...).
    pub dict: Dictionary,
    /// Raw, still-encoded payload bytes.
    pub content: Vec<u8>,
}

impl Stream {
    /// Create a stream.
    pub fn new(dict: Dictionary, content: impl Into<Vec<u8>>) -> Self {
        Self { dict, content: content.into() }
    }
}

/// A node in a document's object graph.
///
/// Variant order mirrors the order in which the copier dispatches:
/// [`Object::Page`] must be tried before [`Object::Dictionary`] and
/// [`Object::Invalid`] before the other scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    /// Page leaf: a dictionary whose attributes may be inherited along `/Parent`.
    Page(Dictionary),
    /// Dictionary.
    Dictionary(Dictionary),
    /// Array.
    Array(Vec<NodeId>),
    /// Stream.
    Stream(Stream),
    /// Indirect reference.
    Reference(ObjectId),
    /// Unparseable raw data, preserved verbatim.
    Invalid(Vec<u8>),
    /// Name.
    Name(Name),
    /// String.
    String(PdfString),
    /// Integer number.
    Integer(i64),
    /// Real number.
    Real(f64),
    /// Boolean.
    Boolean(bool),
    /// Null.
    Null,
}

/// Variant category of an [`Object`], used for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Page leaf.
    Page,
    /// Dictionary.
    Dictionary,
    /// Array.
    Array,
    /// Stream.
    Stream,
    /// Indirect reference.
    Reference,
    /// Opaque payload.
    Invalid,
    /// Name.
    Name,
    /// String.
    String,
    /// Integer.
    Integer,
    /// Real.
    Real,
    /// Boolean.
    Boolean,
    /// Null.
    Null,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Page => "page",
            Self::Dictionary => "dictionary",
            Self::Array => "array",
            Self::Stream => "stream",
            Self::Reference => "reference",
            Self::Invalid => "invalid",
            Self::Name => "name",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Null => "null",
        };
        f.write_str(s)
    }
}

impl Object {
    /// Shorthand for a name object.
    pub fn name(name: &str) -> Self {
        Self::Name(Name::new(name))
    }

    /// Shorthand for a literal string object.
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::String(PdfString::literal(bytes))
    }

    /// Variant category.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Page(_) => ObjectKind::Page,
            Self::Dictionary(_) => ObjectKind::Dictionary,
            Self::Array(_) => ObjectKind::Array,
            Self::Stream(_) => ObjectKind::Stream,
            Self::Reference(_) => ObjectKind::Reference,
            Self::Invalid(_) => ObjectKind::Invalid,
            Self::Name(_) => ObjectKind::Name,
            Self::String(_) => ObjectKind::String,
            Self::Integer(_) => ObjectKind::Integer,
            Self::Real(_) => ObjectKind::Real,
            Self::Boolean(_) => ObjectKind::Boolean,
            Self::Null => ObjectKind::Null,
        }
    }

    /// Whether this node owns child handles.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Page(_) | Self::Dictionary(_) | Self::Array(_) | Self::Stream(_)
        )
    }

    /// Clone without following any child handle.
    ///
    /// Scalars come back whole. Containers come back empty, since their child
    /// handles belong to the source arena; a stream keeps its payload bytes.
    pub fn shallow_clone(&self) -> Self {
        match self {
            Self::Page(_) => Self::Page(Dictionary::new()),
            Self::Dictionary(_) => Self::Dictionary(Dictionary::new()),
            Self::Array(items) => Self::Array(Vec::with_capacity(items.len())),
            Self::Stream(stream) => Self::Stream(Stream::new(Dictionary::new(), stream.content.clone())),
            other => other.clone(),
        }
    }

    /// Dictionary view of a dictionary or page node.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(dict) | Self::Page(dict) => Some(dict),
            _ => None,
        }
    }

    /// Mutable dictionary view, including a stream's dictionary part.
    pub fn dict_part_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Self::Dictionary(dict) | Self::Page(dict) => Some(dict),
            Self::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        }
    }

    /// Name value, if this is a name.
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    /// String value, if this is a string.
    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Referenced id, if this is a reference.
    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Self::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Array items, if this is an array.
    pub fn as_array(&self) -> Option<&[NodeId]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<ObjectId> for Object {
    fn from(value: ObjectId) -> Self {
        Self::Reference(value)
    }
}

impl From<Name> for Object {
    fn from(value: Name) -> Self {
        Self::Name(value)
    }
}

impl From<PdfString> for Object {
    fn from(value: PdfString) -> Self {
        Self::String(value)
    }
}
