//! Identifier types for the object model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Indirect object reference: an object number plus a generation.
///
/// Names a slot in a document's indirect object table. Implements `Ord`
/// (number first, then generation) so tables iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    /// Object number.
    pub number: u32,
    /// Generation number.
    pub generation: u16,
}

impl ObjectId {
    /// Create a new reference.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

impl From<(u32, u16)> for ObjectId {
    fn from((number, generation): (u32, u16)) -> Self {
        Self::new(number, generation)
    }
}

/// Handle to a node in one document's arena.
///
/// Two nodes are the same instance iff their handles are equal. Handles are
/// only meaningful for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a handle from a raw arena index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
