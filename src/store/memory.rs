//! In-memory document context.

use std::collections::BTreeMap;

use crate::types::{Dictionary, Name, NodeId, Object, ObjectId, Stream};
use super::DocumentContext;

/// Error type for the in-memory context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Node handle was not issued by this document.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    /// Node is not a container of the requested shape.
    #[error("Node {0} is not a {1}")]
    NotAContainer(NodeId, &'static str),
    /// Every object number has been handed out.
    #[error("Object number space exhausted")]
    ReferenceSpaceExhausted,
}

/// In-memory document: a node arena plus an indirect object table.
///
/// The object table is a BTreeMap so iteration is ordered by object number.
#[derive(Debug, Clone)]
pub struct Document {
    /// Every node ever stored, indexed by [`NodeId`].
    nodes: Vec<Object>,
    /// Indirect object table.
    objects: BTreeMap<ObjectId, NodeId>,
    /// Next object number to hand out.
    next_number: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document. Object number 0 is reserved, as in a
    /// cross-reference table, so the first allocated reference is `1 0 R`.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            objects: BTreeMap::new(),
            next_number: 1,
        }
    }

    /// Store an object and return its handle.
    pub fn add(&mut self, object: impl Into<Object>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(object.into());
        id
    }

    /// Store a dictionary built from `entries`.
    pub fn add_dictionary<K, I>(&mut self, entries: I) -> NodeId
    where
        K: Into<Name>,
        I: IntoIterator<Item = (K, NodeId)>,
    {
        let dict: Dictionary = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.add(Object::Dictionary(dict))
    }

    /// Store a page leaf built from `entries`.
    pub fn add_page<K, I>(&mut self, entries: I) -> NodeId
    where
        K: Into<Name>,
        I: IntoIterator<Item = (K, NodeId)>,
    {
        let dict: Dictionary = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.add(Object::Page(dict))
    }

    /// Store an array.
    pub fn add_array(&mut self, items: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.add(Object::Array(items.into_iter().collect()))
    }

    /// Store a stream.
    pub fn add_stream<K, I>(&mut self, entries: I, content: impl Into<Vec<u8>>) -> NodeId
    where
        K: Into<Name>,
        I: IntoIterator<Item = (K, NodeId)>,
    {
        let dict: Dictionary = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.add(Object::Stream(Stream::new(dict, content)))
    }

    /// Store a reference node pointing at `reference`.
    pub fn add_reference(&mut self, reference: ObjectId) -> NodeId {
        self.add(Object::Reference(reference))
    }

    /// Store `node` as a new indirect object and return its reference.
    pub fn add_indirect(&mut self, node: NodeId) -> Result<ObjectId, DocumentError> {
        let reference = self.allocate_reference()?;
        self.assign(reference, node)?;
        Ok(reference)
    }

    /// Bind an explicit reference, keeping the allocator ahead of it.
    pub fn insert_indirect(&mut self, reference: ObjectId, node: NodeId) -> Result<(), DocumentError> {
        self.assign(reference, node)
    }

    /// Insert or replace a dictionary, page or stream-dictionary entry.
    pub fn set_entry(&mut self, container: NodeId, key: &str, value: NodeId) -> Result<(), DocumentError> {
        self.node_mut(container)?
            .dict_part_mut()
            .ok_or(DocumentError::NotAContainer(container, "dictionary"))?
            .set(key, value);
        Ok(())
    }

    /// Append an item to an array.
    pub fn push_item(&mut self, array: NodeId, value: NodeId) -> Result<(), DocumentError> {
        match self.node_mut(array)? {
            Object::Array(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(DocumentError::NotAContainer(array, "array")),
        }
    }

    /// Borrow a node, if the handle is known.
    pub fn get(&self, id: NodeId) -> Option<&Object> {
        self.nodes.get(id.index())
    }

    /// Borrow the object bound to `reference`, if any.
    pub fn get_indirect(&self, reference: ObjectId) -> Option<&Object> {
        self.objects.get(&reference).and_then(|id| self.get(*id))
    }

    /// Number of nodes in the arena.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of bound indirect objects.
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// All bound references in object-number order.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }
}

impl DocumentContext for Document {
    type Error = DocumentError;

    fn allocate_reference(&mut self) -> Result<ObjectId, Self::Error> {
        let number = self.next_number;
        self.next_number = number
            .checked_add(1)
            .ok_or(DocumentError::ReferenceSpaceExhausted)?;
        Ok(ObjectId::new(number, 0))
    }

    fn assign(&mut self, reference: ObjectId, node: NodeId) -> Result<(), Self::Error> {
        if node.index() >= self.nodes.len() {
            return Err(DocumentError::UnknownNode(node));
        }
        if reference.number >= self.next_number {
            // u32::MAX is never handed out, so saturating leaves the allocator exhausted.
            self.next_number = reference.number.saturating_add(1);
        }
        self.objects.insert(reference, node);
        Ok(())
    }

    fn lookup(&self, reference: ObjectId) -> Result<Option<NodeId>, Self::Error> {
        Ok(self.objects.get(&reference).copied())
    }

    fn wrap(&mut self, object: Object) -> Result<NodeId, Self::Error> {
        Ok(self.add(object))
    }

    fn node(&self, id: NodeId) -> Result<&Object, Self::Error> {
        self.nodes.get(id.index()).ok_or(DocumentError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Object, Self::Error> {
        self.nodes.get_mut(id.index()).ok_or(DocumentError::UnknownNode(id))
    }
}
