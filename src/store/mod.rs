//! Document context backends.

pub mod memory;

use crate::types::{NodeId, Object, ObjectId};

/// Owning store for one document's object graph.
///
/// A context hands out node handles for everything it stores and keeps an
/// indirect object table mapping [`ObjectId`]s to those handles.
/// Implementations never reuse a handle or a reference number.
pub trait DocumentContext {
    /// Error type for context operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reserve a fresh indirect reference. Nothing is bound to it until
    /// [`assign`](Self::assign) is called.
    fn allocate_reference(&mut self) -> Result<ObjectId, Self::Error>;

    /// Bind `reference` to `node`, replacing any previous binding.
    fn assign(&mut self, reference: ObjectId, node: NodeId) -> Result<(), Self::Error>;

    /// Node bound to `reference`, or `None` if the reference is dangling.
    fn lookup(&self, reference: ObjectId) -> Result<Option<NodeId>, Self::Error>;

    /// Store a free-standing object and return its handle.
    fn wrap(&mut self, object: Object) -> Result<NodeId, Self::Error>;

    /// Borrow a stored node.
    fn node(&self, id: NodeId) -> Result<&Object, Self::Error>;

    /// Mutably borrow a stored node.
    fn node_mut(&mut self, id: NodeId) -> Result<&mut Object, Self::Error>;

    /// Follow `id` through one level of indirection.
    ///
    /// Returns the node itself when it is not a reference, the pointee when
    /// it is, and `None` for a dangling reference.
    fn resolve(&self, id: NodeId) -> Result<Option<NodeId>, Self::Error> {
        match self.node(id)? {
            Object::Reference(reference) => self.lookup(*reference),
            _ => Ok(Some(id)),
        }
    }
}

pub use memory::{Document, DocumentError};
