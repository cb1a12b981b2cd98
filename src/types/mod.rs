//! Core types for the object model.

pub mod id;
pub mod object;

pub use id::{NodeId, ObjectId};
pub use object::{Dictionary, Name, Object, ObjectKind, PdfString, Stream, StringFormat};
