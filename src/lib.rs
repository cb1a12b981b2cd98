//! # pdf-object-copier
//!
//! Identity-preserving deep copy of PDF object graphs between documents.
//!
//! The copier answers one question:
//!
//! > Given an object in one document, what is its **faithful counterpart** in another?
//!
//! ## Core Contract
//!
//! 1. Every source container and every source reference gets exactly one
//!    destination counterpart per copier binding, across any number of calls
//! 2. Cycles terminate and shared sub-objects stay shared
//! 3. A page leaf arrives self-contained: inherited attributes pulled down,
//!    `/Parent` dropped
//! 4. A corrupted `CIDSystemInfo` on a CID font is replaced, never propagated
//!
//! ## Architecture
//!
//! ```text
//! source node → ObjectCopier ── memo (references, containers)
//!                   │       └── work stack (fill, bind)
//!                   ↓
//!          DocumentContext (destination) → CopyObserver
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same source graph + same policy + same call sequence → same destination
//!   graph, structurally (see [`structural_fingerprint`])
//! - Dictionary entry order is preserved
//! - Destination references are allocated in first-visit order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod store;
pub mod policy;
pub mod observer;
pub mod cid;
pub mod inherit;
pub mod canonical;
pub mod copier;

/// Policy version tag for the current copy policy.
pub const DEFAULT_POLICY_VERSION: &str = "copy_policy_v1";

// Re-exports
pub use types::{Dictionary, Name, NodeId, Object, ObjectId, ObjectKind, PdfString, Stream, StringFormat};
pub use store::{DocumentContext, Document, DocumentError};
pub use policy::CopyPolicy;
pub use observer::{CopyEvent, CopyObserver, NoOpObserver, RecordingObserver};
pub use cid::HealReason;
pub use copier::{CopyError, CopyStats, ObjectCopier};
pub use canonical::{
    to_canonical_bytes, canonical_hash, canonical_hash_hex,
    structural_form, structural_fingerprint, Token,
};
