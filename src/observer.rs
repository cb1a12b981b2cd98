//! Copy events and the observer interface.
//!
//! ## Purpose
//!
//! The copier recovers locally from three kinds of bad input (dangling
//! references, corrupted CID descriptors, pages that only hold attributes by
//! inheritance) and never surfaces them as errors. This module makes those
//! recoveries visible: every recovery, and every fresh destination reference,
//! is reported as a [`CopyEvent`] to an injected [`CopyObserver`] and logged
//! through `tracing`.
//!
//! | Event | Level | Metric |
//! |-------|-------|--------|
//! | `ReferenceAllocated` | TRACE | `object_copier_references_allocated_total` |
//! | `DanglingReference` | WARN | `object_copier_dangling_references_total` |
//! | `DescriptorHealed` | WARN | `object_copier_descriptors_healed_total` |
//! | `PageDetached` | DEBUG | `object_copier_pages_detached_total` |
//! | `InheritedAttribute` | DEBUG | `object_copier_inherited_attributes_total` |

use parking_lot::Mutex;

use crate::cid::HealReason;
use crate::types::{Name, NodeId, ObjectId};

/// Something the copier did that a caller may want to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyEvent {
    /// A destination reference was reserved for a source reference.
    ReferenceAllocated {
        /// Source reference.
        source: ObjectId,
        /// Newly allocated destination reference.
        destination: ObjectId,
    },
    /// A source reference had no object; its destination slot holds null.
    DanglingReference {
        /// Source reference with nothing bound.
        source: ObjectId,
        /// Destination reference now bound to null.
        destination: ObjectId,
    },
    /// A CID font's `CIDSystemInfo` was replaced with the canonical descriptor.
    DescriptorHealed {
        /// Source font dictionary; `None` for a free-standing font.
        font: Option<NodeId>,
        /// Why the original was rejected.
        reason: HealReason,
    },
    /// A page leaf was copied without its `/Parent`.
    PageDetached {
        /// Source page node; `None` for a free-standing page.
        page: Option<NodeId>,
        /// Number of attributes pulled down from ancestors.
        hoisted: usize,
    },
    /// An inherited attribute was set directly on a detached page.
    InheritedAttribute {
        /// Source page node; `None` for a free-standing page.
        page: Option<NodeId>,
        /// Attribute name.
        attribute: Name,
    },
}

impl CopyEvent {
    /// Get the metric name for this event.
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::ReferenceAllocated { .. } => "object_copier_references_allocated_total",
            Self::DanglingReference { .. } => "object_copier_dangling_references_total",
            Self::DescriptorHealed { .. } => "object_copier_descriptors_healed_total",
            Self::PageDetached { .. } => "object_copier_pages_detached_total",
            Self::InheritedAttribute { .. } => "object_copier_inherited_attributes_total",
        }
    }

    /// Log this event as a structured `tracing` event.
    pub fn log(&self) {
        match self {
            Self::ReferenceAllocated { source, destination } => {
                tracing::trace!(source = %source, destination = %destination, "reference allocated");
            }
            Self::DanglingReference { source, destination } => {
                tracing::warn!(
                    number = source.number,
                    generation = source.generation,
                    destination = %destination,
                    "dangling reference copied as null"
                );
            }
            Self::DescriptorHealed { font, reason } => {
                tracing::warn!(font = ?font, reason = %reason, "CIDSystemInfo replaced with Adobe-Identity-0");
            }
            Self::PageDetached { page, hoisted } => {
                tracing::debug!(page = ?page, hoisted, "page detached from page tree");
            }
            Self::InheritedAttribute { page, attribute } => {
                tracing::debug!(page = ?page, attribute = %attribute, "inherited attribute hoisted");
            }
        }
    }
}

/// Sink for [`CopyEvent`]s.
///
/// Observers are shared with the copier behind an `Arc`, so they take
/// `&self` and handle their own interior mutability.
pub trait CopyObserver: Send + Sync {
    /// Receive one event.
    fn on_event(&self, event: &CopyEvent);
}

/// Observer that drops every event.
#[derive(Debug, Default)]
pub struct NoOpObserver;

impl CopyObserver for NoOpObserver {
    fn on_event(&self, _event: &CopyEvent) {}
}

/// Observer that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CopyEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far, in arrival order.
    pub fn events(&self) -> Vec<CopyEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events with the given metric name.
    pub fn count(&self, metric_name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.metric_name() == metric_name)
            .count()
    }

    /// Forget all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl CopyObserver for RecordingObserver {
    fn on_event(&self, event: &CopyEvent) {
        self.events.lock().push(event.clone());
    }
}
