//! Identity-preserving deep copy between two document contexts.
//!
//! The copier walks the source graph with an explicit work stack rather than
//! native recursion, so nesting depth is bounded by heap, not thread stack.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::cid::{self, CID_SYSTEM_INFO};
use crate::inherit;
use crate::observer::{CopyEvent, CopyObserver, NoOpObserver};
use crate::policy::CopyPolicy;
use crate::store::DocumentContext;
use crate::types::{Dictionary, Name, NodeId, Object, ObjectId};

/// Error type for copier operations.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Source context error.
    #[error("Source context error: {0}")]
    Source(String),
    /// Destination context error.
    #[error("Destination context error: {0}")]
    Destination(String),
    /// A reserved destination container no longer has the shape it was created with.
    #[error("Destination node {node} changed shape, expected {expected}")]
    ShapeMismatch {
        /// Destination node.
        node: NodeId,
        /// Expected container shape.
        expected: &'static str,
    },
}

impl CopyError {
    /// Create a source error from any error type.
    pub fn from_source<E: std::error::Error>(e: E) -> Self {
        Self::Source(e.to_string())
    }

    /// Create a destination error from any error type.
    pub fn from_destination<E: std::error::Error>(e: E) -> Self {
        Self::Destination(e.to_string())
    }
}

/// Running counters for one copier binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    /// Destination references allocated.
    pub references_allocated: usize,
    /// Containers (dictionaries, pages, arrays, streams) created.
    pub containers_copied: usize,
    /// Scalars and opaque payloads cloned.
    pub scalars_cloned: usize,
    /// Source references with nothing bound, copied as null.
    pub dangling_references: usize,
    /// `CIDSystemInfo` descriptors replaced.
    pub descriptors_healed: usize,
    /// Page leaves detached from their page tree.
    pub pages_detached: usize,
    /// Inherited attributes pulled down onto pages.
    pub attributes_hoisted: usize,
}

/// Value of a pending dictionary entry.
#[derive(Debug, Clone, Copy)]
enum Child {
    /// Source node still to be copied.
    Source(NodeId),
    /// Destination node already built.
    Ready(NodeId),
}

/// Deferred work. Every target is a destination node or reference that has
/// already been reserved and memoized.
#[derive(Debug)]
enum Task {
    /// Copy entries into a reserved dictionary, page or stream.
    FillDictionary {
        target: NodeId,
        entries: Vec<(Name, Child)>,
    },
    /// Copy items into a reserved array.
    FillArray { target: NodeId, items: Vec<NodeId> },
    /// Copy a pointee and bind it to a reserved destination reference.
    Bind { reference: ObjectId, pointee: NodeId },
}

/// Deep copier bound to one (source, destination) pair.
///
/// ## Algorithm
///
/// 1. Scalars and opaque payloads are cloned into the destination.
/// 2. A container not seen before gets an empty destination shell, which is
///    memoized under the source node **before** any child is visited. Filling
///    it is pushed onto the work stack.
/// 3. A reference not seen before gets a fresh destination reference, which
///    is memoized **before** the pointee is looked up. A pointee is copied and
///    bound later from the work stack; a missing pointee binds null at once.
/// 4. The stack is drained until empty.
///
/// Step 2 and 3 make every revisit (through a cycle, a diamond, or a later
/// call) land on the memoized counterpart, so each source container and each
/// source reference gets exactly one destination counterpart per binding.
///
/// Page leaves are first detached from their page tree (inherited attributes
/// hoisted, `/Parent` dropped). `CIDSystemInfo` on CID fonts is replaced when
/// corrupted. Both passes are controlled by [`CopyPolicy`].
pub struct ObjectCopier<'a, S: DocumentContext, D: DocumentContext> {
    src: &'a S,
    dest: &'a mut D,
    policy: CopyPolicy,
    observer: Arc<dyn CopyObserver>,
    /// Source reference -> destination reference.
    references: HashMap<ObjectId, ObjectId>,
    /// Source container -> destination container.
    containers: HashMap<NodeId, NodeId>,
    stack: Vec<Task>,
    stats: CopyStats,
}

impl<'a, S: DocumentContext, D: DocumentContext> ObjectCopier<'a, S, D> {
    /// Bind a copier to `src` and `dest` with the default policy.
    pub fn new(src: &'a S, dest: &'a mut D) -> Self {
        Self::with_policy(src, dest, CopyPolicy::default())
    }

    /// Bind a copier with a custom policy.
    pub fn with_policy(src: &'a S, dest: &'a mut D, policy: CopyPolicy) -> Self {
        tracing::debug!(
            policy_id = %policy.policy_id(),
            params_hash = %policy.params_hash(),
            "object copier bound"
        );
        Self {
            src,
            dest,
            policy,
            observer: Arc::new(NoOpObserver),
            references: HashMap::new(),
            containers: HashMap::new(),
            stack: Vec::new(),
            stats: CopyStats::default(),
        }
    }

    /// Send copy events to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn CopyObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Copy `node` (a handle into the source) into the destination.
    ///
    /// The result has the same variant category as the input. On error the
    /// destination may hold orphan or partially filled objects, and the memo
    /// may name them; drop the binding together with its destination.
    pub fn copy(&mut self, node: NodeId) -> Result<NodeId, CopyError> {
        let result = self.visit(node).and_then(|copied| {
            self.drain()?;
            Ok(copied)
        });
        self.finish("node", result)
    }

    /// Copy a free-standing object that is not stored in the source.
    ///
    /// Child handles of a free-standing container must point into the source.
    /// The container itself has no identity, so it is never memoized.
    pub fn copy_object(&mut self, object: &Object) -> Result<NodeId, CopyError> {
        let result = self.visit_object(None, object).and_then(|copied| {
            self.drain()?;
            Ok(copied)
        });
        self.finish("object", result)
    }

    /// Copy the object behind a source reference and return its destination reference.
    pub fn copy_reference(&mut self, reference: ObjectId) -> Result<ObjectId, CopyError> {
        let result = self.resolve_reference(reference).and_then(|copied| {
            self.drain()?;
            Ok(copied)
        });
        self.finish("reference", result)
    }

    /// Copy several nodes in order, sharing one memo.
    pub fn copy_all(&mut self, nodes: &[NodeId]) -> Result<Vec<NodeId>, CopyError> {
        nodes.iter().map(|node| self.copy(*node)).collect()
    }

    /// Destination counterpart of a source container, if it has been copied.
    pub fn copied_container(&self, source: NodeId) -> Option<NodeId> {
        self.containers.get(&source).copied()
    }

    /// Destination counterpart of a source reference, if it has been copied.
    pub fn copied_reference(&self, source: ObjectId) -> Option<ObjectId> {
        self.references.get(&source).copied()
    }

    /// Number of memoized source identities.
    pub fn memo_len(&self) -> usize {
        self.references.len() + self.containers.len()
    }

    /// Counters accumulated across all calls.
    pub fn stats(&self) -> CopyStats {
        self.stats
    }

    /// Get the policy.
    pub fn policy(&self) -> &CopyPolicy {
        &self.policy
    }

    /// Get the source context.
    pub fn source(&self) -> &S {
        self.src
    }

    /// Get the destination context.
    pub fn destination(&self) -> &D {
        self.dest
    }

    fn finish<T: std::fmt::Display>(
        &mut self,
        what: &'static str,
        result: Result<T, CopyError>,
    ) -> Result<T, CopyError> {
        match &result {
            Ok(copied) => tracing::debug!(
                what,
                copied = %copied,
                references = self.stats.references_allocated,
                containers = self.stats.containers_copied,
                memo = self.memo_len(),
                "copy complete"
            ),
            Err(e) => {
                self.stack.clear();
                tracing::error!(what, error = %e, "copy failed");
            }
        }
        result
    }

    fn emit(&self, event: CopyEvent) {
        event.log();
        self.observer.on_event(&event);
    }

    fn wrap(&mut self, object: Object) -> Result<NodeId, CopyError> {
        self.dest.wrap(object).map_err(CopyError::from_destination)
    }

    /// Produce the destination counterpart of a source node.
    ///
    /// Never recurses: containers come back as memoized shells with their
    /// filling deferred to the work stack.
    fn visit(&mut self, node: NodeId) -> Result<NodeId, CopyError> {
        let src = self.src;
        let object = src.node(node).map_err(CopyError::from_source)?;
        self.visit_object(Some(node), object)
    }

    fn visit_object(&mut self, key: Option<NodeId>, object: &Object) -> Result<NodeId, CopyError> {
        if object.is_container() {
            if let Some(done) = key.and_then(|k| self.containers.get(&k).copied()) {
                return Ok(done);
            }
        }

        match object {
            Object::Page(dict) if self.policy.detach_pages => self.visit_page(key, dict),
            Object::Page(dict) | Object::Dictionary(dict) => {
                let target = self.reserve(key, object.shallow_clone())?;
                let heal = matches!(object, Object::Dictionary(_));
                let entries = self.dictionary_entries(key, dict, heal)?;
                self.stack.push(Task::FillDictionary { target, entries });
                Ok(target)
            }
            Object::Array(items) => {
                let target = self.reserve(key, object.shallow_clone())?;
                self.stack.push(Task::FillArray { target, items: items.clone() });
                Ok(target)
            }
            Object::Stream(stream) => {
                let target = self.reserve(key, object.shallow_clone())?;
                let entries = self.dictionary_entries(key, &stream.dict, false)?;
                self.stack.push(Task::FillDictionary { target, entries });
                Ok(target)
            }
            Object::Reference(reference) => {
                let copied = self.resolve_reference(*reference)?;
                self.wrap(Object::Reference(copied))
            }
            Object::Invalid(_) => {
                self.stats.scalars_cloned += 1;
                self.wrap(object.shallow_clone())
            }
            Object::Name(_)
            | Object::String(_)
            | Object::Integer(_)
            | Object::Real(_)
            | Object::Boolean(_)
            | Object::Null => {
                self.stats.scalars_cloned += 1;
                self.wrap(object.shallow_clone())
            }
        }
    }

    /// Create the destination shell and memoize it under `key`.
    fn reserve(&mut self, key: Option<NodeId>, shell: Object) -> Result<NodeId, CopyError> {
        let target = self.wrap(shell)?;
        if let Some(source) = key {
            self.containers.insert(source, target);
        }
        self.stats.containers_copied += 1;
        Ok(target)
    }

    fn visit_page(&mut self, key: Option<NodeId>, dict: &Dictionary) -> Result<NodeId, CopyError> {
        let detached = inherit::detach_page(self.src, dict, self.policy.max_inheritance_depth)
            .map_err(CopyError::from_source)?;

        let target = self.reserve(key, Object::Page(Dictionary::new()))?;

        for attribute in &detached.hoisted {
            self.stats.attributes_hoisted += 1;
            self.emit(CopyEvent::InheritedAttribute { page: key, attribute: attribute.clone() });
        }
        self.stats.pages_detached += 1;
        self.emit(CopyEvent::PageDetached { page: key, hoisted: detached.hoisted.len() });

        let entries = detached
            .dict
            .iter()
            .map(|(name, value)| (name.clone(), Child::Source(value)))
            .collect();
        self.stack.push(Task::FillDictionary { target, entries });
        Ok(target)
    }

    /// Pending entries for a dictionary fill, with `CIDSystemInfo` replaced
    /// up front when `heal` applies and the descriptor is corrupted.
    fn dictionary_entries(
        &mut self,
        key: Option<NodeId>,
        dict: &Dictionary,
        heal: bool,
    ) -> Result<Vec<(Name, Child)>, CopyError> {
        let src = self.src;
        let heal = heal
            && self.policy.heal_cid_system_info
            && cid::is_cid_font(src, dict).map_err(CopyError::from_source)?;

        let mut entries = Vec::with_capacity(dict.len());
        for (name, value) in dict.iter() {
            if heal && name.as_str() == CID_SYSTEM_INFO {
                if let Some(reason) = cid::inspect_descriptor(src, value).map_err(CopyError::from_source)? {
                    let fresh = cid::canonical_descriptor(&mut *self.dest)
                        .map_err(CopyError::from_destination)?;
                    self.stats.descriptors_healed += 1;
                    self.emit(CopyEvent::DescriptorHealed { font: key, reason });
                    entries.push((name.clone(), Child::Ready(fresh)));
                    continue;
                }
            }
            entries.push((name.clone(), Child::Source(value)));
        }
        Ok(entries)
    }

    /// Map a source reference to its destination reference, reserving one
    /// on first sight.
    fn resolve_reference(&mut self, reference: ObjectId) -> Result<ObjectId, CopyError> {
        if let Some(&copied) = self.references.get(&reference) {
            return Ok(copied);
        }

        let copied = self.dest.allocate_reference().map_err(CopyError::from_destination)?;
        self.references.insert(reference, copied);
        self.stats.references_allocated += 1;
        self.emit(CopyEvent::ReferenceAllocated { source: reference, destination: copied });

        match self.src.lookup(reference).map_err(CopyError::from_source)? {
            Some(pointee) => self.stack.push(Task::Bind { reference: copied, pointee }),
            None => {
                let null = self.wrap(Object::Null)?;
                self.dest.assign(copied, null).map_err(CopyError::from_destination)?;
                self.stats.dangling_references += 1;
                self.emit(CopyEvent::DanglingReference { source: reference, destination: copied });
            }
        }
        Ok(copied)
    }

    fn drain(&mut self) -> Result<(), CopyError> {
        while let Some(task) = self.stack.pop() {
            match task {
                Task::FillDictionary { target, entries } => {
                    for (name, child) in entries {
                        let value = match child {
                            Child::Source(node) => self.visit(node)?,
                            Child::Ready(node) => node,
                        };
                        self.dest
                            .node_mut(target)
                            .map_err(CopyError::from_destination)?
                            .dict_part_mut()
                            .ok_or(CopyError::ShapeMismatch { node: target, expected: "dictionary" })?
                            .set(name, value);
                    }
                }
                Task::FillArray { target, items } => {
                    for item in items {
                        let value = self.visit(item)?;
                        match self.dest.node_mut(target).map_err(CopyError::from_destination)? {
                            Object::Array(copied) => copied.push(value),
                            _ => {
                                return Err(CopyError::ShapeMismatch { node: target, expected: "array" })
                            }
                        }
                    }
                }
                Task::Bind { reference, pointee } => {
                    let value = self.visit(pointee)?;
                    self.dest.assign(reference, value).map_err(CopyError::from_destination)?;
                }
            }
        }
        Ok(())
    }
}
