//! Inherited page attributes.
//!
//! A page leaf may omit `Resources`, `MediaBox`, `CropBox` or `Rotate` and
//! take them from the nearest ancestor in the page tree. When a single page
//! is copied out of its tree the ancestors are not copied with it, so those
//! values have to be pulled down onto the page first.

use std::collections::HashSet;

use crate::store::DocumentContext;
use crate::types::{Dictionary, Name, NodeId};

/// Page attributes that may be inherited from the page tree.
pub const INHERITABLE_ATTRIBUTES: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Key linking a page tree node to its parent.
pub const PARENT: &str = "Parent";

/// Value of `key` supplied by the nearest ancestor of `page`.
///
/// The walk follows `/Parent` through direct dictionaries and references to
/// dictionaries. It stops with `None` at a missing, dangling or
/// non-dictionary parent, at an ancestor already visited (a cyclic page
/// tree), and after `max_depth` hops when a cap is given.
pub fn inherited_attribute<C: DocumentContext>(
    ctx: &C,
    page: &Dictionary,
    key: &str,
    max_depth: Option<usize>,
) -> Result<Option<NodeId>, C::Error> {
    let mut parent = page.get(PARENT);
    let mut visited = HashSet::new();

    while let Some(node) = parent {
        if max_depth.is_some_and(|cap| visited.len() >= cap) {
            tracing::debug!(key, max_depth, "parent chain too deep, giving up");
            return Ok(None);
        }

        let Some(target) = ctx.resolve(node)? else {
            return Ok(None);
        };
        if !visited.insert(target) {
            tracing::warn!(key, ancestor = %target, "cyclic page tree, giving up");
            return Ok(None);
        }
        let Some(ancestor) = ctx.node(target)?.as_dict() else {
            return Ok(None);
        };
        if let Some(value) = ancestor.get(key) {
            return Ok(Some(value));
        }
        parent = ancestor.get(PARENT);
    }

    Ok(None)
}

/// A page leaf with its inherited attributes made explicit and `/Parent` removed.
///
/// Entry values are still handles into the source document.
#[derive(Debug, Clone)]
pub struct DetachedPage {
    /// Page entries in copy order.
    pub dict: Dictionary,
    /// Attributes that were pulled down from ancestors.
    pub hoisted: Vec<Name>,
}

/// Clone `page`, hoist inherited attributes onto the clone, drop `/Parent`.
pub fn detach_page<C: DocumentContext>(
    ctx: &C,
    page: &Dictionary,
    max_depth: Option<usize>,
) -> Result<DetachedPage, C::Error> {
    let mut dict = page.clone();
    let mut hoisted = Vec::new();

    for attribute in INHERITABLE_ATTRIBUTES {
        if dict.contains_key(attribute) {
            continue;
        }
        if let Some(value) = inherited_attribute(ctx, page, attribute, max_depth)? {
            dict.set(attribute, value);
            hoisted.push(Name::new(attribute));
        }
    }

    dict.remove(PARENT);
    Ok(DetachedPage { dict, hoisted })
}
