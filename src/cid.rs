//! `CIDSystemInfo` repair for CID-keyed fonts.
//!
//! Documents that were decrypted with the wrong key (or not at all) carry
//! font descriptors whose `Registry` / `Ordering` strings are random bytes.
//! Viewers reject such fonts outright, so while copying a `CIDFontType0` or
//! `CIDFontType2` font the copier swaps a broken descriptor for the neutral
//! `Adobe-Identity-0` collection. Nothing else in the graph is inspected.

use std::fmt;

use crate::store::DocumentContext;
use crate::types::{Dictionary, Name, NodeId, Object};

/// Dictionary key holding the descriptor.
pub const CID_SYSTEM_INFO: &str = "CIDSystemInfo";

/// Font subtypes the repair applies to.
pub const CID_FONT_SUBTYPES: [&str; 2] = ["CIDFontType0", "CIDFontType2"];

/// Why a descriptor was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealReason {
    /// The entry is not a dictionary.
    NotADictionary,
    /// The entry is a reference with nothing bound to it.
    DanglingReference,
    /// A string field holds bytes outside printable ASCII.
    NonPrintable(&'static str),
}

impl fmt::Display for HealReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotADictionary => write!(f, "not a dictionary"),
            Self::DanglingReference => write!(f, "dangling reference"),
            Self::NonPrintable(field) => write!(f, "non-printable bytes in {}", field),
        }
    }
}

/// Whether every byte is printable ASCII and none is a string delimiter.
pub fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| (0x20..=0x7e).contains(&b) && !matches!(b, b'(' | b')' | b'\\'))
}

/// Name stored under `key`, following at most one reference.
fn name_entry<'a, C: DocumentContext>(
    ctx: &'a C,
    dict: &Dictionary,
    key: &str,
) -> Result<Option<&'a Name>, C::Error> {
    let Some(node) = dict.get(key) else {
        return Ok(None);
    };
    match ctx.resolve(node)? {
        Some(target) => Ok(ctx.node(target)?.as_name()),
        None => Ok(None),
    }
}

/// Whether `dict` is a `/Font` of subtype `/CIDFontType0` or `/CIDFontType2`.
pub fn is_cid_font<C: DocumentContext>(ctx: &C, dict: &Dictionary) -> Result<bool, C::Error> {
    let is_font = name_entry(ctx, dict, "Type")?.is_some_and(|n| n.as_str() == "Font");
    if !is_font {
        return Ok(false);
    }
    Ok(name_entry(ctx, dict, "Subtype")?
        .is_some_and(|n| CID_FONT_SUBTYPES.contains(&n.as_str())))
}

/// Check a `CIDSystemInfo` entry. Returns `None` when it is healthy.
///
/// A reference is followed once. Only `Registry` and `Ordering` string
/// values are inspected; absent or non-string fields pass.
pub fn inspect_descriptor<C: DocumentContext>(
    ctx: &C,
    entry: NodeId,
) -> Result<Option<HealReason>, C::Error> {
    let Some(target) = ctx.resolve(entry)? else {
        return Ok(Some(HealReason::DanglingReference));
    };
    let Object::Dictionary(dict) = ctx.node(target)? else {
        return Ok(Some(HealReason::NotADictionary));
    };

    for field in ["Registry", "Ordering"] {
        let Some(value) = dict.get(field) else {
            continue;
        };
        let Some(value) = ctx.resolve(value)? else {
            continue;
        };
        if let Object::String(s) = ctx.node(value)? {
            if !is_printable_ascii(s.as_bytes()) {
                return Ok(Some(HealReason::NonPrintable(field)));
            }
        }
    }

    Ok(None)
}

/// Build `<< /Registry (Adobe) /Ordering (Identity) /Supplement 0 >>` in `ctx`.
pub fn canonical_descriptor<C: DocumentContext>(ctx: &mut C) -> Result<NodeId, C::Error> {
    let registry = ctx.wrap(Object::string("Adobe"))?;
    let ordering = ctx.wrap(Object::string("Identity"))?;
    let supplement = ctx.wrap(Object::Integer(0))?;

    let dict: Dictionary = [
        (Name::new("Registry"), registry),
        (Name::new("Ordering"), ordering),
        (Name::new("Supplement"), supplement),
    ]
    .into_iter()
    .collect();

    ctx.wrap(Object::Dictionary(dict))
}
