//! Canonical serialization for deterministic hashing.
//!
//! Besides the generic helpers, this module renders an object subgraph into a
//! **structural form**: a flat pre-order token stream that does not depend on
//! object numbers or arena handles. A subgraph and a faithful copy of it in
//! another document produce the same form, so comparing fingerprints checks a
//! copy without caring how it was renumbered.
//!
//! ## Determinism Guarantees
//!
//! - Dictionary entries are emitted in insertion order
//! - References are numbered by first visit (`Ref(0)`, `Ref(1)`, ...)
//! - A container or reference seen again is emitted as a back-marker, so
//!   cycles and shared instances render finitely
//! - Byte strings and stream payloads are hex-encoded

use std::collections::HashMap;

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::store::DocumentContext;
use crate::types::{Name, NodeId, Object, ObjectId};

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// One token of a structural form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Token {
    /// Page leaf header with its entry count.
    Page(usize),
    /// Dictionary header with its entry count.
    Dictionary(usize),
    /// Array header with its length.
    Array(usize),
    /// Stream header: entry count and hex payload.
    Stream(usize, String),
    /// Dictionary key; the value follows.
    Key(String),
    /// First visit of a reference; its pointee follows unless dangling.
    Ref(usize),
    /// Revisit of a reference seen earlier.
    SeenRef(usize),
    /// The preceding reference has nothing bound to it.
    Dangling,
    /// Revisit of a container seen earlier.
    SeenContainer(usize),
    /// Opaque payload, hex.
    Invalid(String),
    /// Name.
    Name(String),
    /// String bytes, hex.
    String(String),
    /// Integer.
    Integer(i64),
    /// Real.
    Real(f64),
    /// Boolean.
    Boolean(bool),
    /// Null.
    Null,
}

enum Step {
    Node(NodeId),
    Key(Name),
}

fn push_entries<'a>(stack: &mut Vec<Step>, entries: impl DoubleEndedIterator<Item = (&'a Name, NodeId)>) {
    for (key, value) in entries.rev() {
        stack.push(Step::Node(value));
        stack.push(Step::Key(key.clone()));
    }
}

/// Render the subgraph reachable from `root` as a structural token stream.
///
/// Traversal uses an explicit stack, so nesting depth is not limited by the
/// thread stack.
pub fn structural_form<C: DocumentContext>(ctx: &C, root: NodeId) -> Result<Vec<Token>, C::Error> {
    let mut tokens = Vec::new();
    let mut containers: HashMap<NodeId, usize> = HashMap::new();
    let mut references: HashMap<ObjectId, usize> = HashMap::new();
    let mut stack = vec![Step::Node(root)];

    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Key(key) => {
                tokens.push(Token::Key(key.as_str().to_string()));
                continue;
            }
            Step::Node(id) => id,
        };

        let object = ctx.node(id)?;
        if object.is_container() {
            if let Some(&ordinal) = containers.get(&id) {
                tokens.push(Token::SeenContainer(ordinal));
                continue;
            }
            containers.insert(id, containers.len());
        }

        match object {
            Object::Page(dict) => {
                tokens.push(Token::Page(dict.len()));
                push_entries(&mut stack, dict.iter());
            }
            Object::Dictionary(dict) => {
                tokens.push(Token::Dictionary(dict.len()));
                push_entries(&mut stack, dict.iter());
            }
            Object::Stream(stream) => {
                tokens.push(Token::Stream(stream.dict.len(), hex::encode(&stream.content)));
                push_entries(&mut stack, stream.dict.iter());
            }
            Object::Array(items) => {
                tokens.push(Token::Array(items.len()));
                stack.extend(items.iter().rev().map(|item| Step::Node(*item)));
            }
            Object::Reference(reference) => {
                if let Some(&ordinal) = references.get(reference) {
                    tokens.push(Token::SeenRef(ordinal));
                    continue;
                }
                let ordinal = references.len();
                references.insert(*reference, ordinal);
                tokens.push(Token::Ref(ordinal));
                match ctx.lookup(*reference)? {
                    Some(target) => stack.push(Step::Node(target)),
                    None => tokens.push(Token::Dangling),
                }
            }
            Object::Invalid(bytes) => tokens.push(Token::Invalid(hex::encode(bytes))),
            Object::Name(name) => tokens.push(Token::Name(name.as_str().to_string())),
            Object::String(s) => tokens.push(Token::String(hex::encode(s.as_bytes()))),
            Object::Integer(i) => tokens.push(Token::Integer(*i)),
            Object::Real(r) => tokens.push(Token::Real(*r)),
            Object::Boolean(b) => tokens.push(Token::Boolean(*b)),
            Object::Null => tokens.push(Token::Null),
        }
    }

    Ok(tokens)
}

/// Hex xxh64 fingerprint of [`structural_form`].
pub fn structural_fingerprint<C: DocumentContext>(ctx: &C, root: NodeId) -> Result<String, C::Error> {
    Ok(canonical_hash_hex(&structural_form(ctx, root)?))
}
