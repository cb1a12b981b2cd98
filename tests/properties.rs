//! Property-based tests for the object copier.
//!
//! Invariants that should hold for ALL generated graphs, including graphs
//! with shared nodes, inline cycles, reference cycles and dangling references:
//! - Termination: every copy returns
//! - Binding: every destination reference allocated is bound to something
//! - Faithfulness: a verbatim copy has the same structural form as its source
//! - Memo persistence: copying the same root again creates nothing new

use pdf_object_copier::{
    structural_form, CopyPolicy, Document, NodeId, Object, ObjectCopier, ObjectId, Token,
};
use proptest::prelude::*;

// ============================================================================
// Graph generation
// ============================================================================

#[derive(Debug, Clone)]
enum Link {
    /// Child handle to another generated node.
    Inline(usize),
    /// Reference to another generated node's indirect slot.
    Indirect(usize),
    /// Reference to an object number nothing is bound to.
    Dangling(u32),
}

#[derive(Debug, Clone)]
enum Shape {
    Integer(i64),
    Bytes(Vec<u8>),
    Array(Vec<Link>),
    Dictionary(Vec<Link>),
}

fn link(n: usize) -> impl Strategy<Value = Link> {
    prop_oneof![
        4 => (0..n).prop_map(Link::Inline),
        4 => (0..n).prop_map(Link::Indirect),
        1 => (1000u32..1100).prop_map(Link::Dangling),
    ]
}

fn shape(n: usize) -> impl Strategy<Value = Shape> {
    prop_oneof![
        any::<i64>().prop_map(Shape::Integer),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Shape::Bytes),
        prop::collection::vec(link(n), 0..4).prop_map(Shape::Array),
        prop::collection::vec(link(n), 0..4).prop_map(Shape::Dictionary),
    ]
}

fn graph() -> impl Strategy<Value = Vec<Shape>> {
    (1usize..24).prop_flat_map(|n| prop::collection::vec(shape(n), n))
}

/// Materialize `shapes` into a document. Every node gets an indirect slot.
/// With `dangling` off, dangling links are redirected to a live slot.
///
/// Returns the document and a root array holding every node inline.
fn build(shapes: &[Shape], dangling: bool) -> (Document, NodeId) {
    let mut doc = Document::new();

    let nodes: Vec<NodeId> = shapes
        .iter()
        .map(|shape| match shape {
            Shape::Integer(i) => doc.add(Object::Integer(*i)),
            Shape::Bytes(bytes) => doc.add(Object::string(bytes.clone())),
            Shape::Array(_) => doc.add_array(Vec::<NodeId>::new()),
            Shape::Dictionary(_) => doc.add_dictionary(Vec::<(&str, NodeId)>::new()),
        })
        .collect();
    let slots: Vec<ObjectId> = nodes.iter().map(|n| doc.add_indirect(*n).unwrap()).collect();

    for (i, shape) in shapes.iter().enumerate() {
        let links = match shape {
            Shape::Array(links) | Shape::Dictionary(links) => links,
            _ => continue,
        };
        for (j, link) in links.iter().enumerate() {
            let child = match *link {
                Link::Inline(target) => nodes[target],
                Link::Indirect(target) => doc.add_reference(slots[target]),
                Link::Dangling(number) if dangling => doc.add_reference(ObjectId::new(number, 0)),
                Link::Dangling(number) => doc.add_reference(slots[number as usize % slots.len()]),
            };
            match shape {
                Shape::Array(_) => doc.push_item(nodes[i], child).unwrap(),
                _ => doc.set_entry(nodes[i], &format!("K{}", j), child).unwrap(),
            }
        }
    }

    let root = doc.add_array(nodes);
    (doc, root)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_every_allocated_reference_is_bound(shapes in graph()) {
        let (src, root) = build(&shapes, true);

        let mut dest = Document::new();
        let mut copier = ObjectCopier::new(&src, &mut dest);
        copier.copy(root).unwrap();
        let stats = copier.stats();
        drop(copier);

        prop_assert_eq!(stats.references_allocated, dest.num_objects());
        prop_assert!(stats.dangling_references <= stats.references_allocated);
    }

    #[test]
    fn prop_verbatim_copy_is_structurally_equal(shapes in graph()) {
        let (src, root) = build(&shapes, false);

        let mut dest = Document::new();
        let mut copier = ObjectCopier::with_policy(&src, &mut dest, CopyPolicy::verbatim());
        let copied = copier.copy(root).unwrap();
        let stats = copier.stats();
        drop(copier);

        let source_form = structural_form(&src, root).unwrap();
        let copied_form = structural_form(&dest, copied).unwrap();
        prop_assert_eq!(&source_form, &copied_form);

        let distinct_refs = source_form.iter().filter(|t| matches!(t, Token::Ref(_))).count();
        prop_assert_eq!(stats.references_allocated, distinct_refs);
        prop_assert_eq!(stats.dangling_references, 0);
    }

    #[test]
    fn prop_second_copy_creates_nothing(shapes in graph()) {
        let (src, root) = build(&shapes, true);

        let mut dest = Document::new();
        let mut copier = ObjectCopier::new(&src, &mut dest);
        let first = copier.copy(root).unwrap();
        let stats = copier.stats();
        let memo = copier.memo_len();
        let second = copier.copy(root).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(copier.stats(), stats);
        prop_assert_eq!(copier.memo_len(), memo);
    }
}
