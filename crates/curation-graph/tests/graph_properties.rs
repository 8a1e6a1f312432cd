//! Property tests for handle validity across removal and slot reuse

use curation_graph::{AnnotationGraph, GraphError, NodeHandle, Value};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// Insert a token, optionally referencing the live node at this index
    Insert(Option<usize>),
    /// Remove the live node at this index
    Remove(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            prop::option::of(0..8usize).prop_map(Op::Insert),
            (0..8usize).prop_map(Op::Remove),
        ],
        1..40,
    )
}

proptest! {
    #[test]
    fn removed_handles_stay_invalid(ops in ops()) {
        let mut graph = AnnotationGraph::new();
        let mut live: Vec<NodeHandle> = Vec::new();
        let mut dead: Vec<NodeHandle> = Vec::new();

        for (offset, op) in ops.into_iter().enumerate() {
            match op {
                Op::Insert(reference) => {
                    let mut builder = graph.build("Token", offset, offset + 1);
                    if let Some(&target) = reference.and_then(|i| live.get(i)) {
                        builder = builder.attr("next", target);
                    }
                    let handle = builder.insert().unwrap();
                    prop_assert!(!dead.contains(&handle));
                    live.push(handle);
                }
                Op::Remove(i) if i < live.len() => {
                    let handle = live.remove(i);
                    let removal = graph.remove(handle).unwrap();
                    prop_assert_eq!(removal.node.handle(), handle);
                    for detached in removal.detached {
                        let node = graph.node(detached).unwrap();
                        prop_assert_eq!(node.attribute("next"), Some(&Value::Ref(None)));
                    }
                    dead.push(handle);
                }
                Op::Remove(_) => {}
            }
        }

        prop_assert_eq!(graph.len(), live.len());
        for handle in &live {
            prop_assert!(graph.contains(*handle));
        }
        for handle in &dead {
            prop_assert!(!graph.contains(*handle));
            prop_assert!(matches!(graph.remove(*handle), Err(GraphError::InvalidHandle(_))));
        }
        for node in graph.handles().into_iter().map(|h| graph.node(h).unwrap()) {
            if let Some(Value::Ref(Some(target))) = node.attribute("next") {
                prop_assert!(live.contains(target));
            }
        }
    }
}
