//! Testing utilities for the curation workspace
//!
//! Shared layer policies, graph builders, and the reference scenarios used
//! across the diff and merge test suites.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use curation_graph::{AnnotationGraph, NodeHandle};
use curation_position::{LayerPolicy, LinkCompareMode, PolicyTable};

pub const TOKEN: &str = "Token";
pub const POS: &str = "POS";
pub const NAMED_ENTITY: &str = "NamedEntity";
pub const DEPENDENCY: &str = "Dependency";
pub const EVENT: &str = "Event";

/// Token offsets of the reference document "John sees Mary"
pub const TOKENS: [(usize, usize); 3] = [(0, 4), (5, 9), (10, 14)];

/// Policies for POS, named entities, dependencies and events
pub fn standard_policies() -> PolicyTable {
    PolicyTable::new()
        .with(LayerPolicy::span(POS).compare("value"))
        .with(LayerPolicy::span(NAMED_ENTITY).compare("value"))
        .with(LayerPolicy::relation(DEPENDENCY, "governor", "dependent").compare("label"))
        .with(LayerPolicy::span(EVENT).compare("value").with_link("args", LinkCompareMode::ByRole))
}

/// Same as [`standard_policies`] with stacking allowed for named entities
pub fn stacking_policies() -> PolicyTable {
    standard_policies().with(
        LayerPolicy::span(NAMED_ENTITY)
            .compare("value")
            .with_stacking(true),
    )
}

/// Same as [`standard_policies`] with event arguments compared under `mode`
pub fn link_policies(mode: LinkCompareMode) -> PolicyTable {
    standard_policies().with(
        LayerPolicy::span(EVENT)
            .compare("value")
            .with_link("args", mode),
    )
}

/// Entry types of [`standard_policies`]
pub fn entry_types() -> Vec<String> {
    vec![POS.into(), NAMED_ENTITY.into(), DEPENDENCY.into(), EVENT.into()]
}

/// Graph holding the reference tokens
pub fn tokenized() -> (AnnotationGraph, Vec<NodeHandle>) {
    let mut graph = AnnotationGraph::new();
    let tokens = TOKENS
        .iter()
        .map(|&(b, e)| graph.build(TOKEN, b, e).insert().unwrap())
        .collect();
    (graph, tokens)
}

pub fn pos(graph: &mut AnnotationGraph, begin: usize, end: usize, tag: &str) -> NodeHandle {
    graph.build(POS, begin, end).attr("value", tag).insert().unwrap()
}

pub fn named_entity(graph: &mut AnnotationGraph, begin: usize, end: usize, value: &str) -> NodeHandle {
    graph
        .build(NAMED_ENTITY, begin, end)
        .attr("value", value)
        .insert()
        .unwrap()
}

/// Dependency spanning the dependent token
pub fn dependency(
    graph: &mut AnnotationGraph,
    governor: NodeHandle,
    dependent: NodeHandle,
    label: &str,
) -> NodeHandle {
    let (begin, end) = {
        let dep = graph.node(dependent).unwrap();
        (dep.begin(), dep.end())
    };
    graph
        .build(DEPENDENCY, begin, end)
        .attr("governor", governor)
        .attr("dependent", dependent)
        .attr("label", label)
        .insert()
        .unwrap()
}

pub fn event(
    graph: &mut AnnotationGraph,
    begin: usize,
    end: usize,
    args: &[(&str, NodeHandle)],
) -> NodeHandle {
    args.iter()
        .fold(
            graph.build(EVENT, begin, end).attr("value", "sees"),
            |b, (role, target)| b.link("args", *role, *target),
        )
        .insert()
        .unwrap()
}

/// Inputs of one reconciliation run
#[derive(Debug)]
pub struct Scenario {
    pub policies: PolicyTable,
    pub annotators: Vec<(String, AnnotationGraph)>,
    pub curator: AnnotationGraph,
}

impl Scenario {
    pub fn annotator(&self, name: &str) -> &AnnotationGraph {
        self.annotators
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
            .unwrap()
    }
}

/// Both annotators tag [0,4) as POS "NN"
pub fn agreeing_pos() -> Scenario {
    let (mut a, _) = tokenized();
    pos(&mut a, 0, 4, "NN");
    let (mut b, _) = tokenized();
    pos(&mut b, 0, 4, "NN");
    let (curator, _) = tokenized();

    Scenario {
        policies: standard_policies(),
        annotators: vec![("alice".into(), a), ("bob".into(), b)],
        curator,
    }
}

/// Only alice tags [0,4); the curator holds a stale POS there
pub fn incomplete_pos() -> Scenario {
    let (mut a, _) = tokenized();
    pos(&mut a, 0, 4, "NN");
    let (b, _) = tokenized();
    let (mut curator, _) = tokenized();
    pos(&mut curator, 0, 4, "VB");

    Scenario {
        policies: standard_policies(),
        annotators: vec![("alice".into(), a), ("bob".into(), b)],
        curator,
    }
}

/// Same event host and filler, different role labels
pub fn link_role_disagreement() -> Scenario {
    let (mut a, ta) = tokenized();
    event(&mut a, 0, 14, &[("slot1", ta[0])]);
    let (mut b, tb) = tokenized();
    event(&mut b, 0, 14, &[("slot2", tb[0])]);
    let (curator, _) = tokenized();

    Scenario {
        policies: standard_policies(),
        annotators: vec![("alice".into(), a), ("bob".into(), b)],
        curator,
    }
}

/// Alice and bob each annotate one event over the document
///
/// `alice` and `bob` give the `(role, token index)` of their only argument.
pub fn single_argument_events(
    policies: PolicyTable,
    alice: (&str, usize),
    bob: (&str, usize),
) -> Scenario {
    let mut annotators = Vec::new();
    for (name, (role, token)) in [("alice", alice), ("bob", bob)] {
        let (mut g, t) = tokenized();
        event(&mut g, 0, 14, &[(role, t[token])]);
        annotators.push((name.to_string(), g));
    }
    let (curator, _) = tokenized();

    Scenario {
        policies,
        annotators,
        curator,
    }
}

/// Alice stacks two equal named entities at [0,0); bob has one
pub fn stacked_named_entities() -> Scenario {
    let (mut a, _) = tokenized();
    named_entity(&mut a, 0, 0, "NN");
    named_entity(&mut a, 0, 0, "NN");
    let (mut b, _) = tokenized();
    named_entity(&mut b, 0, 0, "NN");
    let (mut curator, _) = tokenized();
    named_entity(&mut curator, 0, 0, "NN");

    Scenario {
        policies: standard_policies(),
        annotators: vec![("alice".into(), a), ("bob".into(), b)],
        curator,
    }
}

/// Agreeing dependency whose dependent token is stacked in the curator graph
///
/// Both annotators also agree on POS [10,14) "NN", which must still merge.
pub fn stacked_dependent_token() -> Scenario {
    let mut annotators = Vec::new();
    for name in ["alice", "bob"] {
        let (mut g, t) = tokenized();
        dependency(&mut g, t[0], t[1], "nsubj");
        pos(&mut g, 10, 14, "NN");
        annotators.push((name.to_string(), g));
    }

    let (mut curator, _) = tokenized();
    curator.build(TOKEN, 5, 9).insert().unwrap();

    Scenario {
        policies: standard_policies(),
        annotators,
        curator,
    }
}

/// A mixed document exercising every layer
pub fn mixed_document() -> Scenario {
    let mut annotators = Vec::new();
    for (name, obj_label, third_tag) in [("alice", "obj", "NN"), ("bob", "obj", "NNP")] {
        let (mut g, t) = tokenized();
        pos(&mut g, 0, 4, "NNP");
        pos(&mut g, 5, 9, "VBZ");
        pos(&mut g, 10, 14, third_tag);
        named_entity(&mut g, 0, 4, "PER");
        dependency(&mut g, t[1], t[0], "nsubj");
        dependency(&mut g, t[1], t[2], obj_label);
        event(&mut g, 0, 14, &[("agent", t[0]), ("theme", t[2])]);
        annotators.push((name.to_string(), g));
    }
    let (curator, _) = tokenized();

    Scenario {
        policies: standard_policies(),
        annotators,
        curator,
    }
}
