//! Diff and classification over the reference scenarios

use curation_diff::{compute_diff, Agreement, AnnotatorId, DiffEngine, DiffResult};
use curation_graph::{AnnotationGraph, Value};
use curation_position::{LayerPolicy, LinkCompareMode, PolicyTable, Position};
use curation_test_utils as fx;
use pretty_assertions::assert_eq;

fn diff(scenario: &fx::Scenario, types: &[&str]) -> DiffResult {
    compute_diff(
        types,
        &scenario.policies,
        scenario
            .annotators
            .iter()
            .map(|(name, g)| (AnnotatorId::from(name.as_str()), g)),
    )
    .unwrap()
}

fn status_at(diff: &DiffResult, position: &Position) -> Agreement {
    diff.agreement_at(position).unwrap()
}

#[test]
fn agreeing_pos_is_agree() {
    let s = fx::agreeing_pos();
    let d = diff(&s, &[fx::POS]);
    assert_eq!(d.len(), 1);
    assert_eq!(status_at(&d, &Position::span(fx::POS, 0, 4)), Agreement::Agree);
}

#[test]
fn missing_pos_is_incomplete() {
    let s = fx::incomplete_pos();
    let d = diff(&s, &[fx::POS]);
    assert_eq!(
        status_at(&d, &Position::span(fx::POS, 0, 4)),
        Agreement::Incomplete
    );
    assert_eq!(d.incomplete().len(), 1);
}

#[test]
fn link_role_mismatch_only_affects_the_slot() {
    let s = fx::link_role_disagreement();
    let d = diff(&s, &[fx::EVENT]);

    let host = Position::span(fx::EVENT, 0, 14);
    assert_eq!(status_at(&d, &host), Agreement::Agree);

    let slots: Vec<_> = d.iter().filter(|set| set.is_slot()).collect();
    assert_eq!(slots.len(), 1);
    assert_eq!(d.classify(slots[0]), Agreement::Disagree);
    assert_eq!(slots[0].position().host(), host);
}

#[test]
fn stacked_named_entities_disagree() {
    let s = fx::stacked_named_entities();
    let d = diff(&s, &[fx::NAMED_ENTITY]);
    assert_eq!(
        status_at(&d, &Position::span(fx::NAMED_ENTITY, 0, 0)),
        Agreement::Disagree
    );
}

#[test]
fn curator_items_are_collected_but_not_considered() {
    let s = fx::incomplete_pos();
    let curator = AnnotatorId::curator();
    let mut sources: Vec<(AnnotatorId, &AnnotationGraph)> = s
        .annotators
        .iter()
        .map(|(n, g)| (AnnotatorId::from(n.as_str()), g))
        .collect();
    sources.push((curator.clone(), &s.curator));

    let d = compute_diff(&[fx::POS], &s.policies, sources).unwrap();
    assert!(!d.annotators().contains(&curator));
    assert_eq!(d.graph_of(&curator), Some(s.curator.id()));

    let set = d.configuration_set(&Position::span(fx::POS, 0, 4)).unwrap();
    assert_eq!(set.count_of(&curator), 1);
    assert_eq!(set.configurations().len(), 2);
    assert_eq!(d.classify(set), Agreement::Incomplete);
}

#[test]
fn relations_align_by_endpoint_positions() {
    let s = fx::mixed_document();
    let d = diff(&s, &[fx::DEPENDENCY]);

    let summary = d.summary();
    assert_eq!(summary.counts.total, 2);
    assert_eq!(summary.counts.agree, 2);
    assert!(d.iter().all(|set| set.position().is_relation()));
}

#[test]
fn summary_counts_per_type() {
    let s = fx::mixed_document();
    let d = diff(&s, &fx::entry_types().iter().map(String::as_str).collect::<Vec<_>>());
    let summary = d.summary();

    let pos = &summary.by_type[fx::POS];
    assert_eq!((pos.agree, pos.disagree, pos.incomplete), (2, 1, 0));
    assert_eq!(summary.by_type[fx::NAMED_ENTITY].agree, 1);
    assert_eq!(summary.by_type[fx::EVENT].total, 3);
    assert_eq!(
        summary.counts.total,
        summary.counts.agree + summary.counts.disagree + summary.counts.incomplete
    );
}

#[test]
fn rows_are_in_position_order() {
    let s = fx::mixed_document();
    let d = diff(&s, &fx::entry_types().iter().map(String::as_str).collect::<Vec<_>>());
    let rows = d.rows();
    let begins: Vec<usize> = rows.iter().map(|r| r.position.begin()).collect();
    let mut sorted = begins.clone();
    sorted.sort_unstable();
    assert_eq!(begins, sorted);

    let json = serde_json::to_value(&rows[0]).unwrap();
    assert!(json["position"].is_string());
}

fn slot_statuses(d: &DiffResult) -> Vec<Agreement> {
    d.iter().filter(|set| set.is_slot()).map(|set| d.classify(set)).collect()
}

#[test]
fn by_target_keys_slots_on_role() {
    let policies = || fx::link_policies(LinkCompareMode::ByTarget);

    let moved = fx::single_argument_events(policies(), ("agent", 0), ("agent", 2));
    let d = diff(&moved, &[fx::EVENT]);
    assert_eq!(slot_statuses(&d), vec![Agreement::Disagree]);

    let renamed = fx::single_argument_events(policies(), ("agent", 0), ("patient", 0));
    let d = diff(&renamed, &[fx::EVENT]);
    assert_eq!(
        slot_statuses(&d),
        vec![Agreement::Incomplete, Agreement::Incomplete]
    );

    let same = fx::single_argument_events(policies(), ("agent", 0), ("agent", 0));
    assert_eq!(slot_statuses(&diff(&same, &[fx::EVENT])), vec![Agreement::Agree]);
}

#[test]
fn by_both_keys_slots_on_role_and_target() {
    let policies = || fx::link_policies(LinkCompareMode::ByBoth);

    for (alice, bob) in [(("agent", 0), ("agent", 2)), (("agent", 0), ("patient", 0))] {
        let s = fx::single_argument_events(policies(), alice, bob);
        let d = diff(&s, &[fx::EVENT]);
        assert_eq!(
            slot_statuses(&d),
            vec![Agreement::Incomplete, Agreement::Incomplete]
        );
        assert_eq!(status_at(&d, &Position::span(fx::EVENT, 0, 14)), Agreement::Agree);
    }

    let same = fx::single_argument_events(policies(), ("agent", 0), ("agent", 0));
    assert_eq!(slot_statuses(&diff(&same, &[fx::EVENT])), vec![Agreement::Agree]);
}

#[test]
fn unresolvable_reference_forces_disagreement() {
    let policies = PolicyTable::new()
        .with(LayerPolicy::relation(fx::DEPENDENCY, "governor", "dependent"))
        .with(LayerPolicy::span("Note").compare("about"));

    let graphs: Vec<(AnnotatorId, AnnotationGraph)> = ["alice", "bob"]
        .into_iter()
        .map(|name| {
            let (mut g, t) = fx::tokenized();
            let loose = g
                .build(fx::DEPENDENCY, 5, 9)
                .attr("governor", Value::Ref(None))
                .attr("dependent", t[1])
                .insert()
                .unwrap();
            g.build("Note", 0, 4).attr("about", loose).insert().unwrap();
            (AnnotatorId::from(name), g)
        })
        .collect();

    let d = DiffEngine::new(&policies)
        .compute(&["Note"], graphs.iter().map(|(a, g)| (a.clone(), g)))
        .unwrap();
    let set = d.configuration_set(&Position::span("Note", 0, 4)).unwrap();
    assert!(set.is_non_comparable());
    assert_eq!(set.configurations().len(), 2);
    assert_eq!(d.classify(set), Agreement::Disagree);
}
