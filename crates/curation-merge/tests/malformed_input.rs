//! Inputs that do not fit the diff are rejected before any mutation

use curation_graph::AnnotationGraph;
use curation_merge::{
    compute_diff, AnnotatorId, DiffEngine, DiffError, MergeOptions, ReconcileError, Reconciler,
};
use curation_test_utils as fx;

fn id(name: &str) -> AnnotatorId {
    AnnotatorId::from(name)
}

#[test]
fn replaced_annotator_graph_is_malformed() {
    let mut s = fx::incomplete_pos();
    let (alice, bob) = (&s.annotators[0].1, &s.annotators[1].1);
    let diff = compute_diff(&[fx::POS], &s.policies, [(id("alice"), alice), (id("bob"), bob)])
        .unwrap();
    let before = s.curator.to_document();

    let impostor = fx::tokenized().0;
    let reconciler = Reconciler::new(&s.policies, MergeOptions::default());
    let err = reconciler
        .reconcile(
            &diff,
            &mut s.curator,
            [(id("alice"), alice), (id("bob"), &impostor)],
        )
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Malformed(_)));
    assert!(err.is_malformed());
    assert_eq!(s.curator.to_document(), before);
}

#[test]
fn missing_annotator_graph_is_malformed() {
    let mut s = fx::agreeing_pos();
    let (alice, bob) = (&s.annotators[0].1, &s.annotators[1].1);
    let diff = compute_diff(&[fx::POS], &s.policies, [(id("alice"), alice), (id("bob"), bob)])
        .unwrap();

    let reconciler = Reconciler::new(&s.policies, MergeOptions::default());
    let err = reconciler
        .reconcile(&diff, &mut s.curator, [(id("alice"), alice)])
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Malformed(_)));
    assert!(s.curator.select_at(fx::POS, 0, 4).is_empty());
}

#[test]
fn stale_handle_is_rejected() {
    let s = fx::agreeing_pos();
    let mut alice = s.annotator("alice").clone();
    let diff = compute_diff(
        &[fx::POS],
        &s.policies,
        [(id("alice"), &alice), (id("bob"), s.annotator("bob"))],
    )
    .unwrap();

    let doomed = alice.select_at(fx::POS, 0, 4)[0];
    alice.remove(doomed).unwrap();

    let mut curator = s.curator.clone();
    let err = Reconciler::new(&s.policies, MergeOptions::default())
        .reconcile(
            &diff,
            &mut curator,
            [(id("alice"), &alice), (id("bob"), s.annotator("bob"))],
        )
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Graph(_)));
    assert!(err.is_malformed());
    assert_eq!(curator.len(), s.curator.len());
}

#[test]
fn diff_against_another_curator_is_malformed() {
    let s = fx::incomplete_pos();
    let diff = DiffEngine::new(&s.policies)
        .compute(
            &[fx::POS],
            [
                (id("alice"), s.annotator("alice")),
                (id("bob"), s.annotator("bob")),
                (AnnotatorId::curator(), &s.curator),
            ],
        )
        .unwrap();

    let mut other = fx::tokenized().0;
    let err = Reconciler::new(&s.policies, MergeOptions::default())
        .reconcile(
            &diff,
            &mut other,
            [(id("alice"), s.annotator("alice")), (id("bob"), s.annotator("bob"))],
        )
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Malformed(_)));
    assert_eq!(other.len(), fx::TOKENS.len());
}

#[test]
fn curator_passed_as_annotator_is_rejected() {
    let s = fx::agreeing_pos();
    let mut curator = s.curator.clone();
    let snapshot = curator.clone();

    let err = Reconciler::new(&s.policies, MergeOptions::default())
        .run(
            &[fx::POS],
            &mut curator,
            [(id("alice"), s.annotator("alice")), (AnnotatorId::curator(), &snapshot)],
        )
        .unwrap_err();
    assert_eq!(
        err,
        ReconcileError::Diff(DiffError::DuplicateAnnotator(AnnotatorId::curator()))
    );
    assert_eq!(curator.len(), snapshot.len());
}

#[test]
fn entry_type_without_policy_is_rejected() {
    let s = fx::agreeing_pos();
    let mut curator: AnnotationGraph = s.curator.clone();
    let err = Reconciler::new(&s.policies, MergeOptions::default())
        .run(&["Lemma"], &mut curator, [(id("alice"), s.annotator("alice"))])
        .unwrap_err();
    assert_eq!(
        err,
        ReconcileError::Diff(DiffError::UnknownEntryType("Lemma".into()))
    );
}
