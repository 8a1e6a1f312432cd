//! Benchmarks for the diff engine, sequential vs parallel

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use curation_diff::{AnnotatorId, DiffEngine, DiffOptions};
use curation_graph::AnnotationGraph;
use curation_test_utils as fx;

fn annotated(tokens: usize, seed: usize) -> AnnotationGraph {
    let mut g = AnnotationGraph::new();
    let mut handles = Vec::with_capacity(tokens);
    for i in 0..tokens {
        let begin = i * 5;
        handles.push(g.build(fx::TOKEN, begin, begin + 4).insert().unwrap());
        let tag = if (i + seed) % 7 == 0 { "VB" } else { "NN" };
        fx::pos(&mut g, begin, begin + 4, tag);
    }
    for pair in handles.windows(2) {
        fx::dependency(&mut g, pair[0], pair[1], "dep");
    }
    g
}

fn bench_diff(c: &mut Criterion) {
    let policies = fx::standard_policies();
    let types = [fx::POS, fx::DEPENDENCY];
    let mut group = c.benchmark_group("diff");

    for &tokens in &[100, 1_000, 5_000] {
        let graphs: Vec<(AnnotatorId, AnnotationGraph)> = (0..4)
            .map(|i| (AnnotatorId::new(format!("a{i}")), annotated(tokens, i)))
            .collect();

        for (label, parallel) in [("sequential", false), ("parallel", true)] {
            let engine = DiffEngine::new(&policies)
                .with_options(DiffOptions::default().with_parallel(parallel));
            group.bench_with_input(BenchmarkId::new(label, tokens), &graphs, |b, graphs| {
                b.iter(|| {
                    let diff = engine
                        .compute(&types, graphs.iter().map(|(a, g)| (a.clone(), g)))
                        .unwrap();
                    black_box(diff.len())
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_diff);
criterion_main!(benches);
