//! End-to-end runs of the `curation` commands on files

use clap::Parser;
use curation_cli::{execute, Bundle, Cli};
use curation_graph::{AnnotationGraph, GraphDocument};
use curation_test_utils as fx;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const LAYERS: &str = r#"
[diff]
parallel = false

[[layers]]
type = "POS"
kind = "span"
compared = ["value"]

[[layers]]
type = "NamedEntity"
kind = "span"
compared = ["value"]

[[layers]]
type = "Dependency"
kind = "relation"
source = "governor"
target = "dependent"
compared = ["label"]

[[layers]]
type = "Event"
kind = "span"
compared = ["value"]
links = [{ name = "args", mode = "by_role" }]
"#;

fn workspace(dir: &Path) -> (PathBuf, PathBuf) {
    let scenario = fx::mixed_document();
    let bundle = Bundle {
        annotators: scenario
            .annotators
            .iter()
            .map(|(name, g)| (name.clone(), g.to_document()))
            .collect(),
        curator: Some(scenario.curator.to_document()),
    };

    let config = dir.join("layers.toml");
    let bundle_path = dir.join("doc.json");
    std::fs::write(&config, LAYERS).unwrap();
    std::fs::write(&bundle_path, serde_json::to_string_pretty(&bundle).unwrap()).unwrap();
    (config, bundle_path)
}

fn run(args: &[&str]) -> (anyhow::Result<bool>, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let result = execute(&cli, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn diff_prints_positions_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (config, bundle) = workspace(dir.path());

    let (result, text) = run(&[
        "curation",
        "diff",
        "--config",
        config.to_str().unwrap(),
        "--bundle",
        bundle.to_str().unwrap(),
    ]);
    assert!(result.unwrap());
    assert!(text.contains("POS[10-14]"));
    assert!(text.contains("DISAGREE"));
    assert!(text.contains("Positions:"));
}

#[test]
fn diff_json_has_summary_counts() {
    let dir = tempfile::tempdir().unwrap();
    let (config, bundle) = workspace(dir.path());

    let (result, text) = run(&[
        "curation",
        "diff",
        "--json",
        "--sequential",
        "--config",
        config.to_str().unwrap(),
        "--bundle",
        bundle.to_str().unwrap(),
    ]);
    assert!(result.unwrap());
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["summary"]["disagree"], 1);
    assert_eq!(json["summary"]["by_type"]["POS"]["agree"], 2);
    assert!(json["rows"].as_array().unwrap().len() >= 7);
}

#[test]
fn merge_writes_curator_graph() {
    let dir = tempfile::tempdir().unwrap();
    let (config, bundle) = workspace(dir.path());
    let out = dir.path().join("merged.json");

    let (result, text) = run(&[
        "curation",
        "merge",
        "--json",
        "--config",
        config.to_str().unwrap(),
        "--bundle",
        bundle.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(result.unwrap());

    let report: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["totals"]["skipped_disagreement"], 1);
    assert_eq!(report["totals"]["errored"], 0);

    let doc = GraphDocument::from_json(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let merged = AnnotationGraph::from_document(&doc).unwrap();
    assert_eq!(merged.nodes_of_type(fx::POS).count(), 2);
    assert_eq!(merged.nodes_of_type(fx::DEPENDENCY).count(), 2);
    let event = merged.select_at(fx::EVENT, 0, 14)[0];
    assert_eq!(merged.node(event).unwrap().links("args").len(), 2);
}

#[test]
fn merge_text_report_lists_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let (config, bundle) = workspace(dir.path());

    let (result, text) = run(&[
        "curation",
        "merge",
        "--config",
        config.to_str().unwrap(),
        "--bundle",
        bundle.to_str().unwrap(),
    ]);
    assert!(result.unwrap());
    assert!(text.contains("Merge Report:"));
    assert!(text.contains("skipped (disagreement, 0 removed)"));
}

#[test]
fn missing_bundle_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = workspace(dir.path());
    let missing = dir.path().join("absent.json");

    let (result, _) = run(&[
        "curation",
        "merge",
        "--config",
        config.to_str().unwrap(),
        "--bundle",
        missing.to_str().unwrap(),
    ]);
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}
