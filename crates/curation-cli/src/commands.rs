//! Command execution

use crate::bundle::{Bundle, LoadedBundle};
use crate::cli::{Cli, Command, DiffArgs, Inputs, MergeArgs};
use crate::render;
use anyhow::Context;
use curation_diff::{AnnotatorId, DiffEngine};
use curation_merge::CurationConfig;
use std::io::Write;
use tracing::info;

/// Run the parsed command, writing its report to `out`
///
/// Returns `false` when a merge left errored positions behind.
///
/// # Errors
/// Unreadable inputs, fatal diff or reconcile errors, write failures
pub fn execute(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    match &cli.command {
        Command::Diff(args) => diff(args, cli.json, out).map(|()| true),
        Command::Merge(args) => merge(args, cli.json, out),
    }
}

fn load(inputs: &Inputs) -> anyhow::Result<(CurationConfig, LoadedBundle)> {
    let config = CurationConfig::load(&inputs.config)?;
    let bundle = Bundle::load(&inputs.bundle)?.into_graphs()?;
    Ok((config, bundle))
}

fn diff(args: &DiffArgs, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let (config, bundle) = load(&args.inputs)?;
    let mut options = config.diff.clone();
    if args.sequential {
        options = options.with_parallel(false);
    }

    let curator = bundle.curator.as_ref().map(|g| (AnnotatorId::curator(), g));
    let result = DiffEngine::new(&config.layers)
        .with_options(options)
        .compute(&config.entry_types(), bundle.sources().chain(curator))
        .context("diff failed")?;

    render::diff(out, &result, json)?;
    Ok(())
}

fn merge(args: &MergeArgs, json: bool, out: &mut dyn Write) -> anyhow::Result<bool> {
    let (config, LoadedBundle { annotators, curator }) = load(&args.inputs)?;
    let mut options = config.merge;
    if args.merge_incomplete {
        options = options.with_merge_incomplete(true);
    }
    if args.bootstrap {
        options = options.with_bootstrap(true);
    }
    let config = config.with_merge_options(options);

    let mut curator = curator.unwrap_or_default();
    let report = config
        .reconciler()
        .run(
            &config.entry_types(),
            &mut curator,
            annotators.iter().map(|(id, g)| (id.clone(), g)),
        )
        .context("merge rejected")?;

    render::merge(out, &report, json)?;

    if let Some(path) = &args.out {
        let text = curator.to_document().to_json_pretty()?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), nodes = curator.len(), "curator graph written");
    }
    Ok(report.is_clean())
}

