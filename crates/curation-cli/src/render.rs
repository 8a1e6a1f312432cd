//! Text and JSON rendering of reports

use curation_diff::{DiffResult, DiffRow, DiffSummary};
use curation_merge::{MergeReport, MergeTotals, Outcome};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct DiffOutput {
    summary: DiffSummary,
    rows: Vec<DiffRow>,
}

#[derive(Serialize)]
struct MergeOutput<'a> {
    #[serde(flatten)]
    report: &'a MergeReport,
    totals: MergeTotals,
}

/// Write a diff
///
/// # Errors
/// Write failures
pub fn diff(out: &mut dyn Write, diff: &DiffResult, json: bool) -> io::Result<()> {
    if json {
        let output = DiffOutput {
            summary: diff.summary(),
            rows: diff.rows(),
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        return writeln!(out);
    }

    for row in diff.rows() {
        writeln!(out, "{:<40} {}", row.position.to_string(), row.agreement)?;
        for view in &row.configurations {
            writeln!(out, "    {}  [{}]", view.value, view.annotators.join(", "))?;
        }
    }
    let summary = diff.summary();
    writeln!(out)?;
    writeln!(
        out,
        "Positions: {}  Agree: {}  Disagree: {}  Incomplete: {}",
        summary.counts.total, summary.counts.agree, summary.counts.disagree, summary.counts.incomplete
    )?;
    for (type_name, counts) in &summary.by_type {
        writeln!(
            out,
            "  {type_name}: {} agree, {} disagree, {} incomplete",
            counts.agree, counts.disagree, counts.incomplete
        )?;
    }
    Ok(())
}

/// Write a merge report
///
/// # Errors
/// Write failures
pub fn merge(out: &mut dyn Write, report: &MergeReport, json: bool) -> io::Result<()> {
    let totals = report.totals();
    if json {
        serde_json::to_writer_pretty(&mut *out, &MergeOutput { report, totals })?;
        return writeln!(out);
    }

    for entry in &report.entries {
        writeln!(
            out,
            "{:<40} {:<10} {}",
            entry.position.to_string(),
            entry.agreement.to_string(),
            outcome(&entry.outcome)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Merge Report:")?;
    writeln!(out, "  Merged: {}", totals.merged)?;
    writeln!(out, "  Unchanged: {}", totals.unchanged)?;
    writeln!(out, "  Preserved: {}", totals.preserved)?;
    writeln!(
        out,
        "  Skipped: {} incomplete, {} disagreement",
        totals.skipped_incomplete, totals.skipped_disagreement
    )?;
    writeln!(out, "  Displaced: {}", totals.displaced)?;
    writeln!(out, "  Host not merged: {}", totals.host_not_merged)?;
    writeln!(out, "  Errored: {}", totals.errored)?;
    writeln!(out, "  Curator nodes removed: {}", totals.removed)?;
    writeln!(out, "  Link arrays rewritten: {}", report.links_rewritten)?;
    Ok(())
}

fn outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Merged => "merged".into(),
        Outcome::Unchanged => "unchanged".into(),
        Outcome::Preserved => "preserved".into(),
        Outcome::SkippedIncomplete { removed } => format!("skipped (incomplete, {removed} removed)"),
        Outcome::SkippedDisagreement { removed } => {
            format!("skipped (disagreement, {removed} removed)")
        }
        Outcome::Displaced { by } => format!("removed (displaced by {by})"),
        Outcome::HostNotMerged => "skipped (host not merged)".into(),
        Outcome::Errored(error) => format!("error: {error}"),
    }
}
