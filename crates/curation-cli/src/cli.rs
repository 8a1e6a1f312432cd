//! Command line definition

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Multi-annotator diff and curator merge
#[derive(Parser, Debug)]
#[command(name = "curation", version, arg_required_else_help = true)]
pub struct Cli {
    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Debug output (repeat for more)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Errors only
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Align annotator graphs and classify every position
    Diff(DiffArgs),

    /// Diff, then populate the curator graph with agreed annotations
    Merge(MergeArgs),
}

/// Files every command reads
#[derive(Args, Debug)]
pub struct Inputs {
    /// Layer policy and option file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Document bundle (JSON)
    #[arg(long, value_name = "PATH")]
    pub bundle: PathBuf,
}

/// `curation diff`
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Index graphs on the calling thread only
    #[arg(long)]
    pub sequential: bool,
}

/// `curation merge`
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Write the merged curator graph here (JSON)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Merge positions only some annotators annotated, if they agree
    #[arg(long)]
    pub merge_incomplete: bool,

    /// Clear the curator's entry-type annotations first
    #[arg(long)]
    pub bootstrap: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_merge_flags() {
        let cli = Cli::try_parse_from([
            "curation",
            "merge",
            "--config",
            "c.toml",
            "--bundle",
            "b.json",
            "--merge-incomplete",
            "--out",
            "merged.json",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        let Command::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        assert!(args.merge_incomplete);
        assert!(!args.bootstrap);
        assert_eq!(args.out, Some(PathBuf::from("merged.json")));
    }
}
