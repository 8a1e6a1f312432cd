//! Curation CLI
//!
//! Library side of the `curation` binary: argument definitions, bundle
//! loading, command execution and report rendering.
//!
//! ```text
//! curation diff  --config layers.toml --bundle doc.json [--json]
//! curation merge --config layers.toml --bundle doc.json [--out merged.json]
//!                [--merge-incomplete] [--bootstrap] [--json]
//! ```

#![warn(unreachable_pub)]

pub mod bundle;
pub mod cli;
pub mod commands;
pub mod render;
pub mod telemetry;

pub use bundle::{Bundle, LoadedBundle};
pub use cli::{Cli, Command};
pub use commands::execute;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
