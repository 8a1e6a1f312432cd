//! Log subscriber setup
//!
//! Logs go to stderr so reports on stdout stay machine-readable. `RUST_LOG`
//! overrides the level derived from `-v`/`-q`.

use tracing::metadata::LevelFilter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Install the global subscriber
///
/// Does nothing if a subscriber is already installed (tests).
pub fn init(verbosity: u8, quiet: bool, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_flags(verbosity, quiet).into())
        .from_env_lossy();

    let output: Box<dyn Layer<Registry> + Send + Sync> = if json {
        Box::new(fmt::layer().json().with_writer(std::io::stderr))
    } else {
        Box::new(fmt::layer().with_target(false).with_writer(std::io::stderr))
    };
    let layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![output, Box::new(filter)];

    if Registry::default().with(layers).try_init().is_err() {
        tracing::debug!("subscriber already installed");
    }
}

fn level_from_flags(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
