use tracing_subscriber::EnvFilter;

use crate::args::OutputArgs;

fn default_level(output: &OutputArgs) -> &'static str {
    if output.log {
        "debug"
    } else if output.quiet {
        "warn"
    } else {
        "info"
    }
}

/// Diagnostics go to stderr so listings on stdout stay clean. `RUST_LOG`
/// overrides the level picked from the flags.
pub fn init(output: &OutputArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level(output).into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
