//! Subscriber setup shared by the `cindex` and `csearch` binaries.

use tracing_subscriber::EnvFilter;

/// Log to stderr, keeping stdout for results.
///
/// `RUST_LOG` picks the filter; without it only warnings are shown.
/// `verbose` raises this workspace's crates to `debug` either way.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,csearch=debug,cindex=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
