use std::io;

use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to stderr so stdout only carries rendered output.
/// Respects `RUST_LOG`, falls back to `warn,devlab=info`.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,devlab=info"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}
