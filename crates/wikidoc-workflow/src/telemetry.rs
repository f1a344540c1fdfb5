use std::io;

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the caller supplies one.
pub const DEFAULT_DIRECTIVES: &str = "warn,wikidoc=info,wikidoc_workflow=info";

/// Installs the global stderr subscriber for workflow runs.
///
/// `RUST_LOG` takes precedence over `directives`. Returns `false` when a subscriber was
/// already installed, in which case nothing changes.
pub fn init_tracing(directives: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives.unwrap_or(DEFAULT_DIRECTIVES)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .is_ok()
}
