use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose` when set.
///
/// An embedding application may already have installed its own subscriber;
/// that one is kept and events keep flowing to it.
pub fn init(verbose: bool) {
    let default_level = if verbose { "page_reader=debug" } else { "page_reader=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .try_init();
    if let Err(e) = installed {
        debug!(error = %e, "global subscriber already set, keeping it");
    }
}
