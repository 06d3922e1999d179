use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

/// Install the global fmt subscriber. Later calls, or calls after another
/// subscriber was set, are no-ops.
pub fn init_logging(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
