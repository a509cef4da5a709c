/// Tracing subscriber setup shared by the binaries.
///
/// `RUST_LOG` always wins. Without it the service logs at info, or at debug
/// (one line per request) when started with `--verbose`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "climate_service=debug,info"
    } else {
        "climate_service=info"
    }
}

pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();
}
