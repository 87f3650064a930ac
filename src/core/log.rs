// Tracing setup for the assetbook CLI and its persistence server
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Events of this crate go to stderr at DEBUG with `--verbose` and WARN
/// otherwise, so failed remote reads and writes always show. `RUST_LOG`
/// replaces the default filter when set.
pub fn init_logging(verbose: bool) {
    let crate_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let crate_events = Targets::new().with_target(env!("CARGO_CRATE_NAME"), crate_level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(crate_level.into()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_target(verbose)
                .with_writer(std::io::stderr),
        )
        .with(crate_events)
        .with(env_filter)
        .init();
}
