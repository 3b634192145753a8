use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "air_quality_etl=info";
const VERBOSE_FILTER: &str = "air_quality_etl=debug,info";

fn env_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) => EnvFilter::new(format!("air_quality_etl={}", level)),
        None if verbose => EnvFilter::new(VERBOSE_FILTER),
        None => EnvFilter::new(DEFAULT_FILTER),
    })
}

/// Installs the global subscriber. `RUST_LOG` overrides both `verbose` and
/// `level`; `json` switches to one JSON object per line.
pub fn init_cli_logger(verbose: bool, level: Option<&str>, json: bool) {
    let filter = env_filter(verbose, level);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}
