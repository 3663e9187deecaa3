use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console plus daily-rolling JSON file logging. `RUST_LOG` overrides the
/// default filter.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "flow_scraper.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flow_scraper=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    // The guard flushes buffered lines; hold it for the process lifetime.
    std::mem::forget(guard);
}
