//! tracing subscriber setup.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "summa-pdf.log";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. When `log_dir` is given, events are
/// also written to a daily rolling file there; keep the returned guard alive
/// until exit so buffered lines are flushed.
pub fn init(default_filter: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// Default filter for a run mode
pub fn default_filter(verbose: bool, serving: bool) -> &'static str {
    match (verbose, serving) {
        (true, _) => "summa_pdf=debug",
        (false, true) => "summa_pdf=info",
        (false, false) => "summa_pdf=warn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_picks_filter() {
        assert_eq!(default_filter(true, false), "summa_pdf=debug");
        assert_eq!(default_filter(false, true), "summa_pdf=info");
        assert_eq!(default_filter(false, false), "summa_pdf=warn");
    }
}
