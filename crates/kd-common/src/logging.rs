//! Structured Logging Configuration
//!
//! - JSON output for log shipping (LOG_FORMAT=json)
//! - Human-readable output for terminals (default)
//!
//! # Usage
//!
//! ```rust,ignore
//! use kd_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("kd-cli");
//!     tracing::info!(path = "/Jobs", "Fetching jobs");
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" for JSON output, anything else for text (default: text)
//! - `RUST_LOG`: standard filter (default: `warn` for dependencies, `info` for ours).
//!   Example: `RUST_LOG=kd_sdk=debug`
//!
//! The request pipeline opens a span per request carrying `request_id`,
//! `method` and `path`, so nested refresh and replay logs stay attributable.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "warn,kd_sdk=info,kd_config=info,kd_cli=info";

/// Initialize logging for the given service.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(service_name: &str) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    let env_filter = default_filter();

    let initialized = if log_format.eq_ignore_ascii_case("json") {
        init_json_logging(env_filter)
    } else {
        init_text_logging(env_filter)
    };

    if initialized {
        tracing::debug!(service = service_name, format = %log_format, "Logging initialized");
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn init_json_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}

fn init_text_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::new(DEFAULT_FILTER);
        drop(filter);
    }

    #[test]
    fn test_repeated_init_does_not_panic() {
        init_logging("test");
        init_logging("test");
    }
}
