//! Logging initialization and configuration.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Crates whose events the configured level applies to. Dependencies log at warn.
const OWN_TARGETS: [&str; 5] = ["turnout", "turnout_api", "domain", "persistence", "shared"];

fn default_filter(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(OWN_TARGETS.iter().map(|t| format!("{}={}", t, level)));
    directives.push(format!("tower_http={}", level));
    directives.join(",")
}

/// Initializes the logging subsystem based on configuration.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true);
            subscriber.with(json_layer).init();
        }
        _ => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true);
            subscriber.with(pretty_layer).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_level_to_own_crates() {
        let filter = default_filter("debug");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("domain=debug"));
        assert!(filter.contains("turnout_api=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }
}
