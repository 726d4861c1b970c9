use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use super::TracingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies
/// globally with this crate raised to debug.
pub fn init_tracing(config: TracingConfig) {
    let default_filter = format!("{},contavoz=debug", config.level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let events = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if config.json_format {
        registry.with(events.json()).init();
    } else {
        registry.with(events).init();
    }

    tracing::info!(
        environment = %config.environment,
        json_format = config.json_format,
        "Tracing initialized"
    );
}
