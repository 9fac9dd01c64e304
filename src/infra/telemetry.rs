use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so `render` output on stdout stays a clean document.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "splitrender_store_read_total",
            Unit::Count,
            "Total number of preference store reads."
        );
        describe_counter!(
            "splitrender_store_mutation_total",
            Unit::Count,
            "Total number of committed preference mutations, labelled by operation."
        );
        describe_histogram!(
            "splitrender_store_mutation_ms",
            Unit::Milliseconds,
            "Preference mutation latency in milliseconds, including simulated delay."
        );
        describe_gauge!(
            "splitrender_store_pending_mutations",
            Unit::Count,
            "Mutations started but not yet committed."
        );
        describe_counter!(
            "splitrender_revalidation_total",
            Unit::Count,
            "Total number of path revalidations, labelled by event kind."
        );
    });
}
