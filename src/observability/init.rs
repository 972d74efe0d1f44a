//! Tracing subscriber setup.

use super::file_writer::RotationPolicy;
use super::tracer::{self, SCOPE_NAME};
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name of the trace output inside the data directory.
pub const TRACE_FILE_NAME: &str = "aclwatch-otlp.json";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global tracing subscriber.
///
/// The filter comes from `config.trace_level` (default `"info"`); an invalid
/// directive falls back to `"info"`. Spans are exported as OTLP/JSON to
/// `aclwatch-otlp.json` in the plugin data directory.
///
/// Observability is optional: if the data directory cannot be created, or a
/// subscriber is already installed, this returns without doing anything. Only
/// the first call has an effect.
///
/// # Example
///
/// ```no_run
/// use aclwatch::observability::init_tracing;
/// use aclwatch::Config;
///
/// init_tracing(&Config {
///     trace_level: Some("aclwatch=debug".to_string()),
///     ..Default::default()
/// });
/// ```
pub fn init_tracing(config: &Config) {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    init_tracing_in(&crate::infrastructure::get_data_dir(), config);
}

fn init_tracing_in(dir: &Path, config: &Config) {
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }

    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let resource = Resource::new(vec![
        KeyValue::new("service.name", SCOPE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    let rotation = RotationPolicy {
        max_bytes: config.trace_max_bytes,
        backups: config.trace_backups,
    };

    let provider = tracer::create_tracer_provider(dir.join(TRACE_FILE_NAME), resource, rotation);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SCOPE_NAME));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init();
}
