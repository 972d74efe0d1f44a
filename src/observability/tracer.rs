//! Tracer provider that exports spans to a rotating local file.
//!
//! The plugin sandbox has no network access worth relying on, so spans are
//! written as OTLP/JSON lines instead of being sent to a collector.

use super::file_writer::{RotatingFile, RotationPolicy};
use super::span_formatter::SpanFormatter;
use futures_util::future::BoxFuture;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Instrumentation scope name used for every exported span.
pub const SCOPE_NAME: &str = "aclwatch";

#[derive(Debug)]
struct FileSpanExporter {
    file: RotatingFile,
    formatter: SpanFormatter,
    stopped: AtomicBool,
}

impl SpanExporter for FileSpanExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = if self.stopped.load(Ordering::SeqCst) {
            Err(TraceError::from("file exporter already shut down"))
        } else {
            let line = self.formatter.format_batch(&batch).to_string();
            self.file
                .write_line(&line)
                .map_err(|e| TraceError::from(e.to_string()))
        };
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Builds a provider that synchronously writes each finished span to
/// `file_path`, rotating according to `rotation`.
pub fn create_tracer_provider(
    file_path: PathBuf,
    resource: Resource,
    rotation: RotationPolicy,
) -> TracerProvider {
    let exporter = FileSpanExporter {
        file: RotatingFile::new(file_path, rotation),
        formatter: SpanFormatter::new(resource.clone(), SCOPE_NAME),
        stopped: AtomicBool::new(false),
    };

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}
