//! OpenTelemetry-based observability with file-based trace export.
//!
//! ```text
//! tracing macros → tracing-opentelemetry → SDK provider → FileSpanExporter → aclwatch-otlp.json
//! ```
//!
//! # Features
//!
//! - **File-Based Export**: `~/.local/share/zellij/aclwatch/aclwatch-otlp.json`
//! - **Rotation**: size threshold and backup count from [`crate::Config`]
//! - **OTLP Format**: one OTLP/JSON document per line
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `tracer`: Tracer provider with the file exporter
//! - `span_formatter`: OTLP/JSON span encoding
//! - `file_writer`: Size-rotated line writer

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use init::{init_tracing, TRACE_FILE_NAME};
