//! Observability setup for DocuTalk: the tracing subscriber and the
//! optional OpenTelemetry span exporter.

pub mod tracing_setup;
