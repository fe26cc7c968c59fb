//! Observability bootstrap for hamlet.

pub mod tracing_setup;
