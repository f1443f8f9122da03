//! Observability for Buddy: subscriber setup and span naming.

pub mod spans;
pub mod tracing_setup;
