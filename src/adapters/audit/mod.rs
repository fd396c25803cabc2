pub mod memory;
pub mod tracing_sink;
