pub mod exporter;
pub mod runtime;
