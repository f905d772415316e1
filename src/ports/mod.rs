pub mod catalog_port;
pub mod renderer_port;
