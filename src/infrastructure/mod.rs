pub mod postgres;
pub mod template;
