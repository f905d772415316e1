pub mod entities;
pub mod errors;
pub mod type_mapper;
