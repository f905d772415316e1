pub mod catalog_adapter;
pub mod connection_manager;
pub mod param_aliases;
pub mod query_store;
