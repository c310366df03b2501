//! The status request/response pair: poll the outcome of a transaction.

pub mod builder;
pub mod model;
pub mod parser;

pub use builder::build_status_request;
