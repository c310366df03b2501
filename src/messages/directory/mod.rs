//! The directory request/response pair: which issuers can the consumer
//! choose from.

pub mod builder;
pub mod model;
pub mod parser;

pub use builder::build_directory_request;
