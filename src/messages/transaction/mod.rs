//! The transaction request/response pair: start a new authentication at
//! the consumer's issuer.

pub mod authn;
pub mod builder;
pub mod model;
pub mod parser;

pub use authn::build_authn_request;
pub use builder::build_transaction_request;
