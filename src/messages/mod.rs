//! Building and parsing of the iDx messages exchanged with the routing
//! service.

pub mod constants;
pub mod datetime;
pub mod directory;
pub mod error_res;
pub mod status;
pub mod transaction;
