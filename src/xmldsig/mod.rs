//! Enveloped XML-DSig signing and verification.
//!
//! Outgoing acquirer messages and SAML authentication requests are signed
//! here; incoming responses are verified against the Routing Service
//! certificates and, for delivered assertions, against the issuing bank's
//! embedded certificate.

pub mod constants;
pub mod signer;
pub mod types;
pub mod utils;
pub mod validator;

#[cfg(test)]
pub mod test_support;

pub use signer::sign_xml;
pub use types::{KeyInfoKind, SignOptions};
pub use validator::{check_signature, verify_response_signature};
