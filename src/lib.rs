//! Merchant-side client library for bank-identity (BankID/iDIN style)
//! authentication over the iDx protocol: message building and parsing,
//! XML-DSig signing and verification, XSD validation, SAML attribute
//! decryption and the HTTPS exchange itself.
//!
//! The entry point is [`Communicator`], built from a [`Configuration`]
//! (usually loaded through [`config::Config`]). Each operation returns a
//! typed response that reports failure in-band via `is_error()`.

pub mod communicator;
pub mod config;
pub mod crypto;
pub mod error;
pub mod messages;
pub mod requests;
pub mod responses;
pub mod saml;
pub mod schema;
pub mod service_logs;
pub mod telemetry;
pub mod transport;
pub mod xmldsig;

pub use communicator::Communicator;
pub use config::{Config, Configuration};
pub use crypto::{Certificate, CertificateKeyPair, SamlAttributesEncryptionKey};
pub use error::{CommunicatorError, SchemaPhase};
pub use requests::{
    AssuranceLevel, AuthenticationOptions, AuthenticationRequest, ServiceIds, StatusRequest,
};
pub use responses::{
    AuthenticationResponse, DirectoryResponse, ErrorResponse, Issuer, StatusResponse,
};
pub use saml::{SamlAttribute, SamlResponse, SamlStatus};
pub use transport::{HttpMessenger, Messenger};
