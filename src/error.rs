use thiserror::Error;

/// Which side of the exchange produced a schema-invalid document.
///
/// A request-phase failure is a merchant-side bug; a response-phase failure
/// points at the acquirer or at transport corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPhase {
    Request,
    Response,
}

impl std::fmt::Display for SchemaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaPhase::Request => write!(f, "request"),
            SchemaPhase::Response => write!(f, "response"),
        }
    }
}

/// Error type for everything that can go wrong between building a request
/// and handing back a parsed response.
#[derive(Debug, Error)]
pub enum CommunicatorError {
    /// A required configuration field is missing or invalid. Raised before
    /// any network activity.
    #[error("the configuration parameter is not configured: {0}")]
    Configuration(String),

    /// Malformed request input (merchant reference format, expiration range,
    /// document id / service id combination). Raised at construction time.
    #[error("invalid request: {0}")]
    RequestValidation(String),

    /// The request or response XML failed XSD validation.
    #[error("{phase} XML schema is not valid: {message}")]
    Schema {
        phase: SchemaPhase,
        message: String,
    },

    /// Response signature missing, signed with an unknown certificate, or
    /// not matching the expected algorithm profile.
    #[error("signature error: {0}")]
    Signature(String),

    /// The outer envelope reported success but the embedded SAML content is
    /// inconsistent or carries a non-success status.
    #[error("SAML error: {0}")]
    Saml(String),

    /// Non-success HTTP status or network fault.
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// RSA/AES failure while recovering SAML attributes.
    #[error("error decrypting data: {0}")]
    Decryption(String),

    /// The document could not be built, serialized or deserialized.
    #[error("XML error: {0}")]
    Xml(String),

    /// OpenSSL-level failure during signing or verification.
    #[error("crypto error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}

impl From<quick_xml::SeError> for CommunicatorError {
    fn from(e: quick_xml::SeError) -> Self {
        CommunicatorError::Xml(e.to_string())
    }
}

impl From<quick_xml::DeError> for CommunicatorError {
    fn from(e: quick_xml::DeError) -> Self {
        CommunicatorError::Xml(e.to_string())
    }
}

impl From<xmltree::ParseError> for CommunicatorError {
    fn from(e: xmltree::ParseError) -> Self {
        CommunicatorError::Xml(e.to_string())
    }
}

impl From<std::io::Error> for CommunicatorError {
    fn from(e: std::io::Error) -> Self {
        CommunicatorError::Xml(e.to_string())
    }
}
