//! SAML response handling: status codes, attribute validation and parsing
//! of the `samlp:Response` delivered inside a status response.

pub mod attribute;
pub mod response;
pub mod status;

pub use attribute::SamlAttribute;
pub use response::SamlResponse;
pub use status::{
    STATUS_INVALID_ATTR_NAME_OR_VALUE, STATUS_MISMATCH_WITH_IDX, STATUS_REQUEST_DENIED,
    STATUS_REQUEST_UNSUPPORTED, STATUS_REQUESTER, STATUS_SUCCESS, SamlStatus,
};
