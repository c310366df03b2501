/// SAML first/second level status code: request succeeded.
pub const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";
/// SAML status code: error on the part of the requester.
pub const STATUS_REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";
/// SAML status code: the request was denied.
pub const STATUS_REQUEST_DENIED: &str = "urn:oasis:names:tc:SAML:2.0:status:RequestDenied";
/// SAML status code: the request is not supported.
pub const STATUS_REQUEST_UNSUPPORTED: &str =
    "urn:oasis:names:tc:SAML:2.0:status:RequestUnsupported";
/// SAML status code: an attribute name or value was invalid.
pub const STATUS_INVALID_ATTR_NAME_OR_VALUE: &str =
    "urn:oasis:names:tc:SAML:2.0:status:InvalidAttrNameOrValue";
/// BankID status code: the SAML content does not match the iDx envelope.
pub const STATUS_MISMATCH_WITH_IDX: &str = "urn:nl:bvn:bankid:1.0:status:MismatchWithIDx";

/// Two-level SAML status delivered with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlStatus {
    /// Human-readable message, when the responder supplied one.
    pub status_message: Option<String>,
    pub status_code_first_level: String,
    pub status_code_second_level: String,
}

impl SamlStatus {
    /// Both status levels report success.
    pub fn is_success(&self) -> bool {
        self.status_code_first_level == STATUS_SUCCESS
            && self.status_code_second_level == STATUS_SUCCESS
    }
}
