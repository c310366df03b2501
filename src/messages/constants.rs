//! Protocol constants of the iDx / BankID message set.

/// Namespace of the merchant-acquirer iDx messages.
pub const IDX_NAMESPACE: &str =
    "http://www.betaalvereniging.nl/iDx/messages/Merchant-Acquirer/1.0.0";
/// Product id carried on every iDx root element.
pub const IDX_PRODUCT_ID: &str = "NL:BVN:BankID:1.0";
/// iDx message set version.
pub const IDX_VERSION: &str = "1.0.0";

/// SAML protocol namespace, used by the AuthnRequest and the response.
pub const SAML_PROTOCOL_NAMESPACE: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
/// SAML assertion namespace.
pub const SAML_ASSERTION_NAMESPACE: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// Protocol binding requested in the AuthnRequest.
pub const BANKID_PROTOCOL_BINDING: &str = "nl:bvn:bankid:1.0:protocol:iDx";
/// Version attribute of the AuthnRequest.
pub const AUTHN_REQUEST_VERSION: &str = "2.0";
