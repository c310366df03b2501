//! Algorithm URIs and element names used by the XML-DSig implementation.

/// XML namespace URIs
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const XMLDSIG_ENVELOPED_SIGNATURE: &str =
    "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// Algorithm URIs
pub const RSA_SHA256_ALGORITHM: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const SHA256_DIGEST_ALGORITHM: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
pub const EXCLUSIVE_C14N_ALGORITHM: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

/// Element local names rewritten when a namespace prefix is applied to a
/// generated signature. Order matters: longer names first so that e.g.
/// `SignatureValue` is not clobbered by the `Signature` rewrite.
pub const SIGNATURE_ELEMENT_NAMES: &[&str] = &[
    "CanonicalizationMethod",
    "SignatureMethod",
    "SignatureValue",
    "X509Certificate",
    "DigestMethod",
    "DigestValue",
    "SignedInfo",
    "Transforms",
    "Transform",
    "Reference",
    "Signature",
    "X509Data",
    "KeyInfo",
    "KeyName",
];
