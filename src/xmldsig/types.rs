//! Serde data structures for building XML-DSig signature elements.

use serde::{Deserialize, Serialize};

/// Generic XML element with algorithm attribute - used for various signature
/// components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmElement {
    #[serde(rename = "@Algorithm")]
    pub algorithm: String,
}

// Type aliases for better readability
pub type CanonicalizationMethod = AlgorithmElement;
pub type SignatureMethod = AlgorithmElement;
pub type DigestMethod = AlgorithmElement;
pub type Transform = AlgorithmElement;

/// XML transforms container. Carries both the enveloped-signature transform
/// and the exclusive canonicalization transform.
#[derive(Debug, Clone, Serialize)]
pub struct Transforms {
    #[serde(rename = "Transform")]
    pub transform: Vec<Transform>,
}

/// XML reference element
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    #[serde(rename = "@URI")]
    pub uri: String,
    #[serde(rename = "Transforms")]
    pub transforms: Transforms,
    #[serde(rename = "DigestMethod")]
    pub digest_method: DigestMethod,
    #[serde(rename = "DigestValue")]
    pub digest_value: String,
}

/// XML SignedInfo element with optional namespace
#[derive(Debug, Serialize)]
pub struct SignedInfo {
    #[serde(rename = "@xmlns", skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    #[serde(rename = "CanonicalizationMethod")]
    pub canonicalization_method: CanonicalizationMethod,
    #[serde(rename = "SignatureMethod")]
    pub signature_method: SignatureMethod,
    #[serde(rename = "Reference")]
    pub reference: Reference,
}

/// XML SignatureValue element
#[derive(Debug, Serialize)]
pub struct SignatureValue {
    #[serde(rename = "$text")]
    pub value: String,
}

/// XML X509Certificate element
#[derive(Debug, Serialize)]
pub struct X509Certificate {
    #[serde(rename = "$text")]
    pub certificate: String,
}

/// XML X509Data element
#[derive(Debug, Serialize)]
pub struct X509Data {
    #[serde(rename = "X509Certificate")]
    pub x509_certificate: X509Certificate,
}

/// XML KeyInfo element. Either names the signing certificate through its
/// thumbprint (`KeyName`) or embeds the full certificate (`X509Data`).
#[derive(Debug, Serialize)]
pub struct KeyInfo {
    #[serde(rename = "KeyName", skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(rename = "X509Data", skip_serializing_if = "Option::is_none")]
    pub x509_data: Option<X509Data>,
}

/// Complete XML Signature element
#[derive(Debug, Serialize)]
pub struct Signature {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    #[serde(rename = "SignedInfo")]
    pub signed_info: SignedInfo,
    #[serde(rename = "SignatureValue")]
    pub signature_value: SignatureValue,
    #[serde(rename = "KeyInfo")]
    pub key_info: KeyInfo,
}

/// How the signer advertises its certificate in `KeyInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInfoKind {
    /// `KeyName` holding the certificate's SHA-1 thumbprint. Used on the
    /// acquirer channel, where the receiver holds the certificate already.
    Thumbprint,
    /// `X509Data`/`X509Certificate` embedding the base64 DER certificate.
    /// Used on SAML assertions.
    EmbeddedCertificate,
}

/// Signing options controlling prefix, key advertisement and placement.
#[derive(Debug, Clone)]
pub struct SignOptions<'a> {
    /// Namespace prefix applied to every signature element, e.g. `ds`.
    /// `None` leaves the signature in the default namespace.
    pub prefix: Option<&'a str>,
    pub key_info: KeyInfoKind,
    /// Closing tag (as written in the document, e.g. `saml:Issuer`) after
    /// which the signature is inserted. `None` appends it as the last child
    /// of the document element.
    pub insert_after: Option<&'a str>,
}

impl Default for SignOptions<'_> {
    fn default() -> Self {
        Self {
            prefix: None,
            key_info: KeyInfoKind::Thumbprint,
            insert_after: None,
        }
    }
}
