//! Enveloped XML-DSig signing of outgoing acquirer messages and SAML
//! authentication requests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::se::to_string;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::constants::*;
use super::types::*;
use super::utils::{apply_prefix, canonicalize, remove_signatures};
use crate::crypto::CertificateKeyPair;
use crate::error::CommunicatorError;

fn create_reference(digest_value: String) -> Reference {
    Reference {
        uri: "".to_string(),
        transforms: Transforms {
            transform: vec![
                Transform {
                    algorithm: XMLDSIG_ENVELOPED_SIGNATURE.to_string(),
                },
                Transform {
                    algorithm: EXCLUSIVE_C14N_ALGORITHM.to_string(),
                },
            ],
        },
        digest_method: DigestMethod {
            algorithm: SHA256_DIGEST_ALGORITHM.to_string(),
        },
        digest_value,
    }
}

/// Sign an XML document with an enveloped RSA-SHA256 signature and return
/// the document with the signature inserted.
///
/// The digest covers the exclusive-canonical form of the document with all
/// existing signatures removed, so a document holding an already-signed
/// embedded assertion can be counter-signed without invalidating either
/// signature.
pub fn sign_xml(
    key_pair: &CertificateKeyPair,
    xml: &str,
    options: &SignOptions<'_>,
) -> Result<String, CommunicatorError> {
    debug!(prefix = ?options.prefix, key_info = ?options.key_info, "signing XML document");

    // Step 1: digest of the referenced content, enveloped transform applied
    let content = remove_signatures(xml);
    let canonical_content = canonicalize(&content)?;
    let content_digest = Sha256::digest(canonical_content.as_bytes());
    let reference = create_reference(BASE64.encode(content_digest));

    // Step 2: canonicalize and sign the standalone SignedInfo. The
    // verifier rebuilds this exact byte sequence from the document.
    let signed_info = SignedInfo {
        xmlns: Some(XMLDSIG_NAMESPACE.to_string()),
        canonicalization_method: CanonicalizationMethod {
            algorithm: EXCLUSIVE_C14N_ALGORITHM.to_string(),
        },
        signature_method: SignatureMethod {
            algorithm: RSA_SHA256_ALGORITHM.to_string(),
        },
        reference: reference.clone(),
    };
    let mut signed_info_xml = to_string(&signed_info)?;
    if let Some(prefix) = options.prefix {
        signed_info_xml = apply_prefix(&signed_info_xml, prefix);
    }
    let canonical_signed_info = canonicalize(&signed_info_xml)?;
    let signature_value = key_pair.sign_sha256(canonical_signed_info.as_bytes())?;

    // Step 3: assemble the complete Signature element
    let key_info = match options.key_info {
        KeyInfoKind::Thumbprint => KeyInfo {
            key_name: Some(key_pair.certificate().thumbprint()?),
            x509_data: None,
        },
        KeyInfoKind::EmbeddedCertificate => KeyInfo {
            key_name: None,
            x509_data: Some(X509Data {
                x509_certificate: X509Certificate {
                    certificate: BASE64.encode(key_pair.certificate().to_der()?),
                },
            }),
        },
    };
    let signature = Signature {
        xmlns: XMLDSIG_NAMESPACE.to_string(),
        signed_info: SignedInfo {
            // the parent Signature element carries the namespace
            xmlns: None,
            canonicalization_method: CanonicalizationMethod {
                algorithm: EXCLUSIVE_C14N_ALGORITHM.to_string(),
            },
            signature_method: SignatureMethod {
                algorithm: RSA_SHA256_ALGORITHM.to_string(),
            },
            reference,
        },
        signature_value: SignatureValue {
            value: BASE64.encode(&signature_value),
        },
        key_info,
    };
    let mut signature_xml = to_string(&signature)?;
    if let Some(prefix) = options.prefix {
        signature_xml = apply_prefix(&signature_xml, prefix);
    }

    insert_signature(xml, &signature_xml, options.insert_after)
}

/// Insert the signature after the named closing tag, or as the last child
/// of the document element.
fn insert_signature(
    xml: &str,
    signature: &str,
    insert_after: Option<&str>,
) -> Result<String, CommunicatorError> {
    let position = match insert_after {
        Some(name) => {
            let close = format!("</{name}>");
            xml.find(&close)
                .map(|p| p + close.len())
                .ok_or_else(|| CommunicatorError::Xml(format!("element not found: {name}")))?
        }
        None => xml
            .rfind("</")
            .ok_or_else(|| CommunicatorError::Xml("document has no closing tag".to_string()))?,
    };
    Ok(format!(
        "{}{}{}",
        &xml[..position],
        signature,
        &xml[position..]
    ))
}
