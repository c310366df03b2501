//! XML signature verification for incoming acquirer responses.
//!
//! A response carries one signature from the Routing Service over the whole
//! document, and a status response with a delivered assertion carries a
//! second signature from the issuing bank inside the assertion. Both are
//! enveloped RSA-SHA256 signatures; the transport signature names its
//! certificate by thumbprint, the bank signature embeds its certificate.

use std::ops::Range;
use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::utils::{
    attribute_value, canonicalize, element_span, element_text, inject_dsig_namespace,
    remove_signatures, signature_spans,
};
use crate::crypto::Certificate;
use crate::error::CommunicatorError;
use crate::saml::STATUS_SUCCESS;

/// The only algorithm suite accepted in incoming signatures: exclusive
/// C14N, RSA-SHA256, SHA-256 digests and the enveloped-signature
/// transform. Patterns tolerate any namespace prefix.
fn algorithm_profile_checks() -> &'static [Regex; 5] {
    static CHECKS: OnceLock<[Regex; 5]> = OnceLock::new();
    CHECKS.get_or_init(|| {
        [
            Regex::new(
                r#"<(([^<>:]*):)?CanonicalizationMethod[^">]+"http://www\.w3\.org/2001/10/xml-exc-c14n#""#,
            )
            .expect("valid pattern"),
            Regex::new(
                r#"<(([^<>:]*):)?SignatureMethod[^">]+"http://www\.w3\.org/2001/04/xmldsig-more#rsa-sha256""#,
            )
            .expect("valid pattern"),
            Regex::new(
                r#"<(([^<>:]*):)?Transform[^">]+"http://www\.w3\.org/2000/09/xmldsig#enveloped-signature""#,
            )
            .expect("valid pattern"),
            Regex::new(
                r#"<(([^<>:]*):)?Transform[^">]+"http://www\.w3\.org/2001/10/xml-exc-c14n#""#,
            )
            .expect("valid pattern"),
            Regex::new(
                r#"<(([^<>:]*):)?DigestMethod[^">]+"http://www\.w3\.org/2001/04/xmlenc#sha256""#,
            )
            .expect("valid pattern"),
        ]
    })
}

fn issuer_close_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</(?:[A-Za-z0-9_.-]+:)?Issuer>\s*$").expect("valid pattern"))
}

/// Verify the signature(s) on a response document.
///
/// The last signature in the document is the transport signature; its
/// `KeyName` must match the thumbprint of one of the trusted certificates.
/// When the document carries exactly two signatures, the first one is
/// verified as the bank's assertion signature; a second signature on a
/// response without a successful SAML status is a protocol violation.
pub fn verify_response_signature(
    xml: &str,
    trusted_certificates: &[Certificate],
) -> Result<(), CommunicatorError> {
    let spans = signature_spans(xml);
    match spans.len() {
        0 => {
            return Err(CommunicatorError::Signature(
                "no signature found in response".to_string(),
            ));
        }
        1 | 2 => {}
        n => {
            return Err(CommunicatorError::Signature(format!(
                "unsupported number of signatures in response: {n}"
            )));
        }
    }

    let transport = spans[spans.len() - 1].clone();
    let signature_xml = &xml[transport];
    let key_name = element_text(signature_xml, "KeyName").ok_or_else(|| {
        CommunicatorError::Signature("response signature carries no KeyName".to_string())
    })?;

    let mut certificate = None;
    for candidate in trusted_certificates {
        if candidate.thumbprint()?.eq_ignore_ascii_case(&key_name) {
            certificate = Some(candidate);
            break;
        }
    }
    let certificate = certificate.ok_or_else(|| {
        CommunicatorError::Signature(format!(
            "no trusted certificate matches signature KeyName {key_name}"
        ))
    })?;

    if !check_signature(xml, signature_xml, certificate)? {
        return Err(CommunicatorError::Signature(
            "response signature verification failed".to_string(),
        ));
    }
    info!(key_name, "response signature verified");

    if spans.len() == 2 {
        verify_assertion_signature(xml, spans[0].clone())?;
    }
    Ok(())
}

/// Verify a single enveloped signature against the document it covers.
///
/// Returns `false` when the signature does not match the allowed algorithm
/// profile, the digest does not cover the document, or the signature value
/// does not verify under the certificate.
pub fn check_signature(
    document: &str,
    signature_xml: &str,
    certificate: &Certificate,
) -> Result<bool, CommunicatorError> {
    if !algorithm_profile_checks()
        .iter()
        .all(|check| check.is_match(signature_xml))
    {
        warn!("signature does not match the allowed algorithm profile");
        return Ok(false);
    }

    let expected_digest = element_text(signature_xml, "DigestValue").ok_or_else(|| {
        CommunicatorError::Signature("signature carries no DigestValue".to_string())
    })?;
    let canonical_content = canonicalize(&remove_signatures(document))?;
    let content_digest = BASE64.encode(Sha256::digest(canonical_content.as_bytes()));
    if content_digest != expected_digest {
        warn!("digest value does not match the signed content");
        return Ok(false);
    }

    let signature_value = element_text(signature_xml, "SignatureValue").ok_or_else(|| {
        CommunicatorError::Signature("signature carries no SignatureValue".to_string())
    })?;
    let signature_bytes = BASE64
        .decode(signature_value.split_whitespace().collect::<String>())
        .map_err(|e| CommunicatorError::Signature(format!("invalid signature value: {e}")))?;

    let (signed_info_range, written_name) = element_span(signature_xml, "SignedInfo")
        .ok_or_else(|| {
            CommunicatorError::Signature("signature carries no SignedInfo".to_string())
        })?;
    let signed_info = inject_dsig_namespace(&signature_xml[signed_info_range], &written_name);
    let canonical_signed_info = canonicalize(&signed_info)?;

    certificate.verify_sha256(canonical_signed_info.as_bytes(), &signature_bytes)
}

/// Verify the bank's signature over the delivered assertion.
///
/// A second signature is only legitimate on a successful SAML status; the
/// signature must sit inside the assertion directly after its issuer, and
/// is verified against the certificate it embeds.
fn verify_assertion_signature(
    xml: &str,
    signature_range: Range<usize>,
) -> Result<(), CommunicatorError> {
    if attribute_value(xml, "StatusCode", "Value").as_deref() != Some(STATUS_SUCCESS) {
        return Err(CommunicatorError::Signature(
            "response with a non-success status should not carry a bank signature".to_string(),
        ));
    }

    let (assertion_range, _) = element_span(xml, "Assertion").ok_or_else(|| {
        CommunicatorError::Signature(
            "successful status response carries no assertion".to_string(),
        )
    })?;
    if signature_range.start < assertion_range.start
        || signature_range.end > assertion_range.end
    {
        return Err(CommunicatorError::Signature(
            "assertion signature is outside the assertion element".to_string(),
        ));
    }
    let preceding = &xml[assertion_range.start..signature_range.start];
    if !issuer_close_re().is_match(preceding) {
        return Err(CommunicatorError::Signature(
            "assertion signature is not positioned after the issuer".to_string(),
        ));
    }

    let signature_xml = &xml[signature_range.clone()];
    let certificate_b64 = element_text(signature_xml, "X509Certificate").ok_or_else(|| {
        CommunicatorError::Signature("assertion signature embeds no certificate".to_string())
    })?;
    let certificate_der = BASE64
        .decode(certificate_b64.split_whitespace().collect::<String>())
        .map_err(|e| {
            CommunicatorError::Signature(format!("invalid assertion certificate: {e}"))
        })?;
    let certificate = Certificate::from_der(&certificate_der)?;

    let assertion_xml = &xml[assertion_range.clone()];
    let relative = (signature_range.start - assertion_range.start)
        ..(signature_range.end - assertion_range.start);
    if !check_signature(assertion_xml, &assertion_xml[relative], &certificate)? {
        return Err(CommunicatorError::Signature(
            "assertion signature verification failed".to_string(),
        ));
    }
    info!("assertion signature verified");
    Ok(())
}
