//! XML-Enc decryption for encrypted SAML attributes.
//!
//! Each encrypted attribute carries its own `EncryptedData` element with a
//! companion `EncryptedKey`: the AES content key is RSA-OAEP wrapped for the
//! merchant's SAML certificate, the attribute plaintext is AES-CBC encrypted
//! with ISO 10126 padding. Decryption replaces the encrypted element in
//! place with the recovered plaintext element.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use openssl::symm::{Cipher, Crypter, Mode};
use tracing::debug;
use xmltree::{Element, XMLNode};

use crate::crypto::CertificateKeyPair;
use crate::error::CommunicatorError;

const AES_BLOCK_SIZE: usize = 16;

/// The symmetric key recovered while decrypting one SAML attribute, kept for
/// audit purposes. `attribute_name` is `None` for the anonymous identity
/// element, which carries no `Name` attribute.
#[derive(Debug, Clone)]
pub struct SamlAttributesEncryptionKey {
    pub attribute_name: Option<String>,
    pub aes_key: Vec<u8>,
}

/// Decrypt every element whose local name appears in `element_names`,
/// in document order, replacing it with its decrypted content.
///
/// Returns the decrypted document together with the symmetric key recovered
/// for each element. Any failure aborts the whole operation.
pub fn decrypt_xml(
    key_pair: &CertificateKeyPair,
    xml: &str,
    element_names: &[&str],
) -> Result<(String, Vec<SamlAttributesEncryptionKey>), CommunicatorError> {
    let mut root = Element::parse(xml.as_bytes())?;
    let mut keys = Vec::new();

    decrypt_element(key_pair, &mut root, element_names, &mut keys)?;

    let mut out = Vec::new();
    root.write(&mut out)
        .map_err(|e| CommunicatorError::Xml(e.to_string()))?;
    let decrypted =
        String::from_utf8(out).map_err(|e| CommunicatorError::Xml(e.to_string()))?;

    debug!(count = keys.len(), "decrypted SAML attribute elements");
    Ok((decrypted, keys))
}

fn decrypt_element(
    key_pair: &CertificateKeyPair,
    element: &mut Element,
    element_names: &[&str],
    keys: &mut Vec<SamlAttributesEncryptionKey>,
) -> Result<(), CommunicatorError> {
    for index in 0..element.children.len() {
        let replacement = match &element.children[index] {
            XMLNode::Element(child) if element_names.contains(&child.name.as_str()) => {
                Some(decrypt_single(key_pair, child)?)
            }
            _ => None,
        };

        match replacement {
            Some((plain, key)) => {
                if let Some(key) = key {
                    keys.push(key);
                }
                element.children[index] = XMLNode::Element(plain);
            }
            None => {
                if let XMLNode::Element(child) = &mut element.children[index] {
                    decrypt_element(key_pair, child, element_names, keys)?;
                }
            }
        }
    }
    Ok(())
}

/// Decrypt one `EncryptedID`/`EncryptedAttribute` element and return the
/// recovered plaintext element plus its audit key record.
fn decrypt_single(
    key_pair: &CertificateKeyPair,
    encrypted: &Element,
) -> Result<(Element, Option<SamlAttributesEncryptionKey>), CommunicatorError> {
    let encrypted_data = find_descendant(encrypted, "EncryptedData")
        .ok_or_else(|| CommunicatorError::Decryption("missing EncryptedData element".into()))?;
    let encrypted_key = find_descendant(encrypted_data, "EncryptedKey")
        .ok_or_else(|| CommunicatorError::Decryption("missing EncryptedKey element".into()))?;

    let wrapped_key = cipher_value(encrypted_key)?;
    let aes_key = key_pair
        .rsa_oaep_decrypt(&wrapped_key)
        .map_err(|e| CommunicatorError::Decryption(format!("RSA-OAEP key unwrap failed: {e}")))?;

    // The data CipherData sits directly under EncryptedData; the one found
    // inside EncryptedKey must not be picked up here.
    let data_cipher = direct_child(encrypted_data, "CipherData")
        .and_then(|cd| direct_child(cd, "CipherValue"))
        .and_then(Element::get_text)
        .ok_or_else(|| CommunicatorError::Decryption("missing content CipherValue".into()))?;
    let payload = BASE64
        .decode(data_cipher.split_whitespace().collect::<String>())
        .map_err(|e| CommunicatorError::Decryption(format!("invalid base64 ciphertext: {e}")))?;

    if payload.len() < 2 * AES_BLOCK_SIZE {
        return Err(CommunicatorError::Decryption(
            "ciphertext shorter than IV plus one block".into(),
        ));
    }
    let (iv, ciphertext) = payload.split_at(AES_BLOCK_SIZE);
    let plaintext = aes_cbc_decrypt(&aes_key, iv, ciphertext)?;

    let plain_element = Element::parse(plaintext.as_slice())
        .map_err(|e| CommunicatorError::Decryption(format!("decrypted data is not XML: {e}")))?;

    // The anonymous identity element has no attributes at all; named
    // attributes identify themselves through a Name attribute.
    let record = if plain_element.attributes.is_empty() {
        Some(SamlAttributesEncryptionKey {
            attribute_name: None,
            aes_key,
        })
    } else {
        plain_element
            .attributes
            .get("Name")
            .map(|name| SamlAttributesEncryptionKey {
                attribute_name: Some(name.clone()),
                aes_key: aes_key.clone(),
            })
    };

    Ok((plain_element, record))
}

fn cipher_value(element: &Element) -> Result<Vec<u8>, CommunicatorError> {
    let text = find_descendant(element, "CipherValue")
        .and_then(Element::get_text)
        .ok_or_else(|| CommunicatorError::Decryption("missing CipherValue".into()))?;
    BASE64
        .decode(text.split_whitespace().collect::<String>())
        .map_err(|e| CommunicatorError::Decryption(format!("invalid base64 cipher value: {e}")))
}

fn direct_child<'a>(element: &'a Element, local_name: &str) -> Option<&'a Element> {
    element.children.iter().find_map(|node| match node {
        XMLNode::Element(child) if child.name == local_name => Some(child),
        _ => None,
    })
}

fn find_descendant<'a>(element: &'a Element, local_name: &str) -> Option<&'a Element> {
    for node in &element.children {
        if let XMLNode::Element(child) = node {
            if child.name == local_name {
                return Some(child);
            }
            if let Some(found) = find_descendant(child, local_name) {
                return Some(found);
            }
        }
    }
    None
}

fn aes_cbc_decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CommunicatorError> {
    let cipher = cipher_for_key(key.len())?;

    let mut decrypter = Crypter::new(cipher, Mode::Decrypt, key, Some(iv))
        .map_err(|e| CommunicatorError::Decryption(e.to_string()))?;
    decrypter.pad(false);

    let mut plaintext = vec![0u8; ciphertext.len() + AES_BLOCK_SIZE];
    let mut count = decrypter
        .update(ciphertext, &mut plaintext)
        .map_err(|e| CommunicatorError::Decryption(e.to_string()))?;
    count += decrypter
        .finalize(&mut plaintext[count..])
        .map_err(|e| CommunicatorError::Decryption(e.to_string()))?;
    plaintext.truncate(count);

    iso_10126_unpad(&mut plaintext)?;
    Ok(plaintext)
}

fn cipher_for_key(len: usize) -> Result<Cipher, CommunicatorError> {
    match len {
        16 => Ok(Cipher::aes_128_cbc()),
        24 => Ok(Cipher::aes_192_cbc()),
        32 => Ok(Cipher::aes_256_cbc()),
        other => Err(CommunicatorError::Decryption(format!(
            "unsupported AES key length: {other}"
        ))),
    }
}

/// Strip ISO 10126 padding: the final byte gives the padding length, the
/// filler bytes before it are random.
fn iso_10126_unpad(data: &mut Vec<u8>) -> Result<(), CommunicatorError> {
    let pad_len = *data
        .last()
        .ok_or_else(|| CommunicatorError::Decryption("empty plaintext".into()))?
        as usize;
    if pad_len == 0 || pad_len > AES_BLOCK_SIZE || pad_len > data.len() {
        return Err(CommunicatorError::Decryption("invalid ISO 10126 padding".into()));
    }
    data.truncate(data.len() - pad_len);
    Ok(())
}
