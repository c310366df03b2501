#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bankid_merchant::config::{Configuration, ServiceLogsConfig};
use bankid_merchant::crypto::{Certificate, CertificateKeyPair};
use bankid_merchant::error::CommunicatorError;
use bankid_merchant::transport::Messenger;
use openssl::asn1::Asn1Time;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::{Padding, Rsa};
use openssl::symm::{Cipher, Crypter, Mode};
use openssl::x509::{X509, X509NameBuilder};
use rand::RngCore;
use reqwest::Url;

const AES_BLOCK_SIZE: usize = 16;

/// Generate a fresh self-signed certificate and matching private key, both
/// PEM encoded.
pub fn self_signed_pair(common_name: &str) -> (Vec<u8>, Vec<u8>) {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    (
        cert.to_pem().unwrap(),
        key.private_key_to_pem_pkcs8().unwrap(),
    )
}

/// Everything a test needs to play both sides of the exchange: the merchant
/// configuration plus the private keys of the routing service and the bank.
pub struct TestContext {
    pub configuration: Configuration,
    pub routing_key_pair: CertificateKeyPair,
    pub bank_key_pair: CertificateKeyPair,
    pub saml_certificate_pem: Vec<u8>,
}

pub fn test_context() -> TestContext {
    let (merchant_cert, merchant_key) = self_signed_pair("merchant.example");
    let (routing_cert, routing_key) = self_signed_pair("routing.example");
    let (bank_cert, bank_key) = self_signed_pair("bank.example");
    let (saml_cert, saml_key) = self_signed_pair("saml.merchant.example");

    let configuration = Configuration {
        acquirer_id: "0001".to_string(),
        merchant_id: "1234567890".to_string(),
        merchant_sub_id: 42,
        merchant_return_url: Url::parse("https://merchant.example/return").unwrap(),
        acquirer_directory_url: Url::parse("https://acquirer.example/directory").unwrap(),
        acquirer_transaction_url: Url::parse("https://acquirer.example/transaction").unwrap(),
        acquirer_status_url: Url::parse("https://acquirer.example/status").unwrap(),
        merchant_key_pair: CertificateKeyPair::from_pem(&merchant_cert, &merchant_key).unwrap(),
        routing_service_certificate: Certificate::from_pem(&routing_cert).unwrap(),
        alternate_routing_service_certificate: None,
        saml_key_pair: CertificateKeyPair::from_pem(&saml_cert, &saml_key).unwrap(),
        service_logs: ServiceLogsConfig {
            enabled: false,
            ..Default::default()
        },
    };

    TestContext {
        configuration,
        routing_key_pair: CertificateKeyPair::from_pem(&routing_cert, &routing_key).unwrap(),
        bank_key_pair: CertificateKeyPair::from_pem(&bank_cert, &bank_key).unwrap(),
        saml_certificate_pem: saml_cert,
    }
}

/// Canned-response transport that records every outgoing message. The log
/// handle stays usable after the messenger moves into the communicator.
pub struct MockMessenger {
    response: String,
    sent: Arc<Mutex<Vec<(String, Url)>>>,
}

impl MockMessenger {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent_log(&self) -> Arc<Mutex<Vec<(String, Url)>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, message: &str, url: &Url) -> Result<String, CommunicatorError> {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), url.clone()));
        Ok(self.response.clone())
    }
}

fn iso_10126_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = AES_BLOCK_SIZE - (data.len() % AES_BLOCK_SIZE);
    let mut padded = data.to_vec();
    let mut filler = vec![0u8; pad_len - 1];
    rand::rng().fill_bytes(&mut filler);
    padded.extend_from_slice(&filler);
    padded.push(pad_len as u8);
    padded
}

/// XML-Enc encrypt `plaintext` for the holder of `recipient_cert_pem`:
/// AES-256-CBC with ISO 10126 padding, key RSA-OAEP wrapped, wrapped in the
/// given element (`EncryptedID` or `EncryptedAttribute`).
pub fn encrypt_element(recipient_cert_pem: &[u8], plaintext: &str, wrapper: &str) -> String {
    let mut aes_key = [0u8; 32];
    rand::rng().fill_bytes(&mut aes_key);
    let mut iv = [0u8; AES_BLOCK_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let padded = iso_10126_pad(plaintext.as_bytes());
    let mut encrypter =
        Crypter::new(Cipher::aes_256_cbc(), Mode::Encrypt, &aes_key, Some(&iv)).unwrap();
    encrypter.pad(false);
    let mut ciphertext = vec![0u8; padded.len() + AES_BLOCK_SIZE];
    let mut count = encrypter.update(&padded, &mut ciphertext).unwrap();
    count += encrypter.finalize(&mut ciphertext[count..]).unwrap();
    ciphertext.truncate(count);

    let mut payload = iv.to_vec();
    payload.extend_from_slice(&ciphertext);

    let recipient = X509::from_pem(recipient_cert_pem).unwrap();
    let rsa = recipient.public_key().unwrap().rsa().unwrap();
    let mut wrapped = vec![0u8; rsa.size() as usize];
    let len = rsa
        .public_encrypt(&aes_key, &mut wrapped, Padding::PKCS1_OAEP)
        .unwrap();
    wrapped.truncate(len);

    format!(
        concat!(
            "<{w}>",
            "<xenc:EncryptedData xmlns:xenc=\"http://www.w3.org/2001/04/xmlenc#\">",
            "<xenc:EncryptionMethod Algorithm=\"http://www.w3.org/2001/04/xmlenc#aes256-cbc\"/>",
            "<ds:KeyInfo xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">",
            "<xenc:EncryptedKey>",
            "<xenc:EncryptionMethod Algorithm=\"http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p\"/>",
            "<xenc:CipherData><xenc:CipherValue>{key}</xenc:CipherValue></xenc:CipherData>",
            "</xenc:EncryptedKey>",
            "</ds:KeyInfo>",
            "<xenc:CipherData><xenc:CipherValue>{data}</xenc:CipherValue></xenc:CipherData>",
            "</xenc:EncryptedData>",
            "</{w}>"
        ),
        w = wrapper,
        key = BASE64.encode(&wrapped),
        data = BASE64.encode(&payload),
    )
}
