use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::Padding;
use openssl::sign::{Signer, Verifier};
use openssl::x509::X509;

use crate::error::CommunicatorError;

/// An X.509 certificate used to verify signatures coming from the Routing
/// Service, or embedded in a SAML assertion's KeyInfo.
#[derive(Debug, Clone)]
pub struct Certificate {
    x509: X509,
}

impl Certificate {
    /// Load from PEM-encoded certificate data.
    pub fn from_pem(pem_bytes: impl AsRef<[u8]>) -> Result<Self, CommunicatorError> {
        let x509 = X509::from_pem(pem_bytes.as_ref())?;
        Ok(Self { x509 })
    }

    /// Load from DER-encoded certificate data.
    pub fn from_der(der_bytes: impl AsRef<[u8]>) -> Result<Self, CommunicatorError> {
        let x509 = X509::from_der(der_bytes.as_ref())?;
        Ok(Self { x509 })
    }

    /// SHA-1 fingerprint of the certificate as uppercase hex, no separators.
    /// This is the value carried in the `KeyName` element of signed messages.
    pub fn thumbprint(&self) -> Result<String, CommunicatorError> {
        let digest = self.x509.digest(MessageDigest::sha1())?;
        Ok(hex::encode_upper(digest.as_ref()))
    }

    /// DER encoding of the certificate, used for `X509Certificate` KeyInfo.
    pub fn to_der(&self) -> Result<Vec<u8>, CommunicatorError> {
        Ok(self.x509.to_der()?)
    }

    /// Verify an RSA-SHA256 signature over `data` with this certificate's
    /// public key.
    pub fn verify_sha256(
        &self,
        data: impl AsRef<[u8]>,
        signature: &[u8],
    ) -> Result<bool, CommunicatorError> {
        let public_key: PKey<Public> = self.x509.public_key()?;
        let mut verifier = Verifier::new(MessageDigest::sha256(), &public_key)?;
        verifier.update(data.as_ref())?;
        Ok(verifier.verify(signature)?)
    }

    pub(crate) fn x509(&self) -> &X509 {
        &self.x509
    }
}

/// A certificate together with its RSA private key. Used for signing
/// outgoing messages (merchant certificate) and for decrypting SAML
/// attributes (SAML certificate).
#[derive(Debug, Clone)]
pub struct CertificateKeyPair {
    certificate: Certificate,
    key: PKey<Private>,
}

impl CertificateKeyPair {
    /// Load certificate and private key from PEM data.
    pub fn from_pem(
        cert_pem: impl AsRef<[u8]>,
        key_pem: impl AsRef<[u8]>,
    ) -> Result<Self, CommunicatorError> {
        let certificate = Certificate::from_pem(cert_pem)?;
        let key = PKey::private_key_from_pem(key_pem.as_ref())?;
        Ok(Self { certificate, key })
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// RSA-SHA256 signature over `data`.
    pub fn sign_sha256(&self, data: impl AsRef<[u8]>) -> Result<Vec<u8>, CommunicatorError> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.key)?;
        signer.update(data.as_ref())?;
        Ok(signer.sign_to_vec()?)
    }

    /// Unwrap an RSA-OAEP (SHA-1) encrypted key-transport blob, as used by
    /// XML-Enc `EncryptedKey` elements.
    pub fn rsa_oaep_decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CommunicatorError> {
        let rsa = self.key.rsa()?;
        let mut plaintext = vec![0u8; rsa.size() as usize];
        let len = rsa.private_decrypt(ciphertext, &mut plaintext, Padding::PKCS1_OAEP)?;
        plaintext.truncate(len);
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::Asn1Time;
    use openssl::hash::MessageDigest;
    use openssl::rsa::Rsa;
    use openssl::x509::X509NameBuilder;

    fn self_signed() -> (Vec<u8>, Vec<u8>) {
        let rsa = Rsa::generate(2048).unwrap();
        let key = PKey::from_rsa(rsa).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "test merchant").unwrap();
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

    #[test]
    fn thumbprint_is_uppercase_hex() {
        let (cert_pem, _) = self_signed();
        let cert = Certificate::from_pem(&cert_pem).unwrap();
        let thumbprint = cert.thumbprint().unwrap();

        assert_eq!(thumbprint.len(), 40);
        assert!(
            thumbprint
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let (cert_pem, key_pem) = self_signed();
        let pair = CertificateKeyPair::from_pem(&cert_pem, &key_pem).unwrap();

        let signature = pair.sign_sha256(b"payload").unwrap();
        assert!(pair.certificate().verify_sha256(b"payload", &signature).unwrap());
        assert!(!pair.certificate().verify_sha256(b"tampered", &signature).unwrap());
    }

    #[test]
    fn oaep_unwrap_recovers_key() {
        let (cert_pem, key_pem) = self_signed();
        let pair = CertificateKeyPair::from_pem(&cert_pem, &key_pem).unwrap();

        let aes_key = [7u8; 32];
        let rsa = pair.certificate().x509().public_key().unwrap().rsa().unwrap();
        let mut wrapped = vec![0u8; rsa.size() as usize];
        let len = rsa
            .public_encrypt(&aes_key, &mut wrapped, Padding::PKCS1_OAEP)
            .unwrap();
        wrapped.truncate(len);

        assert_eq!(pair.rsa_oaep_decrypt(&wrapped).unwrap(), aes_key);
    }
}
