pub mod certificate;
pub mod xmlenc;

pub use certificate::{Certificate, CertificateKeyPair};
pub use xmlenc::{SamlAttributesEncryptionKey, decrypt_xml};
