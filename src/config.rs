use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config as ConfigLib, ConfigError, Environment, File};
use reqwest::Url;
use serde::Deserialize;

use crate::crypto::{Certificate, CertificateKeyPair};
use crate::error::CommunicatorError;

/// File/environment settings layer. Certificates are referenced by path
/// here; [`Configuration`] holds the loaded key material.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub acquirer: AcquirerConfig,
    pub merchant: MerchantConfig,
    pub certificates: CertificateConfig,
    #[serde(default)]
    pub service_logs: ServiceLogsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcquirerConfig {
    /// Acquirer ID
    pub id: String,
    pub directory_url: String,
    pub transaction_url: String,
    pub status_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantConfig {
    /// ID of the merchant
    pub id: String,
    /// The SubID that uniquely defines a trade name of the merchant
    #[serde(default)]
    pub sub_id: u32,
    /// URL the consumer is redirected to after authentication
    pub return_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateConfig {
    pub merchant_certificate: PathBuf,
    pub merchant_key: PathBuf,
    pub routing_service_certificate: PathBuf,
    #[serde(default)]
    pub alternate_routing_service_certificate: Option<PathBuf>,
    pub saml_certificate: PathBuf,
    pub saml_key: PathBuf,
}

/// Raw request/response message dumps, for dispute handling with the
/// acquirer.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceLogsConfig {
    #[serde(default = "default_service_logs_enabled")]
    pub enabled: bool,
    #[serde(default = "default_service_logs_location")]
    pub location: PathBuf,
    #[serde(default = "default_service_logs_pattern")]
    pub pattern: String,
}

fn default_service_logs_enabled() -> bool {
    true
}

fn default_service_logs_location() -> PathBuf {
    PathBuf::from("logs")
}

fn default_service_logs_pattern() -> String {
    "%Y-%M-%D/%h%m%s.%f-%a.xml".to_string()
}

impl Default for ServiceLogsConfig {
    fn default() -> Self {
        Self {
            enabled: default_service_logs_enabled(),
            location: default_service_logs_location(),
            pattern: default_service_logs_pattern(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("merchant.sub_id", 0)?
            .add_source(File::with_name("config/settings").required(false));

        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format APP_MERCHANT__ID or APP_ACQUIRER__STATUS_URL
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        builder.build()?.try_deserialize()
    }

    /// Load the referenced certificates and keys and build the runtime
    /// configuration.
    pub fn into_configuration(self) -> Result<Configuration, CommunicatorError> {
        let read = |path: &PathBuf| -> Result<Vec<u8>, CommunicatorError> {
            std::fs::read(path).map_err(|e| {
                CommunicatorError::Configuration(format!("{}: {e}", path.display()))
            })
        };

        let merchant_key_pair = CertificateKeyPair::from_pem(
            read(&self.certificates.merchant_certificate)?,
            read(&self.certificates.merchant_key)?,
        )?;
        let routing_service_certificate =
            Certificate::from_pem(read(&self.certificates.routing_service_certificate)?)?;
        let alternate_routing_service_certificate = self
            .certificates
            .alternate_routing_service_certificate
            .as_ref()
            .map(|path| read(path).and_then(Certificate::from_pem))
            .transpose()?;
        let saml_key_pair = CertificateKeyPair::from_pem(
            read(&self.certificates.saml_certificate)?,
            read(&self.certificates.saml_key)?,
        )?;

        let configuration = Configuration {
            acquirer_id: self.acquirer.id,
            merchant_id: self.merchant.id,
            merchant_sub_id: self.merchant.sub_id,
            merchant_return_url: parse_url(&self.merchant.return_url, "merchant.return_url")?,
            acquirer_directory_url: parse_url(
                &self.acquirer.directory_url,
                "acquirer.directory_url",
            )?,
            acquirer_transaction_url: parse_url(
                &self.acquirer.transaction_url,
                "acquirer.transaction_url",
            )?,
            acquirer_status_url: parse_url(&self.acquirer.status_url, "acquirer.status_url")?,
            merchant_key_pair,
            routing_service_certificate,
            alternate_routing_service_certificate,
            saml_key_pair,
            service_logs: self.service_logs,
        };
        configuration.validate()?;
        Ok(configuration)
    }
}

fn parse_url(value: &str, name: &str) -> Result<Url, CommunicatorError> {
    Url::parse(value).map_err(|_| CommunicatorError::Configuration(name.to_string()))
}

/// Runtime configuration consumed by the communicator: identifiers,
/// endpoints and loaded key material.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub acquirer_id: String,
    pub merchant_id: String,
    pub merchant_sub_id: u32,
    pub merchant_return_url: Url,
    pub acquirer_directory_url: Url,
    pub acquirer_transaction_url: Url,
    pub acquirer_status_url: Url,
    /// Signs outgoing messages.
    pub merchant_key_pair: CertificateKeyPair,
    /// Verifies incoming transport signatures.
    pub routing_service_certificate: Certificate,
    /// Accepted next to the primary certificate during key rollover.
    pub alternate_routing_service_certificate: Option<Certificate>,
    /// Decrypts SAML attributes. May be the same pair as the merchant's.
    pub saml_key_pair: CertificateKeyPair,
    pub service_logs: ServiceLogsConfig,
}

impl Configuration {
    /// Reject configurations with missing identifiers before any request
    /// goes out.
    pub fn validate(&self) -> Result<(), CommunicatorError> {
        if self.acquirer_id.trim().is_empty() {
            return Err(CommunicatorError::Configuration("acquirer.id".to_string()));
        }
        if self.merchant_id.trim().is_empty() {
            return Err(CommunicatorError::Configuration("merchant.id".to_string()));
        }
        Ok(())
    }

    /// The certificates accepted for the response transport signature.
    pub fn trusted_routing_certificates(&self) -> Vec<Certificate> {
        let mut certificates = vec![self.routing_service_certificate.clone()];
        if let Some(alternate) = &self.alternate_routing_service_certificate {
            certificates.push(alternate.clone());
        }
        certificates
    }
}
