//! Typed results handed back by the communicator. Every response carries
//! the raw message text for audit, and failure is reported in-band through
//! `is_error` / `error` rather than by panicking mid-pipeline.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::crypto::{CertificateKeyPair, SamlAttributesEncryptionKey};
use crate::error::CommunicatorError;
use crate::messages::directory::parser::{DirectoryOutcome, parse as parse_directory};
use crate::messages::error_res::ErrorResXml;
use crate::messages::status::parser::{
    StatusOutcome, container_content, parse as parse_status,
};
use crate::messages::transaction::parser::{TransactionOutcome, parse as parse_transaction};
use crate::saml::{SamlResponse, SamlStatus};

/// Details of a failed operation: either the acquirer's structured error
/// envelope or a wrapped local failure.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    error_code: Option<String>,
    error_message: String,
    error_details: Option<String>,
    suggested_action: Option<String>,
    consumer_message: Option<String>,
    additional_information: Option<SamlStatus>,
}

impl ErrorResponse {
    fn from_envelope(envelope: &ErrorResXml, additional_information: Option<SamlStatus>) -> Self {
        Self {
            error_code: Some(envelope.error.error_code.clone()),
            error_message: envelope.error.error_message.clone(),
            error_details: envelope.error.error_detail.clone(),
            suggested_action: envelope.error.suggested_action.clone(),
            consumer_message: envelope.error.consumer_message.clone(),
            additional_information,
        }
    }

    fn from_error(error: &CommunicatorError) -> Self {
        Self {
            error_code: None,
            error_message: error.to_string(),
            error_details: None,
            suggested_action: None,
            consumer_message: None,
            additional_information: None,
        }
    }

    fn saml_failure(status: SamlStatus) -> Self {
        Self {
            error_code: None,
            error_message: "SAML specific error.".to_string(),
            error_details: status.status_message.clone(),
            suggested_action: None,
            consumer_message: None,
            additional_information: Some(status),
        }
    }

    /// Acquirer error code, absent for local failures.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn error_details(&self) -> Option<&str> {
        self.error_details.as_deref()
    }

    pub fn suggested_action(&self) -> Option<&str> {
        self.suggested_action.as_deref()
    }

    /// Message that can be shown to the consumer as-is.
    pub fn consumer_message(&self) -> Option<&str> {
        self.consumer_message.as_deref()
    }

    /// The SAML status behind the error, when one was delivered.
    pub fn additional_information(&self) -> Option<&SamlStatus> {
        self.additional_information.as_ref()
    }
}

/// Issuer entry from the directory, flattened with its country name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    pub issuer_id: String,
    pub issuer_name: String,
    pub issuer_country: String,
}

/// Result of a directory request.
#[derive(Debug, Clone)]
pub struct DirectoryResponse {
    error: Option<ErrorResponse>,
    directory_date_timestamp: Option<DateTime<Utc>>,
    issuers: Vec<Issuer>,
    raw_message: String,
}

impl DirectoryResponse {
    pub(crate) fn from_xml(xml: &str) -> Self {
        match parse_directory(xml) {
            Ok(DirectoryOutcome::Success(res)) => {
                let issuers = res
                    .directory
                    .countries
                    .iter()
                    .flat_map(|country| {
                        country.issuers.iter().map(|issuer| Issuer {
                            issuer_id: issuer.issuer_id.clone(),
                            issuer_name: issuer.issuer_name.clone(),
                            issuer_country: country.country_names.clone(),
                        })
                    })
                    .collect();
                Self {
                    error: None,
                    directory_date_timestamp: parse_timestamp(
                        &res.directory.directory_date_timestamp,
                    ),
                    issuers,
                    raw_message: xml.to_string(),
                }
            }
            Ok(DirectoryOutcome::Error(envelope)) => Self {
                error: Some(ErrorResponse::from_envelope(&envelope, None)),
                directory_date_timestamp: None,
                issuers: Vec::new(),
                raw_message: xml.to_string(),
            },
            Err(error) => Self::from_error(&error, xml.to_string()),
        }
    }

    pub(crate) fn from_error(error: &CommunicatorError, raw_message: String) -> Self {
        Self {
            error: Some(ErrorResponse::from_error(error)),
            directory_date_timestamp: None,
            issuers: Vec::new(),
            raw_message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ErrorResponse> {
        self.error.as_ref()
    }

    /// When the issuer directory last changed. Repeat the directory request
    /// only after this moves.
    pub fn directory_date_timestamp(&self) -> Option<DateTime<Utc>> {
        self.directory_date_timestamp
    }

    pub fn issuers(&self) -> &[Issuer] {
        &self.issuers
    }

    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }
}

/// Result of starting a new transaction.
#[derive(Debug, Clone)]
pub struct AuthenticationResponse {
    error: Option<ErrorResponse>,
    issuer_authentication_url: Option<String>,
    transaction_id: Option<String>,
    transaction_create_date_timestamp: Option<DateTime<Utc>>,
    raw_message: String,
}

impl AuthenticationResponse {
    pub(crate) fn from_xml(xml: &str) -> Self {
        match parse_transaction(xml) {
            Ok(TransactionOutcome::Success(res)) => Self {
                error: None,
                issuer_authentication_url: Some(res.issuer.issuer_authentication_url),
                transaction_id: Some(res.transaction.transaction_id),
                transaction_create_date_timestamp: parse_timestamp(
                    &res.transaction.transaction_create_date_timestamp,
                ),
                raw_message: xml.to_string(),
            },
            Ok(TransactionOutcome::Error(envelope)) => Self {
                error: Some(ErrorResponse::from_envelope(&envelope, None)),
                issuer_authentication_url: None,
                transaction_id: None,
                transaction_create_date_timestamp: None,
                raw_message: xml.to_string(),
            },
            Err(error) => Self::from_error(&error, xml.to_string()),
        }
    }

    pub(crate) fn from_error(error: &CommunicatorError, raw_message: String) -> Self {
        Self {
            error: Some(ErrorResponse::from_error(error)),
            issuer_authentication_url: None,
            transaction_id: None,
            transaction_create_date_timestamp: None,
            raw_message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ErrorResponse> {
        self.error.as_ref()
    }

    /// Where to redirect the consumer's browser.
    pub fn issuer_authentication_url(&self) -> Option<&str> {
        self.issuer_authentication_url.as_deref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn transaction_create_date_timestamp(&self) -> Option<DateTime<Utc>> {
        self.transaction_create_date_timestamp
    }

    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }
}

/// Transaction was started but the consumer has not yet authenticated.
pub const STATUS_OPEN: &str = "Open";
/// Consumer has been redirected and the issuer is working on it.
pub const STATUS_PENDING: &str = "Pending";
/// Authentication succeeded; a SAML response is attached.
pub const STATUS_SUCCESS: &str = "Success";
/// Authentication failed at the issuer.
pub const STATUS_FAILURE: &str = "Failure";
/// The transaction expired before the consumer finished.
pub const STATUS_EXPIRED: &str = "Expired";
/// The consumer cancelled.
pub const STATUS_CANCELLED: &str = "Cancelled";

/// Result of a status request.
#[derive(Debug, Clone)]
pub struct StatusResponse {
    error: Option<ErrorResponse>,
    transaction_id: Option<String>,
    status: Option<String>,
    status_date_timestamp: Option<DateTime<Utc>>,
    saml_response: Option<SamlResponse>,
    saml_encryption_keys: Vec<SamlAttributesEncryptionKey>,
    raw_message: String,
}

impl StatusResponse {
    pub(crate) fn from_xml(xml: &str, saml_key_pair: &CertificateKeyPair) -> Self {
        match parse_status(xml) {
            Ok(StatusOutcome::Success(res)) => {
                let transaction_id = Some(res.transaction.transaction_id.clone());
                let status = res.transaction.status.clone();
                let status_date_timestamp = res
                    .transaction
                    .status_date_timestamp
                    .as_deref()
                    .and_then(parse_timestamp);

                let (error, saml_response, keys) = if status == STATUS_SUCCESS {
                    match container_content(xml) {
                        Some(container) => {
                            match SamlResponse::parse(container, saml_key_pair) {
                                Ok((saml, keys)) => {
                                    let failure = saml
                                        .status()
                                        .filter(|s| !s.is_success())
                                        .cloned()
                                        .map(ErrorResponse::saml_failure);
                                    (failure, Some(saml), keys)
                                }
                                Err(error) => {
                                    (Some(ErrorResponse::from_error(&error)), None, Vec::new())
                                }
                            }
                        }
                        None => {
                            let error = CommunicatorError::Saml(
                                "No SAML message present for the transaction with status \
                                 'Success'."
                                    .to_string(),
                            );
                            (Some(ErrorResponse::from_error(&error)), None, Vec::new())
                        }
                    }
                } else {
                    (None, None, Vec::new())
                };

                Self {
                    error,
                    transaction_id,
                    status: Some(status),
                    status_date_timestamp,
                    saml_response,
                    saml_encryption_keys: keys,
                    raw_message: xml.to_string(),
                }
            }
            Ok(StatusOutcome::Error(envelope)) => {
                let saml_status = error_container_status(xml);
                Self {
                    error: Some(ErrorResponse::from_envelope(&envelope, saml_status)),
                    transaction_id: None,
                    status: None,
                    status_date_timestamp: None,
                    saml_response: None,
                    saml_encryption_keys: Vec::new(),
                    raw_message: xml.to_string(),
                }
            }
            Err(error) => Self::from_error(&error, xml.to_string()),
        }
    }

    pub(crate) fn from_error(error: &CommunicatorError, raw_message: String) -> Self {
        Self {
            error: Some(ErrorResponse::from_error(error)),
            transaction_id: None,
            status: None,
            status_date_timestamp: None,
            saml_response: None,
            saml_encryption_keys: Vec::new(),
            raw_message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ErrorResponse> {
        self.error.as_ref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// One of the `STATUS_*` values.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn status_date_timestamp(&self) -> Option<DateTime<Utc>> {
        self.status_date_timestamp
    }

    /// The delivered SAML response, present for successful authentications.
    pub fn saml_response(&self) -> Option<&SamlResponse> {
        self.saml_response.as_ref()
    }

    /// The AES keys recovered while decrypting the SAML attributes, for key
    /// audit trails.
    pub fn saml_encryption_keys(&self) -> &[SamlAttributesEncryptionKey] {
        &self.saml_encryption_keys
    }

    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(error) => {
            warn!(%error, value, "unparseable timestamp in response");
            None
        }
    }
}

/// SAML status delivered inside an error envelope's container, if any.
fn error_container_status(xml: &str) -> Option<SamlStatus> {
    use crate::xmldsig::utils::element_text;

    let container = crate::messages::status::parser::container_content(xml)?;
    let codes: Vec<String> = regex::Regex::new(r#"StatusCode[^>]*\sValue="([^"]*)""#)
        .ok()?
        .captures_iter(container)
        .map(|c| c[1].to_string())
        .collect();
    let message = element_text(container, "StatusMessage");
    Some(SamlStatus {
        status_message: message,
        status_code_first_level: codes.first()?.clone(),
        status_code_second_level: codes.get(1).cloned().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmldsig::test_support::test_key_pair;

    const ERROR_RES: &str = "<AcquirerErrorRes>\
        <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
        <Error><errorCode>SO1000</errorCode><errorMessage>Failure in system</errorMessage>\
        <consumerMessage>Probeer het later opnieuw.</consumerMessage></Error>\
        <Acquirer><acquirerID>0001</acquirerID></Acquirer></AcquirerErrorRes>";

    #[test]
    fn directory_error_envelope_becomes_an_error_response() {
        let response = DirectoryResponse::from_xml(ERROR_RES);
        assert!(response.is_error());
        let error = response.error().unwrap();
        assert_eq!(error.error_code(), Some("SO1000"));
        assert_eq!(error.consumer_message(), Some("Probeer het later opnieuw."));
        assert!(response.issuers().is_empty());
    }

    #[test]
    fn malformed_directory_response_is_wrapped_not_propagated() {
        let response = DirectoryResponse::from_xml("<garbage/>");
        assert!(response.is_error());
        assert_eq!(response.raw_message(), "<garbage/>");
    }

    #[test]
    fn pending_status_has_no_saml_payload() {
        let xml = "<AcquirerStatusRes>\
            <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
            <Acquirer><acquirerID>0001</acquirerID></Acquirer>\
            <Transaction><transactionID>0001000000000001</transactionID>\
            <status>Pending</status></Transaction></AcquirerStatusRes>";
        let response = StatusResponse::from_xml(xml, &test_key_pair());
        assert!(!response.is_error());
        assert_eq!(response.status(), Some(STATUS_PENDING));
        assert!(response.saml_response().is_none());
    }

    #[test]
    fn success_without_container_is_an_error() {
        let xml = "<AcquirerStatusRes>\
            <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
            <Acquirer><acquirerID>0001</acquirerID></Acquirer>\
            <Transaction><transactionID>0001000000000001</transactionID>\
            <status>Success</status></Transaction></AcquirerStatusRes>";
        let response = StatusResponse::from_xml(xml, &test_key_pair());
        assert!(response.is_error());
        assert!(
            response
                .error()
                .unwrap()
                .error_message()
                .contains("No SAML message present")
        );
    }

    #[test]
    fn saml_second_level_failure_is_reclassified_as_error() {
        let container = "<samlp:Response \
            xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" \
            xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
            ID=\"_tx\" InResponseTo=\"MREF\" Version=\"2.0\">\
            <saml:Issuer>INGBNL2A</saml:Issuer>\
            <samlp:Status>\
            <samlp:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\">\
            <samlp:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:RequestDenied\"/>\
            </samlp:StatusCode></samlp:Status></samlp:Response>";
        let xml = format!(
            "<AcquirerStatusRes>\
             <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
             <Acquirer><acquirerID>0001</acquirerID></Acquirer>\
             <Transaction><transactionID>0001000000000001</transactionID>\
             <status>Success</status><container>{container}</container>\
             </Transaction></AcquirerStatusRes>"
        );
        let response = StatusResponse::from_xml(&xml, &test_key_pair());
        assert!(response.is_error());
        let error = response.error().unwrap();
        assert_eq!(error.error_message(), "SAML specific error.");
        assert!(!error.additional_information().unwrap().is_success());
        // The SAML document itself is still exposed.
        assert!(response.saml_response().is_some());
    }
}
