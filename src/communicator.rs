//! The orchestrator: builds, signs, validates, sends, re-validates,
//! verifies and parses each of the three operations.
//!
//! Every public method catches its own failures and folds them into the
//! returned response object. Callers inspect `is_error()`; nothing in the
//! exchange path panics or propagates.

use chrono::Utc;
use reqwest::Url;
use tracing::{info, instrument, warn};

use crate::config::Configuration;
use crate::error::{CommunicatorError, SchemaPhase};
use crate::messages::directory::build_directory_request;
use crate::messages::status::build_status_request;
use crate::messages::transaction::{build_authn_request, build_transaction_request};
use crate::requests::{AuthenticationRequest, StatusRequest};
use crate::responses::{AuthenticationResponse, DirectoryResponse, StatusResponse};
use crate::schema::SchemaRegistry;
use crate::service_logs::ServiceLogger;
use crate::transport::{HttpMessenger, Messenger};
use crate::xmldsig::{KeyInfoKind, SignOptions, sign_xml, verify_response_signature};

/// Merchant-side client for the directory, transaction and status
/// operations.
pub struct Communicator<M: Messenger = HttpMessenger> {
    configuration: Configuration,
    messenger: M,
    schemas: SchemaRegistry,
    service_logger: ServiceLogger,
}

impl Communicator<HttpMessenger> {
    /// Validate the configuration and build a communicator backed by an
    /// HTTPS transport.
    pub fn new(configuration: Configuration) -> Result<Self, CommunicatorError> {
        Self::with_messenger(configuration, HttpMessenger::new())
    }
}

impl<M: Messenger> Communicator<M> {
    /// Same as [`Communicator::new`] with a custom transport.
    pub fn with_messenger(
        configuration: Configuration,
        messenger: M,
    ) -> Result<Self, CommunicatorError> {
        configuration.validate()?;
        let service_logger = ServiceLogger::new(configuration.service_logs.clone());
        Ok(Self {
            configuration,
            messenger,
            schemas: SchemaRegistry::new(),
            service_logger,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Fetch the list of issuers the consumer can authenticate with.
    #[instrument(skip(self))]
    pub async fn get_directory(&self) -> DirectoryResponse {
        info!("sending new directory request");
        let result = async {
            info!("building idx message");
            let request = build_directory_request(&self.configuration, Utc::now())?;
            self.perform_request(request, &self.configuration.acquirer_directory_url)
                .await
        }
        .await;

        match result {
            Ok(content) => DirectoryResponse::from_xml(&content),
            Err(error) => {
                warn!(%error, "directory request failed");
                DirectoryResponse::from_error(&error, String::new())
            }
        }
    }

    /// Start a new authentication transaction at the consumer's issuer.
    #[instrument(skip(self, authentication_request))]
    pub async fn new_authentication_request(
        &self,
        authentication_request: &AuthenticationRequest,
    ) -> AuthenticationResponse {
        info!("sending new authentication request");
        let result = async {
            info!("building request");
            let authn = build_authn_request(&self.configuration, authentication_request)?;
            let signed_authn = sign_xml(
                &self.configuration.merchant_key_pair,
                &authn,
                &SignOptions {
                    prefix: Some("ds"),
                    key_info: KeyInfoKind::Thumbprint,
                    insert_after: Some("saml:Issuer"),
                },
            )?;

            info!("building idx message");
            let request = build_transaction_request(
                &self.configuration,
                authentication_request,
                &signed_authn,
            )?;
            self.perform_request(request, &self.configuration.acquirer_transaction_url)
                .await
        }
        .await;

        match result {
            Ok(content) => AuthenticationResponse::from_xml(&content),
            Err(error) => {
                warn!(%error, "authentication request failed");
                AuthenticationResponse::from_error(&error, String::new())
            }
        }
    }

    /// Poll the outcome of a transaction. A successful authentication
    /// carries the consumer attributes as a SAML response.
    #[instrument(skip(self, status_request))]
    pub async fn get_response(&self, status_request: &StatusRequest) -> StatusResponse {
        info!("sending new status request");
        let result = async {
            info!("building idx message");
            let request =
                build_status_request(&self.configuration, status_request, Utc::now())?;
            self.perform_request(request, &self.configuration.acquirer_status_url)
                .await
        }
        .await;

        match result {
            Ok(content) => StatusResponse::from_xml(&content, &self.configuration.saml_key_pair),
            Err(error) => {
                warn!(%error, "status request failed");
                StatusResponse::from_error(&error, String::new())
            }
        }
    }

    /// Blocking variant of [`Communicator::get_directory`].
    pub fn get_directory_blocking(&self) -> DirectoryResponse {
        match block_on(self.get_directory()) {
            Ok(response) => response,
            Err(error) => DirectoryResponse::from_error(&error, String::new()),
        }
    }

    /// Blocking variant of [`Communicator::new_authentication_request`].
    pub fn new_authentication_request_blocking(
        &self,
        authentication_request: &AuthenticationRequest,
    ) -> AuthenticationResponse {
        match block_on(self.new_authentication_request(authentication_request)) {
            Ok(response) => response,
            Err(error) => AuthenticationResponse::from_error(&error, String::new()),
        }
    }

    /// Blocking variant of [`Communicator::get_response`].
    pub fn get_response_blocking(&self, status_request: &StatusRequest) -> StatusResponse {
        match block_on(self.get_response(status_request)) {
            Ok(response) => response,
            Err(error) => StatusResponse::from_error(&error, String::new()),
        }
    }

    /// Sign, validate, transmit, re-validate and verify one message.
    async fn perform_request(
        &self,
        request: String,
        url: &Url,
    ) -> Result<String, CommunicatorError> {
        info!("signing message");
        let signed = sign_xml(
            &self.configuration.merchant_key_pair,
            &request,
            &SignOptions::default(),
        )?;

        info!(%url, "sending request");
        self.schemas
            .verify(&signed, SchemaPhase::Request)
            .inspect_err(|error| warn!(%error, "request xml schema is not valid"))?;
        self.service_logger.log_message(&signed);

        let content = self.messenger.send_message(&signed, url).await?;
        self.service_logger.log_message(&content);

        self.schemas
            .verify(&content, SchemaPhase::Response)
            .inspect_err(|error| warn!(%error, "response xml schema is not valid"))?;
        info!("response xml schema is valid");

        let verification = verify_response_signature(
            &content,
            &self.configuration.trusted_routing_certificates(),
        );
        info!("signature is valid: {}", verification.is_ok());
        verification?;

        Ok(content)
    }
}

/// Run a communicator future to completion on a throwaway current-thread
/// runtime. The transport still does its own I/O; nothing here depends on
/// an ambient runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, CommunicatorError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::test_configuration;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records outgoing messages and replays a canned response.
    struct MockMessenger {
        response: String,
        sent: Mutex<Vec<(String, Url)>>,
    }

    impl MockMessenger {
        fn new(response: impl Into<String>) -> Self {
            Self {
                response: response.into(),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Messenger for MockMessenger {
        async fn send_message(
            &self,
            message: &str,
            url: &Url,
        ) -> Result<String, CommunicatorError> {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), url.clone()));
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn directory_request_is_signed_and_sent_to_the_directory_url() {
        let communicator = Communicator::with_messenger(
            test_configuration(),
            MockMessenger::new("<unparseable"),
        )
        .unwrap();

        let response = communicator.get_directory().await;
        // The canned response fails verification, which must surface as an
        // in-band error, not a panic or Err.
        assert!(response.is_error());

        let sent = communicator.messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (message, url) = &sent[0];
        assert!(message.contains("<DirectoryReq"));
        assert!(message.contains("<Signature xmlns=\"http://www.w3.org/2000/09/xmldsig#\">"));
        assert!(message.contains("<KeyName>"));
        assert_eq!(url.as_str(), "https://acquirer.example/directory");
    }

    #[tokio::test]
    async fn authentication_request_embeds_a_signed_authn_request() {
        let communicator = Communicator::with_messenger(
            test_configuration(),
            MockMessenger::new("<unparseable"),
        )
        .unwrap();

        let request = AuthenticationRequest::new(
            "entrance",
            crate::requests::ServiceIds::NAME,
            "INGBNL2A",
            Default::default(),
        )
        .unwrap();
        let _ = communicator.new_authentication_request(&request).await;

        let sent = communicator.messenger.sent.lock().unwrap();
        let (message, url) = &sent[0];
        assert!(message.contains("<AcquirerTrxReq"));
        assert!(message.contains("<container><samlp:AuthnRequest"));
        // Inner (prefixed) signature plus the outer envelope signature.
        assert!(message.contains("<ds:Signature"));
        assert!(message.matches("SignatureValue").count() >= 2);
        assert_eq!(url.as_str(), "https://acquirer.example/transaction");
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() {
        let mut configuration = test_configuration();
        configuration.merchant_id = String::new();
        assert!(Communicator::new(configuration).is_err());
    }
}
