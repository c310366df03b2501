//! Request inputs supplied by the merchant application.

use std::ops::{BitOr, BitOrAssign};
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::error::CommunicatorError;

const MAX_EXPIRATION_PERIOD: Duration = Duration::from_secs(5 * 60);

fn merchant_reference_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[a-zA-Z][a-zA-Z0-9]{0,34}$").expect("valid pattern"))
}

/// Bit set indicating the purpose of the authentication and/or the
/// attributes requested. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServiceIds(u16);

impl ServiceIds {
    /// Nothing
    pub const NONE: ServiceIds = ServiceIds(0);
    /// The consumer transient id (same wire value as requesting nothing)
    pub const CONSUMER_TRANSIENT_ID: ServiceIds = ServiceIds(0);
    /// The BSN attribute
    pub const BSN: ServiceIds = ServiceIds(1);
    /// The email attribute
    pub const EMAIL: ServiceIds = ServiceIds(2);
    /// The telephone attribute
    pub const TELEPHONE: ServiceIds = ServiceIds(4);
    /// The document id to be signed
    pub const SIGN: ServiceIds = ServiceIds(8);
    /// The gender attribute
    pub const GENDER: ServiceIds = ServiceIds(16);
    /// Whether the consumer is 18 or older
    pub const IS_EIGHTEEN_OR_OLDER: ServiceIds = ServiceIds(64);
    /// The consumer's date of birth (implies the age check)
    pub const DATE_OF_BIRTH: ServiceIds = ServiceIds(64 + 128 + 256);
    /// The consumer address
    pub const ADDRESS: ServiceIds = ServiceIds(1024);
    /// The consumer name
    pub const NAME: ServiceIds = ServiceIds(4096);
    /// The consumer BIN
    pub const CONSUMER_BIN: ServiceIds = ServiceIds(16384);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        ServiceIds(bits)
    }

    /// At least one bit of `other` is set in `self`.
    pub const fn intersects(self, other: ServiceIds) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ServiceIds {
    type Output = ServiceIds;

    fn bitor(self, rhs: ServiceIds) -> ServiceIds {
        ServiceIds(self.0 | rhs.0)
    }
}

impl BitOrAssign for ServiceIds {
    fn bitor_assign(&mut self, rhs: ServiceIds) {
        self.0 |= rhs.0;
    }
}

/// The minimum level of assurance required for the authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssuranceLevel {
    #[default]
    Loa3,
}

impl AssuranceLevel {
    pub const fn urn(self) -> &'static str {
        match self {
            AssuranceLevel::Loa3 => "nl:bvn:bankid:1.0:loa3",
        }
    }
}

/// Optional fields of an [`AuthenticationRequest`].
#[derive(Debug, Clone, Default)]
pub struct AuthenticationOptions {
    /// Unique authentication reference; generated when absent.
    pub merchant_reference: Option<String>,
    pub assurance_level: AssuranceLevel,
    /// Period of validity of the authentication request.
    pub expiration_period: Option<Duration>,
    /// Consumer language, ISO 639-1. Defaults to `nl`.
    pub language: Option<String>,
    /// Document id to be signed; requires the sign service.
    pub document_id: Option<String>,
}

/// Describes a new authentication request.
#[derive(Debug, Clone)]
pub struct AuthenticationRequest {
    entrance_code: String,
    merchant_reference: String,
    language: String,
    expiration_period: Option<Duration>,
    requested_service_id: ServiceIds,
    issuer_id: String,
    assurance_level: AssuranceLevel,
    document_id: Option<String>,
    create_date_timestamp: DateTime<Utc>,
}

impl AuthenticationRequest {
    /// Validate the input combination and create the request. The creation
    /// timestamp is fixed here and reused for every message derived from
    /// this request.
    pub fn new(
        entrance_code: impl Into<String>,
        requested_service_id: ServiceIds,
        issuer_id: impl Into<String>,
        options: AuthenticationOptions,
    ) -> Result<Self, CommunicatorError> {
        if let Some(period) = options.expiration_period
            && period > MAX_EXPIRATION_PERIOD
        {
            return Err(CommunicatorError::RequestValidation(
                "The expiration period cannot be greater than five minutes.".to_string(),
            ));
        }

        if let Some(reference) = &options.merchant_reference
            && !merchant_reference_format().is_match(reference)
        {
            return Err(CommunicatorError::RequestValidation(
                "MerchantReference does not follow expected format - ^[a-zA-Z][a-zA-Z0-9]{0,34}$"
                    .to_string(),
            ));
        }

        match options.document_id.as_deref() {
            Some(document_id) if !document_id.is_empty() => {
                if requested_service_id.intersects(ServiceIds::SIGN) {
                    if !requested_service_id.intersects(ServiceIds::CONSUMER_BIN) {
                        return Err(CommunicatorError::RequestValidation(
                            "ConsumerID BIN attribute should be present.".to_string(),
                        ));
                    }
                } else {
                    return Err(CommunicatorError::RequestValidation(
                        "DocumentID should not be filled if the Sign service is not requested."
                            .to_string(),
                    ));
                }
            }
            _ => {
                if requested_service_id.intersects(ServiceIds::SIGN) {
                    return Err(CommunicatorError::RequestValidation(
                        "DocumentID should be present.".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            entrance_code: entrance_code.into(),
            merchant_reference: options
                .merchant_reference
                .unwrap_or_else(generate_merchant_reference),
            language: options.language.unwrap_or_else(|| "nl".to_string()),
            expiration_period: options.expiration_period,
            requested_service_id,
            issuer_id: issuer_id.into(),
            assurance_level: options.assurance_level,
            document_id: options.document_id.filter(|id| !id.is_empty()),
            create_date_timestamp: Utc::now(),
        })
    }

    /// An authentication identifier to facilitate continuation of the
    /// session even if the existing session has been lost.
    pub fn entrance_code(&self) -> &str {
        &self.entrance_code
    }

    /// The unique authentication reference from the merchant.
    pub fn merchant_reference(&self) -> &str {
        &self.merchant_reference
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn expiration_period(&self) -> Option<Duration> {
        self.expiration_period
    }

    pub fn requested_service_id(&self) -> ServiceIds {
        self.requested_service_id
    }

    /// BIC of the issuer chosen by the consumer.
    pub fn issuer_id(&self) -> &str {
        &self.issuer_id
    }

    pub fn assurance_level(&self) -> AssuranceLevel {
        self.assurance_level
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// The time at which this authentication request was created.
    pub fn create_date_timestamp(&self) -> DateTime<Utc> {
        self.create_date_timestamp
    }
}

/// Letter followed by 34 characters drawn from fresh UUIDs, matching the
/// merchant reference format.
fn generate_merchant_reference() -> String {
    let mut reference = format!(
        "A{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );
    reference.truncate(35);
    reference
}

/// Describes a status request.
#[derive(Debug, Clone)]
pub struct StatusRequest {
    transaction_id: String,
}

impl StatusRequest {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
        }
    }

    /// The transaction id to check.
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }
}
