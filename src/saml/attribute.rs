//! SAML attributes and their per-attribute value validation.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::CommunicatorError;

/// A single name/value pair delivered in (or derived from) a SAML
/// assertion. Construction validates the value against the attribute's
/// registered pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlAttribute {
    name: String,
    value: String,
}

impl SamlAttribute {
    /// The delivered service id (can be the same as the requested service
    /// id, a different number, or 0).
    pub const DELIVERED_SERVICE_ID: &'static str = "urn:nl:bvn:bankid:1.0:bankid.deliveredserviceid";
    /// The BIN (Bank Identifying Number).
    pub const CONSUMER_BIN: &'static str = "urn:nl:bvn:bankid:1.0:consumer.bin";
    /// The consumer's transient identifier.
    pub const CONSUMER_TRANSIENT_ID: &'static str = "urn:nl:bvn:bankid:1.0:consumer.transientid";
    /// The consumer's gender.
    pub const CONSUMER_GENDER: &'static str = "urn:nl:bvn:bankid:1.0:consumer.gender";
    /// The consumer's legal last name.
    pub const CONSUMER_LEGAL_LAST_NAME: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.legallastname";
    /// The consumer's preferred last name.
    pub const CONSUMER_PREF_LAST_NAME: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.preferredlastname";
    /// The consumer's registered partner last name.
    pub const CONSUMER_PARTNER_LAST_NAME: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.partnerlastname";
    /// Prefix of the consumer's legal last name.
    pub const CONSUMER_LEGAL_LAST_NAME_PREFIX: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.legallastnameprefix";
    /// Prefix of the consumer's preferred last name.
    pub const CONSUMER_PREF_LAST_NAME_PREFIX: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.preferredlastnameprefix";
    /// Prefix of the consumer's partner last name.
    pub const CONSUMER_PARTNER_LAST_NAME_PREFIX: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.partnerlastnameprefix";
    /// The consumer's initials.
    pub const CONSUMER_INITIALS: &'static str = "urn:nl:bvn:bankid:1.0:consumer.initials";
    /// The consumer's date of birth.
    pub const CONSUMER_DATE_OF_BIRTH: &'static str = "urn:nl:bvn:bankid:1.0:consumer.dateofbirth";
    /// Street name of the consumer's residential address.
    pub const CONSUMER_STREET: &'static str = "urn:nl:bvn:bankid:1.0:consumer.street";
    /// House number of the consumer's residential address.
    pub const CONSUMER_HOUSE_NO: &'static str = "urn:nl:bvn:bankid:1.0:consumer.houseno";
    /// House number suffix. NL addresses only.
    pub const CONSUMER_HOUSE_NO_SUF: &'static str = "urn:nl:bvn:bankid:1.0:consumer.housenosuf";
    /// Additional address details. NL addresses only.
    pub const CONSUMER_ADDRESS_EXTRA: &'static str = "urn:nl:bvn:bankid:1.0:consumer.addressextra";
    /// First international address line.
    pub const CONSUMER_ADDRESS_LINE_1: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.intaddressline1";
    /// Second international address line.
    pub const CONSUMER_ADDRESS_LINE_2: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.intaddressline2";
    /// Third international address line.
    pub const CONSUMER_ADDRESS_LINE_3: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.intaddressline3";
    /// Postal code of the consumer's residential address.
    pub const CONSUMER_POSTAL_CODE: &'static str = "urn:nl:bvn:bankid:1.0:consumer.postalcode";
    /// City of the consumer's residential address.
    pub const CONSUMER_CITY: &'static str = "urn:nl:bvn:bankid:1.0:consumer.city";
    /// Country code of the country where the consumer resides.
    pub const CONSUMER_COUNTRY: &'static str = "urn:nl:bvn:bankid:1.0:consumer.country";
    /// The deprecated BIN.
    pub const CONSUMER_DEPRECATED_BIN: &'static str =
        "urn:nl:bvn:bankid:1.0:consumer.deprecatedbin";
    /// Whether the consumer is 18 or older.
    pub const CONSUMER_IS_18_OR_OLDER: &'static str = "urn:nl:bvn:bankid:1.0:consumer.is18orolder";
    /// The consumer's email address.
    pub const EMAIL: &'static str = "urn:nl:bvn:bankid:1.0:consumer.email";
    /// The consumer's telephone number.
    pub const TELEPHONE: &'static str = "urn:nl:bvn:bankid:1.0:consumer.telephone";
    /// The document id to be signed.
    pub const DOCUMENT_ID: &'static str = "urn:nl:bvn:bankid:1.0:merchant.documentID";

    /// Create an attribute, validating the value against the pattern
    /// registered for this attribute name. Names without a registered
    /// pattern are accepted as-is.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, CommunicatorError> {
        let name = name.into();
        let value = value.into();
        if let Some(pattern) = validation_patterns().get(name.as_str())
            && !pattern.is_match(&value)
        {
            return Err(CommunicatorError::Saml(format!(
                "Saml attribute value not valid ({name} : {value})."
            )));
        }
        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

fn validation_patterns() -> &'static HashMap<&'static str, Regex> {
    static PATTERNS: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(&str, &str)] = &[
            (SamlAttribute::CONSUMER_BIN, r"^[A-Za-z]{2}[\P{Cc}]{0,1024}$"),
            (
                SamlAttribute::CONSUMER_TRANSIENT_ID,
                r"^(?i)TRANS(?-i)[\x20-\x7E]{1,251}$",
            ),
            (
                SamlAttribute::CONSUMER_DEPRECATED_BIN,
                r"^[A-Za-z]{2}[\P{Cc}]{0,1024}$",
            ),
            (SamlAttribute::CONSUMER_GENDER, r"^(0|1|2|9)$"),
            (SamlAttribute::CONSUMER_LEGAL_LAST_NAME, r"^[\P{Cc}]{1,200}$"),
            (
                SamlAttribute::CONSUMER_LEGAL_LAST_NAME_PREFIX,
                r"^[\P{Cc}]{1,10}$",
            ),
            (SamlAttribute::CONSUMER_PREF_LAST_NAME, r"^[\P{Cc}]{1,200}$"),
            (
                SamlAttribute::CONSUMER_PREF_LAST_NAME_PREFIX,
                r"^[\P{Cc}]{1,10}$",
            ),
            (
                SamlAttribute::CONSUMER_PARTNER_LAST_NAME,
                r"^[\P{Cc}]{1,200}$",
            ),
            (
                SamlAttribute::CONSUMER_PARTNER_LAST_NAME_PREFIX,
                r"^[\P{Cc}]{1,10}$",
            ),
            (SamlAttribute::CONSUMER_INITIALS, r"^[\p{Lu}]{1,24}$"),
            (
                SamlAttribute::CONSUMER_DATE_OF_BIRTH,
                r"^[\d]{4}(0[1-9]|1[012]|00)(0[1-9]|[12][0-9]|3[01]|00)$",
            ),
            (SamlAttribute::CONSUMER_STREET, r"^[\P{Cc}]{1,43}$"),
            (SamlAttribute::CONSUMER_HOUSE_NO, r"^[0-9]{1,5}$"),
            (SamlAttribute::CONSUMER_ADDRESS_EXTRA, r"^[\P{Cc}]{1,70}$"),
            (SamlAttribute::CONSUMER_ADDRESS_LINE_1, r"^[\P{Cc}]{1,70}$"),
            (SamlAttribute::CONSUMER_ADDRESS_LINE_2, r"^[\P{Cc}]{1,70}$"),
            (SamlAttribute::CONSUMER_ADDRESS_LINE_3, r"^[\P{Cc}]{1,70}$"),
            (SamlAttribute::CONSUMER_POSTAL_CODE, r"^[0-9]{4}[a-zA-Z]{2}$"),
            (SamlAttribute::CONSUMER_CITY, r"^[\P{Cc}]{1,24}$"),
            (SamlAttribute::CONSUMER_COUNTRY, r"^[a-zA-Z]{2}$"),
            (SamlAttribute::CONSUMER_IS_18_OR_OLDER, r"^(true|false)$"),
            (SamlAttribute::TELEPHONE, r"^[\d\s+\-()]{1,20}$"),
            (SamlAttribute::EMAIL, r"^[\P{Cc}]{1,255}$"),
        ];
        table
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("valid pattern")))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_requires_country_prefix() {
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_BIN, "FANTASYBANK1234567890").is_ok());
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_BIN, "1NLBANK").is_err());
    }

    #[test]
    fn transient_id_is_case_insensitive_on_the_marker() {
        assert!(
            SamlAttribute::new(SamlAttribute::CONSUMER_TRANSIENT_ID, "TRANS1234567890").is_ok()
        );
        assert!(
            SamlAttribute::new(SamlAttribute::CONSUMER_TRANSIENT_ID, "trans1234567890").is_ok()
        );
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_TRANSIENT_ID, "TRANS").is_err());
    }

    #[test]
    fn gender_accepts_only_iso_5218_codes() {
        for value in ["0", "1", "2", "9"] {
            assert!(SamlAttribute::new(SamlAttribute::CONSUMER_GENDER, value).is_ok());
        }
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_GENDER, "3").is_err());
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_GENDER, "19").is_err());
    }

    #[test]
    fn date_of_birth_allows_unknown_month_and_day() {
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_DATE_OF_BIRTH, "19750710").is_ok());
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_DATE_OF_BIRTH, "19750000").is_ok());
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_DATE_OF_BIRTH, "19751315").is_err());
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_DATE_OF_BIRTH, "1975-07-10").is_err());
    }

    #[test]
    fn postal_code_is_dutch_format() {
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_POSTAL_CODE, "1234AB").is_ok());
        assert!(SamlAttribute::new(SamlAttribute::CONSUMER_POSTAL_CODE, "AB1234").is_err());
    }

    #[test]
    fn unregistered_names_are_accepted() {
        let attribute = SamlAttribute::new("urn:example:custom", "anything\u{1F512}").unwrap();
        assert_eq!(attribute.value(), "anything\u{1F512}");
    }
}
