//! Parsing of the `samlp:Response` document delivered inside a status
//! response, including decryption of encrypted identifiers and attributes.

use serde::Deserialize;
use tracing::debug;

use crate::crypto::{CertificateKeyPair, SamlAttributesEncryptionKey, decrypt_xml};
use crate::error::CommunicatorError;
use crate::saml::attribute::SamlAttribute;
use crate::saml::status::SamlStatus;

/// Local names of the elements that arrive XML-Enc encrypted.
const ENCRYPTED_ELEMENT_NAMES: &[&str] = &["EncryptedID", "EncryptedAttribute"];

/// A parsed SAML response: transaction coordinates, the two-level status
/// and the delivered consumer attributes.
#[derive(Debug, Clone)]
pub struct SamlResponse {
    transaction_id: String,
    merchant_reference: String,
    version: String,
    acquirer_id: String,
    status: Option<SamlStatus>,
    attributes: Vec<SamlAttribute>,
}

impl SamlResponse {
    /// The transaction id echoed by the acquirer.
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// The merchant reference this response answers.
    pub fn merchant_reference(&self) -> &str {
        &self.merchant_reference
    }

    /// The SAML version of the response.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The acquirer id taken from the response issuer.
    pub fn acquirer_id(&self) -> &str {
        &self.acquirer_id
    }

    /// Details of the SAML status.
    pub fn status(&self) -> Option<&SamlStatus> {
        self.status.as_ref()
    }

    /// The delivered attributes, including the consumer identity derived
    /// from the subject.
    pub fn attributes(&self) -> &[SamlAttribute] {
        &self.attributes
    }

    /// Value of the attribute with the given name, when delivered.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name() == name)
            .map(SamlAttribute::value)
    }

    /// Decrypt and parse a `samlp:Response` document.
    ///
    /// The subject's `NameID` becomes either the transient id attribute
    /// (values carrying the `TRANS` marker) or the BIN attribute. Every
    /// delivered attribute value is validated while it is collected.
    pub fn parse(
        xml: &str,
        saml_key_pair: &CertificateKeyPair,
    ) -> Result<(Self, Vec<SamlAttributesEncryptionKey>), CommunicatorError> {
        let (decrypted, keys) = decrypt_xml(saml_key_pair, xml, ENCRYPTED_ELEMENT_NAMES)?;
        let response: ResponseXml = quick_xml::de::from_str(&decrypted)?;

        let status = match response.status {
            Some(status) => {
                let second_level = status
                    .status_code
                    .status_code
                    .as_ref()
                    .map(|inner| inner.value.clone())
                    .ok_or_else(|| {
                        CommunicatorError::Saml("Missing second level status code".to_string())
                    })?;
                Some(SamlStatus {
                    status_message: status.status_message.map(|m| m.value),
                    status_code_first_level: status.status_code.value,
                    status_code_second_level: second_level,
                })
            }
            None => None,
        };

        let mut attributes = Vec::new();

        // The subject of the first assertion carries the consumer identity.
        if let Some(name_id) = response
            .assertions
            .first()
            .and_then(|assertion| assertion.subject.as_ref())
            .and_then(|subject| subject.name_id.as_ref())
        {
            let name = if name_id.value.starts_with("TRANS") {
                SamlAttribute::CONSUMER_TRANSIENT_ID
            } else {
                SamlAttribute::CONSUMER_BIN
            };
            attributes.push(SamlAttribute::new(name, name_id.value.clone())?);
        }

        for assertion in &response.assertions {
            for statement in &assertion.attribute_statements {
                for attribute in &statement.attributes {
                    let value: String = attribute
                        .values
                        .iter()
                        .map(|v| v.value.as_str())
                        .collect();
                    attributes.push(SamlAttribute::new(attribute.name.clone(), value)?);
                }
            }
        }
        debug!(
            attributes = attributes.len(),
            transaction_id = response.id,
            "parsed SAML response"
        );

        Ok((
            Self {
                transaction_id: response.id,
                merchant_reference: response.in_response_to,
                version: response.version,
                acquirer_id: response.issuer.value,
                status,
                attributes,
            },
            keys,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ResponseXml {
    #[serde(rename = "@ID")]
    id: String,
    #[serde(rename = "@InResponseTo")]
    in_response_to: String,
    #[serde(rename = "@Version")]
    version: String,
    #[serde(rename = "saml:Issuer", alias = "Issuer")]
    issuer: TextValue,
    #[serde(rename = "samlp:Status", alias = "Status")]
    status: Option<StatusXml>,
    #[serde(rename = "saml:Assertion", alias = "Assertion", default)]
    assertions: Vec<AssertionXml>,
}

#[derive(Debug, Deserialize)]
struct StatusXml {
    #[serde(rename = "samlp:StatusCode", alias = "StatusCode")]
    status_code: StatusCodeXml,
    #[serde(rename = "samlp:StatusMessage", alias = "StatusMessage")]
    status_message: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct StatusCodeXml {
    #[serde(rename = "@Value")]
    value: String,
    #[serde(rename = "samlp:StatusCode", alias = "StatusCode", default)]
    status_code: Option<Box<StatusCodeXml>>,
}

#[derive(Debug, Deserialize)]
struct AssertionXml {
    #[serde(rename = "saml:Subject", alias = "Subject")]
    subject: Option<SubjectXml>,
    #[serde(rename = "saml:AttributeStatement", alias = "AttributeStatement", default)]
    attribute_statements: Vec<AttributeStatementXml>,
}

#[derive(Debug, Deserialize)]
struct SubjectXml {
    #[serde(rename = "saml:NameID", alias = "NameID")]
    name_id: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct AttributeStatementXml {
    #[serde(rename = "saml:Attribute", alias = "Attribute", default)]
    attributes: Vec<AttributeXml>,
}

#[derive(Debug, Deserialize)]
struct AttributeXml {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "saml:AttributeValue", alias = "AttributeValue", default)]
    values: Vec<TextValue>,
}

#[derive(Debug, Default, Deserialize)]
struct TextValue {
    #[serde(rename = "$text", default)]
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::status::STATUS_SUCCESS;
    use crate::xmldsig::test_support::test_key_pair;

    fn sample_response(name_id: &str) -> String {
        format!(
            "<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" \
             xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
             ID=\"_tx1234\" InResponseTo=\"MREF1\" Version=\"2.0\">\
             <saml:Issuer>INGBNL2A</saml:Issuer>\
             <samlp:Status>\
             <samlp:StatusCode Value=\"{STATUS_SUCCESS}\">\
             <samlp:StatusCode Value=\"{STATUS_SUCCESS}\"/>\
             </samlp:StatusCode>\
             </samlp:Status>\
             <saml:Assertion><saml:Issuer>INGBNL2A</saml:Issuer>\
             <saml:Subject><saml:NameID>{name_id}</saml:NameID></saml:Subject>\
             <saml:AttributeStatement>\
             <saml:Attribute Name=\"urn:nl:bvn:bankid:1.0:consumer.preferredlastname\">\
             <saml:AttributeValue>John</saml:AttributeValue></saml:Attribute>\
             </saml:AttributeStatement>\
             <saml:AttributeStatement>\
             <saml:Attribute Name=\"urn:nl:bvn:bankid:1.0:bankid.deliveredserviceid\">\
             <saml:AttributeValue>16408</saml:AttributeValue></saml:Attribute>\
             </saml:AttributeStatement>\
             </saml:Assertion></samlp:Response>"
        )
    }

    #[test]
    fn bin_subject_becomes_the_bin_attribute() {
        let key_pair = test_key_pair();
        let (response, keys) =
            SamlResponse::parse(&sample_response("NLFANTASY123"), &key_pair).unwrap();

        assert_eq!(response.transaction_id(), "_tx1234");
        assert_eq!(response.merchant_reference(), "MREF1");
        assert_eq!(response.acquirer_id(), "INGBNL2A");
        assert!(response.status().unwrap().is_success());
        assert_eq!(
            response.attribute_value(SamlAttribute::CONSUMER_BIN),
            Some("NLFANTASY123")
        );
        assert_eq!(
            response.attribute_value(SamlAttribute::CONSUMER_PREF_LAST_NAME),
            Some("John")
        );
        assert_eq!(
            response.attribute_value(SamlAttribute::DELIVERED_SERVICE_ID),
            Some("16408")
        );
        assert!(keys.is_empty());
    }

    #[test]
    fn trans_marker_becomes_the_transient_id_attribute() {
        let key_pair = test_key_pair();
        let (response, _) =
            SamlResponse::parse(&sample_response("TRANS1234567890"), &key_pair).unwrap();

        assert_eq!(
            response.attribute_value(SamlAttribute::CONSUMER_TRANSIENT_ID),
            Some("TRANS1234567890")
        );
        assert_eq!(response.attribute_value(SamlAttribute::CONSUMER_BIN), None);
    }

    #[test]
    fn missing_second_level_status_is_an_error() {
        let key_pair = test_key_pair();
        let xml = "<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" \
             xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\" \
             ID=\"_tx\" InResponseTo=\"M\" Version=\"2.0\">\
             <saml:Issuer>INGBNL2A</saml:Issuer>\
             <samlp:Status><samlp:StatusCode \
             Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/></samlp:Status>\
             </samlp:Response>";

        let result = SamlResponse::parse(xml, &key_pair);
        assert!(matches!(result, Err(CommunicatorError::Saml(_))));
    }

    #[test]
    fn invalid_delivered_attribute_value_is_rejected() {
        let key_pair = test_key_pair();
        let xml = sample_response("NLFANTASY123").replace(
            "urn:nl:bvn:bankid:1.0:consumer.preferredlastname\">\
             <saml:AttributeValue>John",
            "urn:nl:bvn:bankid:1.0:consumer.gender\">\
             <saml:AttributeValue>7",
        );

        let result = SamlResponse::parse(&xml, &key_pair);
        assert!(matches!(result, Err(CommunicatorError::Saml(_))));
    }
}
