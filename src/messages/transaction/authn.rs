//! The SAML AuthnRequest embedded in the transaction request.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::config::Configuration;
use crate::error::CommunicatorError;
use crate::messages::constants::{
    AUTHN_REQUEST_VERSION, BANKID_PROTOCOL_BINDING, SAML_ASSERTION_NAMESPACE,
    SAML_PROTOCOL_NAMESPACE,
};
use crate::messages::datetime::process_datetimes;
use crate::requests::AuthenticationRequest;
use crate::saml::SamlAttribute;

/// Build the AuthnRequest for a new transaction. The document id of the
/// request becomes the SAML request id, the merchant id the issuer, and the
/// requested service bitset the attribute consuming service index. No XML
/// declaration: the document ends up inside the iDx container.
pub fn build_authn_request(
    configuration: &Configuration,
    request: &AuthenticationRequest,
) -> Result<String, CommunicatorError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut root = BytesStart::new("samlp:AuthnRequest");
    root.push_attribute(("xmlns:samlp", SAML_PROTOCOL_NAMESPACE));
    root.push_attribute(("xmlns:saml", SAML_ASSERTION_NAMESPACE));
    root.push_attribute(("ID", request.merchant_reference()));
    root.push_attribute(("Version", AUTHN_REQUEST_VERSION));
    root.push_attribute((
        "IssueInstant",
        request.create_date_timestamp().to_rfc3339().as_str(),
    ));
    root.push_attribute(("ForceAuthn", "true"));
    root.push_attribute(("IsPassive", "false"));
    root.push_attribute(("ProtocolBinding", BANKID_PROTOCOL_BINDING));
    root.push_attribute((
        "AssertionConsumerServiceURL",
        configuration.merchant_return_url.as_str(),
    ));
    root.push_attribute((
        "AttributeConsumingServiceIndex",
        request.requested_service_id().bits().to_string().as_str(),
    ));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("saml:Issuer")))?;
    writer.write_event(Event::Text(BytesText::new(&configuration.merchant_id)))?;
    writer.write_event(Event::End(BytesEnd::new("saml:Issuer")))?;

    if let Some(document_id) = request.document_id() {
        writer.write_event(Event::Start(BytesStart::new("samlp:Extensions")))?;
        let mut attribute = BytesStart::new("saml:Attribute");
        attribute.push_attribute(("Name", SamlAttribute::DOCUMENT_ID));
        writer.write_event(Event::Start(attribute))?;
        writer.write_event(Event::Start(BytesStart::new("saml:AttributeValue")))?;
        writer.write_event(Event::Text(BytesText::new(document_id)))?;
        writer.write_event(Event::End(BytesEnd::new("saml:AttributeValue")))?;
        writer.write_event(Event::End(BytesEnd::new("saml:Attribute")))?;
        writer.write_event(Event::End(BytesEnd::new("samlp:Extensions")))?;
    }

    writer.write_event(Event::Empty(BytesStart::new("saml:Conditions")))?;

    let mut context = BytesStart::new("samlp:RequestedAuthnContext");
    context.push_attribute(("Comparison", "minimum"));
    writer.write_event(Event::Start(context))?;
    writer.write_event(Event::Start(BytesStart::new("saml:AuthnContextClassRef")))?;
    writer.write_event(Event::Text(BytesText::new(
        request.assurance_level().urn(),
    )))?;
    writer.write_event(Event::End(BytesEnd::new("saml:AuthnContextClassRef")))?;
    writer.write_event(Event::End(BytesEnd::new("samlp:RequestedAuthnContext")))?;

    writer.write_event(Event::Empty(BytesStart::new("samlp:Scoping")))?;

    writer.write_event(Event::End(BytesEnd::new("samlp:AuthnRequest")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| CommunicatorError::Xml(e.to_string()))?;
    process_datetimes(&xml, &["AuthnRequest@IssueInstant"])
}
