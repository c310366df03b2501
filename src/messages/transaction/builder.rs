use std::io::Cursor;
use std::time::Duration;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::Configuration;
use crate::error::CommunicatorError;
use crate::messages::constants::{IDX_NAMESPACE, IDX_PRODUCT_ID, IDX_VERSION};
use crate::messages::datetime::process_datetimes;
use crate::requests::AuthenticationRequest;

const MAX_TRANSACTION_EXPIRATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Build an `AcquirerTrxReq` document around an already-signed AuthnRequest.
/// The signed document goes into `<container>` byte for byte, so its
/// signature stays verifiable downstream.
pub fn build_transaction_request(
    configuration: &Configuration,
    request: &AuthenticationRequest,
    signed_authn_request: &str,
) -> Result<String, CommunicatorError> {
    if let Some(period) = request.expiration_period()
        && period > MAX_TRANSACTION_EXPIRATION
    {
        return Err(CommunicatorError::RequestValidation(
            "ExpirationPeriod should be less than 7 days".to_string(),
        ));
    }

    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("AcquirerTrxReq");
    root.push_attribute(("xmlns", IDX_NAMESPACE));
    root.push_attribute(("productID", IDX_PRODUCT_ID));
    root.push_attribute(("version", IDX_VERSION));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("createDateTimestamp")))?;
    writer.write_event(Event::Text(BytesText::new(
        &request.create_date_timestamp().to_rfc3339(),
    )))?;
    writer.write_event(Event::End(BytesEnd::new("createDateTimestamp")))?;

    writer.write_event(Event::Start(BytesStart::new("Issuer")))?;
    writer.write_event(Event::Start(BytesStart::new("issuerID")))?;
    writer.write_event(Event::Text(BytesText::new(request.issuer_id())))?;
    writer.write_event(Event::End(BytesEnd::new("issuerID")))?;
    writer.write_event(Event::End(BytesEnd::new("Issuer")))?;

    writer.write_event(Event::Start(BytesStart::new("Merchant")))?;
    writer.write_event(Event::Start(BytesStart::new("merchantID")))?;
    writer.write_event(Event::Text(BytesText::new(&configuration.merchant_id)))?;
    writer.write_event(Event::End(BytesEnd::new("merchantID")))?;
    writer.write_event(Event::Start(BytesStart::new("subID")))?;
    writer.write_event(Event::Text(BytesText::new(
        &configuration.merchant_sub_id.to_string(),
    )))?;
    writer.write_event(Event::End(BytesEnd::new("subID")))?;
    writer.write_event(Event::Start(BytesStart::new("merchantReturnURL")))?;
    writer.write_event(Event::Text(BytesText::new(
        configuration.merchant_return_url.as_str(),
    )))?;
    writer.write_event(Event::End(BytesEnd::new("merchantReturnURL")))?;
    writer.write_event(Event::End(BytesEnd::new("Merchant")))?;

    writer.write_event(Event::Start(BytesStart::new("Transaction")))?;
    writer.write_event(Event::Start(BytesStart::new("entranceCode")))?;
    writer.write_event(Event::Text(BytesText::new(request.entrance_code())))?;
    writer.write_event(Event::End(BytesEnd::new("entranceCode")))?;
    if let Some(period) = request.expiration_period() {
        writer.write_event(Event::Start(BytesStart::new("expirationPeriod")))?;
        writer.write_event(Event::Text(BytesText::new(&format_iso8601_duration(
            period,
        ))))?;
        writer.write_event(Event::End(BytesEnd::new("expirationPeriod")))?;
    }
    writer.write_event(Event::Start(BytesStart::new("language")))?;
    writer.write_event(Event::Text(BytesText::new(request.language())))?;
    writer.write_event(Event::End(BytesEnd::new("language")))?;

    writer.write_event(Event::Start(BytesStart::new("container")))?;
    writer.write_event(Event::Text(BytesText::from_escaped(strip_declaration(
        signed_authn_request,
    ))))?;
    writer.write_event(Event::End(BytesEnd::new("container")))?;
    writer.write_event(Event::End(BytesEnd::new("Transaction")))?;

    writer.write_event(Event::End(BytesEnd::new("AcquirerTrxReq")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| CommunicatorError::Xml(e.to_string()))?;
    process_datetimes(&xml, &["createDateTimestamp"])
}

/// An embedded document must not carry its own XML declaration.
fn strip_declaration(xml: &str) -> &str {
    if let Some(rest) = xml.strip_prefix("<?xml")
        && let Some(end) = rest.find("?>")
    {
        rest[end + 2..].trim_start()
    } else {
        xml
    }
}

/// ISO-8601 duration, e.g. `PT5M` or `P1DT12H`.
fn format_iso8601_duration(period: Duration) -> String {
    let total = period.as_secs();
    if total == 0 {
        return "PT0S".to_string();
    }
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;

    let mut out = String::from("P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}
