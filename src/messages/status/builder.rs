use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::Configuration;
use crate::error::CommunicatorError;
use crate::messages::constants::{IDX_NAMESPACE, IDX_PRODUCT_ID, IDX_VERSION};
use crate::messages::datetime::process_datetimes;
use crate::requests::StatusRequest;

/// Build an `AcquirerStatusReq` document, unsigned.
pub fn build_status_request(
    configuration: &Configuration,
    request: &StatusRequest,
    create_date_timestamp: DateTime<Utc>,
) -> Result<String, CommunicatorError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("AcquirerStatusReq");
    root.push_attribute(("xmlns", IDX_NAMESPACE));
    root.push_attribute(("productID", IDX_PRODUCT_ID));
    root.push_attribute(("version", IDX_VERSION));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("createDateTimestamp")))?;
    writer.write_event(Event::Text(BytesText::new(
        &create_date_timestamp.to_rfc3339(),
    )))?;
    writer.write_event(Event::End(BytesEnd::new("createDateTimestamp")))?;

    writer.write_event(Event::Start(BytesStart::new("Merchant")))?;
    writer.write_event(Event::Start(BytesStart::new("merchantID")))?;
    writer.write_event(Event::Text(BytesText::new(&configuration.merchant_id)))?;
    writer.write_event(Event::End(BytesEnd::new("merchantID")))?;
    writer.write_event(Event::Start(BytesStart::new("subID")))?;
    writer.write_event(Event::Text(BytesText::new(
        &configuration.merchant_sub_id.to_string(),
    )))?;
    writer.write_event(Event::End(BytesEnd::new("subID")))?;
    writer.write_event(Event::End(BytesEnd::new("Merchant")))?;

    writer.write_event(Event::Start(BytesStart::new("Transaction")))?;
    writer.write_event(Event::Start(BytesStart::new("transactionID")))?;
    writer.write_event(Event::Text(BytesText::new(request.transaction_id())))?;
    writer.write_event(Event::End(BytesEnd::new("transactionID")))?;
    writer.write_event(Event::End(BytesEnd::new("Transaction")))?;

    writer.write_event(Event::End(BytesEnd::new("AcquirerStatusReq")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| CommunicatorError::Xml(e.to_string()))?;
    process_datetimes(&xml, &["createDateTimestamp"])
}
