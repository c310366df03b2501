use crate::error::CommunicatorError;
use crate::messages::error_res::{ERROR_RES_MARKER, ErrorResXml, has_marker};
use crate::messages::status::model::{AcquirerStatusResXml, STATUS_RES_MARKER};
use crate::xmldsig::utils::element_span;

#[derive(Debug)]
pub enum StatusOutcome {
    Success(AcquirerStatusResXml),
    Error(ErrorResXml),
}

pub fn parse(xml: &str) -> Result<StatusOutcome, CommunicatorError> {
    if has_marker(xml, STATUS_RES_MARKER) {
        Ok(StatusOutcome::Success(quick_xml::de::from_str(xml)?))
    } else if has_marker(xml, ERROR_RES_MARKER) {
        Ok(StatusOutcome::Error(quick_xml::de::from_str(xml)?))
    } else {
        Err(CommunicatorError::Xml(
            "response is neither AcquirerStatusRes nor AcquirerErrorRes".to_string(),
        ))
    }
}

/// The verbatim content of the first `container` element. Extracted from
/// the raw text rather than a DOM so embedded signatures keep their exact
/// byte representation.
pub fn container_content(xml: &str) -> Option<&str> {
    let (range, written_name) = element_span(xml, "container")?;
    let element = &xml[range.clone()];
    let open_end = element.find('>')?;
    let close = format!("</{written_name}>");
    let inner = element.get(open_end + 1..element.len().checked_sub(close.len())?)?;
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_res(transaction_extra: &str) -> String {
        format!(
            "<AcquirerStatusRes xmlns=\"urn:example\" version=\"1.0.0\" \
             productID=\"NL:BVN:BankID:1.0\">\
             <createDateTimestamp>2020-01-02T03:04:05.000Z</createDateTimestamp>\
             <Acquirer><acquirerID>0001</acquirerID></Acquirer>\
             <Transaction><transactionID>0001000000000001</transactionID>\
             <status>Success</status>\
             <statusDateTimestamp>2020-01-02T03:05:00.000Z</statusDateTimestamp>\
             {transaction_extra}</Transaction></AcquirerStatusRes>"
        )
    }

    #[test]
    fn success_envelope_with_container() {
        let xml = status_res("<container><samlp:Response ID=\"_x\">body</samlp:Response></container>");
        let StatusOutcome::Success(res) = parse(&xml).unwrap() else {
            panic!("expected success outcome");
        };
        assert_eq!(res.transaction.status, "Success");
        assert!(res.transaction.container.is_some());
        assert_eq!(
            container_content(&xml),
            Some("<samlp:Response ID=\"_x\">body</samlp:Response>")
        );
    }

    #[test]
    fn container_absence_is_visible() {
        let xml = status_res("");
        let StatusOutcome::Success(res) = parse(&xml).unwrap() else {
            panic!("expected success outcome");
        };
        assert!(res.transaction.container.is_none());
        assert_eq!(container_content(&xml), None);
    }
}
