use crate::error::CommunicatorError;
use crate::messages::error_res::{ERROR_RES_MARKER, ErrorResXml, has_marker};
use crate::messages::transaction::model::{AcquirerTrxResXml, TRX_RES_MARKER};

#[derive(Debug)]
pub enum TransactionOutcome {
    Success(AcquirerTrxResXml),
    Error(ErrorResXml),
}

pub fn parse(xml: &str) -> Result<TransactionOutcome, CommunicatorError> {
    if has_marker(xml, TRX_RES_MARKER) {
        Ok(TransactionOutcome::Success(quick_xml::de::from_str(xml)?))
    } else if has_marker(xml, ERROR_RES_MARKER) {
        Ok(TransactionOutcome::Error(quick_xml::de::from_str(xml)?))
    } else {
        Err(CommunicatorError::Xml(
            "response is neither AcquirerTrxRes nor AcquirerErrorRes".to_string(),
        ))
    }
}
