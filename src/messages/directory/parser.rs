use crate::error::CommunicatorError;
use crate::messages::directory::model::{DIRECTORY_RES_MARKER, DirectoryResXml};
use crate::messages::error_res::{ERROR_RES_MARKER, ErrorResXml, has_marker};

/// Outcome of dispatching a directory response on its root element.
#[derive(Debug)]
pub enum DirectoryOutcome {
    Success(DirectoryResXml),
    Error(ErrorResXml),
}

pub fn parse(xml: &str) -> Result<DirectoryOutcome, CommunicatorError> {
    if has_marker(xml, DIRECTORY_RES_MARKER) {
        Ok(DirectoryOutcome::Success(quick_xml::de::from_str(xml)?))
    } else if has_marker(xml, ERROR_RES_MARKER) {
        Ok(DirectoryOutcome::Error(quick_xml::de::from_str(xml)?))
    } else {
        Err(CommunicatorError::Xml(
            "response is neither DirectoryRes nor AcquirerErrorRes".to_string(),
        ))
    }
}
