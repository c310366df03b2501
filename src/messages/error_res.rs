//! The shared `AcquirerErrorRes` envelope returned in place of any success
//! response.

use serde::Deserialize;

/// Marker substring that identifies the error envelope.
pub const ERROR_RES_MARKER: &str = "AcquirerErrorRes";

/// True when the document carries the named root element. Marker dispatch
/// is cheaper and more robust here than a trial deserialization.
pub fn has_marker(xml: &str, marker: &str) -> bool {
    xml.contains(&format!("<{marker}"))
        || xml.contains(&format!(":{marker}"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResXml {
    #[serde(rename = "createDateTimestamp")]
    pub create_date_timestamp: String,
    #[serde(rename = "Error")]
    pub error: ErrorXml,
    #[serde(rename = "Acquirer", default)]
    pub acquirer: Option<AcquirerXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorXml {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    #[serde(rename = "errorDetail", default)]
    pub error_detail: Option<String>,
    #[serde(rename = "suggestedAction", default)]
    pub suggested_action: Option<String>,
    #[serde(rename = "consumerMessage", default)]
    pub consumer_message: Option<String>,
    /// May carry a SAML response explaining the error.
    #[serde(rename = "container", default)]
    pub container: Option<ContainerXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcquirerXml {
    #[serde(rename = "acquirerID")]
    pub acquirer_id: String,
}

/// Only used to detect presence; the container content itself is always
/// re-extracted from the raw text so signatures stay byte-exact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerXml {}
