use serde::Deserialize;

use crate::messages::error_res::ContainerXml;

/// Marker substring that identifies the status success envelope.
pub const STATUS_RES_MARKER: &str = "AcquirerStatusRes";

#[derive(Debug, Clone, Deserialize)]
pub struct AcquirerStatusResXml {
    #[serde(rename = "createDateTimestamp")]
    pub create_date_timestamp: String,
    #[serde(rename = "Acquirer")]
    pub acquirer: StatusAcquirerXml,
    #[serde(rename = "Transaction")]
    pub transaction: StatusTransactionXml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusAcquirerXml {
    #[serde(rename = "acquirerID")]
    pub acquirer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusTransactionXml {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    pub status: String,
    #[serde(rename = "statusDateTimestamp", default)]
    pub status_date_timestamp: Option<String>,
    /// Presence marker only; the SAML document inside is re-extracted from
    /// the raw response text.
    #[serde(rename = "container", default)]
    pub container: Option<ContainerXml>,
}
