use serde::Deserialize;

/// Marker substring that identifies the transaction success envelope.
pub const TRX_RES_MARKER: &str = "AcquirerTrxRes";

#[derive(Debug, Clone, Deserialize)]
pub struct AcquirerTrxResXml {
    #[serde(rename = "createDateTimestamp")]
    pub create_date_timestamp: String,
    #[serde(rename = "Acquirer")]
    pub acquirer: TrxAcquirerXml,
    #[serde(rename = "Issuer")]
    pub issuer: TrxIssuerXml,
    #[serde(rename = "Transaction")]
    pub transaction: TrxTransactionXml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrxAcquirerXml {
    #[serde(rename = "acquirerID")]
    pub acquirer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrxIssuerXml {
    /// Where to redirect the consumer's browser.
    #[serde(rename = "issuerAuthenticationURL")]
    pub issuer_authentication_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrxTransactionXml {
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
    #[serde(rename = "transactionCreateDateTimestamp")]
    pub transaction_create_date_timestamp: String,
}
