use serde::Deserialize;

/// Marker substring that identifies the directory success envelope.
pub const DIRECTORY_RES_MARKER: &str = "DirectoryRes";

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryResXml {
    #[serde(rename = "createDateTimestamp")]
    pub create_date_timestamp: String,
    #[serde(rename = "Acquirer")]
    pub acquirer: DirectoryAcquirerXml,
    #[serde(rename = "Directory")]
    pub directory: DirectoryXml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryAcquirerXml {
    #[serde(rename = "acquirerID")]
    pub acquirer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryXml {
    #[serde(rename = "directoryDateTimestamp")]
    pub directory_date_timestamp: String,
    #[serde(rename = "Country", default)]
    pub countries: Vec<CountryXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryXml {
    #[serde(rename = "countryNames")]
    pub country_names: String,
    #[serde(rename = "Issuer", default)]
    pub issuers: Vec<IssuerXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuerXml {
    #[serde(rename = "issuerID")]
    pub issuer_id: String,
    #[serde(rename = "issuerName")]
    pub issuer_name: String,
}
