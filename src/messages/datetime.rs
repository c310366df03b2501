//! Timestamp normalization for outgoing messages.
//!
//! The acquirer expects every timestamp as UTC with exactly three fraction
//! digits (`yyyy-MM-ddTHH:mm:ss.fffZ`). Builders emit RFC 3339 values and
//! run the finished document through [`process_datetimes`] to rewrite them.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::CommunicatorError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a timestamp the way the protocol expects it.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Rewrite the named timestamp locations to the protocol format. A spec is
/// either an element local name (`createDateTimestamp`) or
/// `Element@Attribute` (`AuthnRequest@IssueInstant`). Locations that do not
/// occur in the document are skipped; values that occur but do not parse as
/// RFC 3339 are an error.
pub fn process_datetimes(xml: &str, specs: &[&str]) -> Result<String, CommunicatorError> {
    let mut document = xml.to_string();
    for spec in specs {
        document = match spec.split_once('@') {
            Some((element, attribute)) => rewrite_attribute(&document, element, attribute)?,
            None => rewrite_element(&document, spec)?,
        };
    }
    Ok(document)
}

fn reformat(value: &str) -> Result<String, CommunicatorError> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|e| CommunicatorError::Xml(format!("invalid timestamp '{value}': {e}")))?;
    Ok(format_timestamp(parsed.with_timezone(&Utc)))
}

fn rewrite_element(xml: &str, local_name: &str) -> Result<String, CommunicatorError> {
    let pattern = format!(
        r"(<(?:[A-Za-z0-9_.-]+:)?{local_name}(?:\s[^>]*)?>)([^<]+)(</)",
        local_name = regex::escape(local_name)
    );
    let re = Regex::new(&pattern).map_err(|e| CommunicatorError::Xml(e.to_string()))?;
    replace_all_fallible(&re, xml)
}

fn rewrite_attribute(xml: &str, local_name: &str, attribute: &str) -> Result<String, CommunicatorError> {
    let pattern = format!(
        r#"(<(?:[A-Za-z0-9_.-]+:)?{local_name}[^>]*\s{attribute}=")([^"]+)(")"#,
        local_name = regex::escape(local_name),
        attribute = regex::escape(attribute)
    );
    let re = Regex::new(&pattern).map_err(|e| CommunicatorError::Xml(e.to_string()))?;
    replace_all_fallible(&re, xml)
}

fn replace_all_fallible(re: &Regex, xml: &str) -> Result<String, CommunicatorError> {
    let mut result = String::with_capacity(xml.len());
    let mut last = 0;
    for captures in re.captures_iter(xml) {
        let whole = captures.get(0).ok_or_else(|| {
            CommunicatorError::Xml("timestamp match without capture".to_string())
        })?;
        let (prefix, value, suffix) = (&captures[1], &captures[2], &captures[3]);
        result.push_str(&xml[last..whole.start()]);
        result.push_str(prefix);
        result.push_str(&reformat(value.trim())?);
        result.push_str(suffix);
        last = whole.end();
    }
    result.push_str(&xml[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_timestamps_get_three_fraction_digits() {
        let xml = "<DirectoryReq><createDateTimestamp>2020-01-02T03:04:05.123456789+00:00\
                   </createDateTimestamp></DirectoryReq>";
        let rewritten = process_datetimes(xml, &["createDateTimestamp"]).unwrap();
        assert!(rewritten.contains("<createDateTimestamp>2020-01-02T03:04:05.123Z</createDateTimestamp>"));
    }

    #[test]
    fn offsets_are_converted_to_utc() {
        let xml = "<a><statusDateTimestamp>2020-06-01T12:00:00+02:00</statusDateTimestamp></a>";
        let rewritten = process_datetimes(xml, &["statusDateTimestamp"]).unwrap();
        assert!(rewritten.contains(">2020-06-01T10:00:00.000Z<"));
    }

    #[test]
    fn attribute_specs_rewrite_the_attribute() {
        let xml = "<samlp:AuthnRequest ID=\"x\" IssueInstant=\"2020-01-02T03:04:05Z\" \
                   Version=\"2.0\"/>";
        let rewritten = process_datetimes(xml, &["AuthnRequest@IssueInstant"]).unwrap();
        assert!(rewritten.contains("IssueInstant=\"2020-01-02T03:04:05.000Z\""));
    }

    #[test]
    fn absent_locations_are_skipped() {
        let xml = "<DirectoryReq><Merchant/></DirectoryReq>";
        let rewritten = process_datetimes(xml, &["createDateTimestamp"]).unwrap();
        assert_eq!(rewritten, xml);
    }

    #[test]
    fn unparseable_timestamps_are_an_error() {
        let xml = "<a><createDateTimestamp>yesterday</createDateTimestamp></a>";
        assert!(process_datetimes(xml, &["createDateTimestamp"]).is_err());
    }
}
