//! XML processing utilities for signature handling: signature span
//! discovery, the enveloped-signature transform, canonicalization and
//! namespace-prefix rewriting.
//!
//! All helpers work on the serialized document text. Signing and
//! verification both run the exact same transforms over the exact same
//! bytes, so a document signed here verifies here regardless of how the
//! producing serializer laid out whitespace or prefixes.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;
use xml_c14n::{CanonicalizationMode, CanonicalizationOptions};

use super::constants::{SIGNATURE_ELEMENT_NAMES, XMLDSIG_NAMESPACE};
use crate::error::CommunicatorError;

fn signature_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"</?(?:[A-Za-z0-9_.-]+:)?Signature[\s/>]").expect("valid pattern")
    })
}

/// Byte ranges of every `Signature` element in the document, prefix-aware,
/// in document order. Nested signatures are folded into their outermost
/// enclosing span.
pub fn signature_spans(xml: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for m in signature_tag_re().find_iter(xml) {
        if xml[m.start()..].starts_with("</") {
            if depth > 0 {
                depth -= 1;
                if depth == 0 {
                    let end = xml[m.start()..]
                        .find('>')
                        .map(|i| m.start() + i + 1)
                        .unwrap_or(m.end());
                    spans.push(start..end);
                }
            }
        } else {
            if depth == 0 {
                start = m.start();
            }
            depth += 1;
        }
    }
    spans
}

/// The enveloped-signature transform: the document with every `Signature`
/// element removed.
pub fn remove_signatures(xml: &str) -> String {
    let mut result = xml.to_string();
    for span in signature_spans(xml).into_iter().rev() {
        result.replace_range(span, "");
    }
    result
}

/// Exclusive XML canonicalization (C14N) of a standalone document.
pub fn canonicalize(xml: &str) -> Result<String, CommunicatorError> {
    let options = CanonicalizationOptions {
        mode: CanonicalizationMode::ExclusiveCanonical1_0,
        keep_comments: false,
        inclusive_ns_prefixes: vec![],
    };
    xml_c14n::canonicalize_xml(xml, options)
        .map_err(|e| CommunicatorError::Xml(format!("canonicalization failed: {e}")))
}

/// Rewrite a generated signature fragment into namespaced form: every
/// signature element gets `prefix:` and the `xmlns` declaration becomes
/// `xmlns:prefix`.
pub fn apply_prefix(xml: &str, prefix: &str) -> String {
    let mut result = xml.to_string();
    for name in SIGNATURE_ELEMENT_NAMES {
        result = result
            .replace(&format!("<{name} "), &format!("<{prefix}:{name} "))
            .replace(&format!("<{name}>"), &format!("<{prefix}:{name}>"))
            .replace(&format!("<{name}/>"), &format!("<{prefix}:{name}/>"))
            .replace(&format!("</{name}>"), &format!("</{prefix}:{name}>"));
    }
    result.replace("xmlns=\"", &format!("xmlns:{prefix}=\""))
}

/// Text content of the first element with the given local name, any prefix.
pub fn element_text(xml: &str, local_name: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r"<(?:[A-Za-z0-9_.-]+:)?{local_name}(?:\s[^>]*)?>([^<]*)</"
    ))
    .ok()?;
    re.captures(xml).map(|c| c[1].trim().to_string())
}

/// Value of `attribute` on the first element with the given local name.
pub fn attribute_value(xml: &str, local_name: &str, attribute: &str) -> Option<String> {
    let re = Regex::new(&format!(
        r#"<(?:[A-Za-z0-9_.-]+:)?{local_name}[^>]*\s{attribute}\s*=\s*"([^"]*)""#
    ))
    .ok()?;
    re.captures(xml).map(|c| c[1].to_string())
}

/// Byte range and written tag name (prefix included) of the first element
/// with the given local name. Assumes the element does not nest within
/// another element of the same name.
pub fn element_span(xml: &str, local_name: &str) -> Option<(Range<usize>, String)> {
    let re = Regex::new(&format!(r"<((?:[A-Za-z0-9_.-]+:)?{local_name})[\s>]")).ok()?;
    let captures = re.captures(xml)?;
    let written = captures.get(1)?.as_str().to_string();
    let start = captures.get(0)?.start();
    let close = format!("</{written}>");
    let end = xml[start..].find(&close)? + start + close.len();
    Some((start..end, written))
}

/// Redeclare the XML-DSig namespace on an extracted signature fragment so
/// it canonicalizes standalone exactly as it did when it was signed in
/// place.
pub fn inject_dsig_namespace(fragment: &str, written_name: &str) -> String {
    let open_end = fragment.find('>').unwrap_or(0);
    if fragment[..open_end].contains("xmlns") {
        return fragment.to_string();
    }
    debug!(element = written_name, "redeclaring dsig namespace on extracted fragment");
    let declaration = match written_name.split_once(':') {
        Some((prefix, _)) => format!(" xmlns:{prefix}=\"{XMLDSIG_NAMESPACE}\""),
        None => format!(" xmlns=\"{XMLDSIG_NAMESPACE}\""),
    };
    let insert_at = written_name.len() + 1;
    format!(
        "{}{}{}",
        &fragment[..insert_at],
        declaration,
        &fragment[insert_at..]
    )
}
