//! XSD validation of every message before it is sent and after it is
//! received.

use std::collections::HashMap;

use libxml::parser::Parser;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};
use tracing::debug;

use crate::error::{CommunicatorError, SchemaPhase};

const IDX_SCHEMA: &str = include_str!("schemas/idx.merchant-acquirer.1.0.xsd");

const IDX_ROOTS: &[&str] = &[
    "DirectoryReq",
    "DirectoryRes",
    "AcquirerTrxReq",
    "AcquirerTrxRes",
    "AcquirerStatusReq",
    "AcquirerStatusRes",
    "AcquirerErrorRes",
];

/// Maps root element local names to their XSD source. Documents with an
/// unknown root pass through unvalidated; embedded SAML and signature
/// content is checked laxly by the iDx schema itself.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, &'static str>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        for root in IDX_ROOTS {
            schemas.insert(*root, IDX_SCHEMA);
        }
        Self { schemas }
    }

    /// Validate one document. `phase` only flavors the error so request-side
    /// bugs are distinguishable from acquirer-side ones.
    pub fn verify(&self, xml: &str, phase: SchemaPhase) -> Result<(), CommunicatorError> {
        let document = Parser::default().parse_string(xml).map_err(|e| {
            CommunicatorError::Schema {
                phase,
                message: e.to_string(),
            }
        })?;

        let root = match document.get_root_element() {
            Some(root) => root.get_name(),
            None => {
                return Err(CommunicatorError::Schema {
                    phase,
                    message: "document has no root element".to_string(),
                });
            }
        };
        let Some(source) = self.schemas.get(root.as_str()) else {
            debug!(root, "no schema registered for root element");
            return Ok(());
        };

        let mut parser_context = SchemaParserContext::from_buffer(source);
        let mut validator = SchemaValidationContext::from_parser(&mut parser_context)
            .map_err(|errors| CommunicatorError::Schema {
                phase,
                message: join_messages(&errors),
            })?;

        validator
            .validate_document(&document)
            .map_err(|errors| CommunicatorError::Schema {
                phase,
                message: join_messages(&errors),
            })
    }
}

fn join_messages(errors: &[libxml::error::StructuredError]) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|error| error.message.as_deref())
        .map(str::trim)
        .collect();
    if messages.is_empty() {
        "schema validation failed".to_string()
    } else {
        messages.join("; ")
    }
}
