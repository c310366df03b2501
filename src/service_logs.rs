//! Raw message dumps of everything sent to and received from the routing
//! service, kept for dispute handling with the acquirer.

use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::ServiceLogsConfig;

fn root_element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // First element open tag, skipping the XML declaration.
    RE.get_or_init(|| Regex::new(r"<(?:([A-Za-z0-9_.-]+):)?([A-Za-z0-9_.-]+)[\s/>]").expect("valid pattern"))
}

/// Writes each XML message to its own file, named after a configurable
/// pattern. Pattern placeholders: `%Y` year, `%M` month, `%D` day, `%h`
/// hours, `%m` minutes, `%s` seconds, `%f` milliseconds, `%a` the local
/// name of the message's root element.
#[derive(Debug, Clone)]
pub struct ServiceLogger {
    config: ServiceLogsConfig,
}

impl ServiceLogger {
    pub fn new(config: ServiceLogsConfig) -> Self {
        Self { config }
    }

    /// Write one message. Failures are logged and swallowed so a full disk
    /// never interrupts a transaction.
    pub fn log_message(&self, xml: &str) {
        if !self.config.enabled {
            return;
        }

        let path = self.message_path(xml);
        if let Some(parent) = path.parent()
            && let Err(error) = std::fs::create_dir_all(parent)
        {
            warn!(%error, path = %parent.display(), "could not create service log directory");
            return;
        }
        match std::fs::write(&path, xml) {
            Ok(()) => debug!(path = %path.display(), "wrote service log"),
            Err(error) => warn!(%error, path = %path.display(), "could not write service log"),
        }
    }

    fn message_path(&self, xml: &str) -> PathBuf {
        let now = Local::now();
        let name = self
            .config
            .pattern
            .replace("%Y", &now.format("%Y").to_string())
            .replace("%M", &now.format("%m").to_string())
            .replace("%D", &now.format("%d").to_string())
            .replace("%h", &now.format("%H").to_string())
            .replace("%m", &now.format("%M").to_string())
            .replace("%s", &now.format("%S").to_string())
            .replace("%f", &now.format("%3f").to_string())
            .replace("%a", &root_element_name(xml));
        self.config.location.join(name)
    }
}

/// Local name of the first element, sanitized for use in a file name.
fn root_element_name(xml: &str) -> String {
    let body = xml
        .find("?>")
        .map(|end| &xml[end + 2..])
        .unwrap_or(xml);
    let name = root_element_re()
        .captures(body)
        .and_then(|captures| captures.get(2))
        .map(|m| m.as_str())
        .unwrap_or("message");
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect()
}
