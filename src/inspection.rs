//! Non-fatal checks on a projected monitoring configuration.
//!
//! None of these stop the configuration from being used; they point out
//! values the monitoring agent is likely to reject or misreport with.

use std::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

use regex::Regex;

use crate::projection::MonitoringConfig;


/// Region assumed for license keys without a region prefix.
pub const DEFAULT_LICENSE_REGION: &str = "us01";

/// Length of a well-formed license key.
pub const LICENSE_KEY_LENGTH: usize = 40;

/// Application names agents ship with out of the box.
/// Every application left on one of these reports into the same place.
pub const DEFAULT_APP_NAMES: &[&str] = &[
    "PHP Application",
    "Python Application",
    "Python Application (Development)",
    "Python Application (Staging)",
    "My Application",
    "My Application (Development)",
    "My Application (Test)",
    "My Application (Staging)",
];


#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingSeverity {
    Info,
    Warning,
    Failure,
}

impl Display for FindingSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FindingSeverity::Info => write!(f, "info"),
            FindingSeverity::Warning => write!(f, "warning"),
            FindingSeverity::Failure => write!(f, "failure"),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationFinding {
    pub severity: FindingSeverity,
    pub message: String,
}

impl ConfigurationFinding {
    fn new<S: Into<String>>(severity: FindingSeverity, message: S) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl Display for ConfigurationFinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}


fn region_regex() -> &'static Regex {
    static REGION_REGEX: OnceLock<Regex> = OnceLock::new();

    // PANIC SAFETY: The pattern is a constant and known to be valid.
    REGION_REGEX.get_or_init(|| Regex::new(r"^([a-z]{2,3}[0-9]{2})x{1,2}").unwrap())
}

/// The region encoded in a license key prefix (e.g. `eu01xx...` -> `eu01`),
/// or [`DEFAULT_LICENSE_REGION`] if there is none.
pub fn license_region(license_key: &str) -> String {
    region_regex()
        .captures(license_key)
        .and_then(|captures| captures.get(1))
        .map(|region| region.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_LICENSE_REGION.to_string())
}

/// Strips surrounding whitespace, quotes and inner spaces.
pub fn sanitize_license_key(license_key: &str) -> String {
    license_key
        .trim()
        .chars()
        .filter(|character| !matches!(character, '\'' | '"' | ' '))
        .collect()
}

/// Whether a (sanitized) license key is 40 ASCII alphanumeric characters.
pub fn is_license_key_format_valid(license_key: &str) -> bool {
    license_key.len() == LICENSE_KEY_LENGTH
        && license_key
            .chars()
            .all(|character| character.is_ascii_alphanumeric())
}


/// Run every check on `config`. Findings are ordered from most to least severe.
pub fn inspect(config: &MonitoringConfig) -> Vec<ConfigurationFinding> {
    let mut findings = Vec::new();

    inspect_license_key(&config.license_key, &mut findings);
    inspect_app_name(config.primary_app_name(), &mut findings);

    if !config.agent_enabled {
        findings.push(ConfigurationFinding::new(
            FindingSeverity::Info,
            "The monitoring agent is disabled; no data will be reported.",
        ));
    }

    findings.sort_by(|first, second| second.severity.cmp(&first.severity));
    findings
}

fn inspect_license_key(license_key: &str, findings: &mut Vec<ConfigurationFinding>) {
    if license_key.contains(['\'', '"', ' ']) {
        findings.push(ConfigurationFinding::new(
            FindingSeverity::Failure,
            "The license key contains quotes or spaces, which may cause inconsistent behavior.",
        ));
    }

    let sanitized = sanitize_license_key(license_key);
    if !is_license_key_format_valid(&sanitized) {
        findings.push(ConfigurationFinding::new(
            FindingSeverity::Failure,
            format!(
                "The license key does not have a valid format: expected {LICENSE_KEY_LENGTH} \
                 alphanumeric characters, found {}.",
                sanitized.chars().count()
            ),
        ));
        return;
    }

    let region = license_region(&sanitized);
    let mut message = format!("The license key targets the {region} region.");
    if region.starts_with("eu") {
        message.push_str(" Make sure the agent version supports region-aware license keys.");
    }

    findings.push(ConfigurationFinding::new(FindingSeverity::Info, message));
}

fn inspect_app_name(app_name: &str, findings: &mut Vec<ConfigurationFinding>) {
    // The projected name always carries an environment suffix,
    // so compare the service part as well.
    let service_part = app_name.split_once(": ").map(|(service, _)| service);

    let uses_default = DEFAULT_APP_NAMES
        .iter()
        .any(|default_name| app_name == *default_name || service_part == Some(*default_name));

    if uses_default {
        findings.push(ConfigurationFinding::new(
            FindingSeverity::Warning,
            format!(
                "The application name \"{app_name}\" uses a default name. Multiple applications \
                 with the same default name all report to the same place."
            ),
        ));
    }
}
