use serde::Deserialize;

use crate::pattern::TypePattern;

/// Fallback status/message/code for a family of error types
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingEntry {
    /// Type name or wildcard this entry applies to
    pub pattern: TypePattern,
    /// HTTP status to report
    #[serde(default)]
    pub status: Option<u16>,
    /// Message used when the error has none of its own
    #[serde(default)]
    pub message: Option<String>,
    /// Service-specific error code
    #[serde(default)]
    pub error_code: Option<String>,
}

/// Catch-all entry used when no [`MappingEntry`] matches
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultMapping {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl Default for DefaultMapping {
    fn default() -> Self {
        Self {
            status: default_status(),
            message: None,
            error_code: None,
        }
    }
}

/// Find the first entry, in configuration order, matching any of the given
/// type names
///
/// `type_names` holds a failure's own type followed by its supertypes.
pub fn find_mapping<'a, S: AsRef<str>>(entries: &'a [MappingEntry], type_names: &[S]) -> Option<&'a MappingEntry> {
    entries
        .iter()
        .find(|entry| type_names.iter().any(|name| entry.pattern.matches(name.as_ref())))
}

const fn default_status() -> u16 {
    500
}
