use indexmap::IndexMap;
use serde::Deserialize;

/// Statically declared status, reason, and code for a type or method
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredEntry {
    #[serde(default)]
    pub status: Option<u16>,
    /// Reason text reported alongside the status
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

/// Declared metadata keyed by type name and by `Type#method`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    /// Error types and handler types
    #[serde(default)]
    pub types: IndexMap<String, DeclaredEntry>,
    /// Handler methods, keyed `Type#method`
    #[serde(default)]
    pub methods: IndexMap<String, DeclaredEntry>,
}
