#![allow(clippy::must_use_candidate)]

//! Configuration for error resolution and rendering
//!
//! Loaded once at startup and shared read-only across request handlers.

pub mod client;
mod env;
mod loader;
pub mod mapping;
pub mod metadata;
pub mod pattern;
pub mod policy;

use serde::Deserialize;

pub use client::ClientConfig;
pub use mapping::{DefaultMapping, MappingEntry, find_mapping};
pub use metadata::{DeclaredEntry, MetadataConfig};
pub use pattern::TypePattern;
pub use policy::{FieldPolicy, PolicyEntry, find_policy};

/// Top-level faultwire configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name reported in the `application` field
    #[serde(default = "default_application")]
    pub application: String,
    /// Ceiling for cause-chain and type-hierarchy walks
    #[serde(default = "default_max_cause_depth")]
    pub max_cause_depth: usize,
    /// Incoming header whose value becomes the representation id
    #[serde(default = "default_correlation_header")]
    pub correlation_header: Option<String>,
    /// Catch-all mapping used when nothing else resolves
    #[serde(default)]
    pub default_mapping: DefaultMapping,
    /// Mapping table, first match wins
    #[serde(default)]
    pub mappings: Vec<MappingEntry>,
    /// Field policy used when no entry in `policies` matches
    #[serde(default)]
    pub default_policy: FieldPolicy,
    /// Per-type field policies, first match wins
    #[serde(default)]
    pub policies: Vec<PolicyEntry>,
    /// Statically declared status/code/reason metadata
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Client-side decoding settings
    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application: default_application(),
            max_cause_depth: default_max_cause_depth(),
            correlation_header: default_correlation_header(),
            default_mapping: DefaultMapping::default(),
            mappings: Vec::new(),
            default_policy: FieldPolicy::default(),
            policies: Vec::new(),
            metadata: MetadataConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Config {
    /// Field policy for the first type name any policy entry matches
    pub fn policy_for<S: AsRef<str>>(&self, type_names: &[S]) -> FieldPolicy {
        find_policy(&self.policies, type_names)
            .copied()
            .unwrap_or(self.default_policy)
    }
}

fn default_application() -> String {
    "application".to_owned()
}

const fn default_max_cause_depth() -> usize {
    32
}

const DEFAULT_CORRELATION_HEADER: Option<&str> = Some("x-request-id");

fn default_correlation_header() -> Option<String> {
    DEFAULT_CORRELATION_HEADER.map(str::to_owned)
}
