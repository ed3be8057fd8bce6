use serde::Deserialize;

use crate::pattern::TypePattern;

/// Which representation fields are exposed for an error type
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FieldPolicy {
    pub include_message: bool,
    pub include_exception_type: bool,
    pub include_application: bool,
    pub include_path: bool,
    pub include_handler: bool,
    pub include_stack_trace: bool,
    pub include_cause: bool,
    /// Prefer declared metadata over the error's own code and message
    pub evaluate_declared_metadata_first: bool,
}

impl FieldPolicy {
    /// Policy exposing every field
    pub const fn all() -> Self {
        Self {
            include_message: true,
            include_exception_type: true,
            include_application: true,
            include_path: true,
            include_handler: true,
            include_stack_trace: true,
            include_cause: true,
            evaluate_declared_metadata_first: false,
        }
    }

    /// Policy exposing only status, code, and identifiers
    pub const fn none() -> Self {
        Self {
            include_message: false,
            include_exception_type: false,
            include_application: false,
            include_path: false,
            include_handler: false,
            include_stack_trace: false,
            include_cause: false,
            evaluate_declared_metadata_first: false,
        }
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            include_stack_trace: false,
            ..Self::all()
        }
    }
}

/// Field policy bound to a type pattern
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyEntry {
    pub pattern: TypePattern,
    #[serde(flatten)]
    pub policy: FieldPolicy,
}

/// Policy of the first entry, in configuration order, matching any of the
/// given type names
pub fn find_policy<'a, S: AsRef<str>>(entries: &'a [PolicyEntry], type_names: &[S]) -> Option<&'a FieldPolicy> {
    entries
        .iter()
        .find(|entry| type_names.iter().any(|name| entry.pattern.matches(name.as_ref())))
        .map(|entry| &entry.policy)
}
