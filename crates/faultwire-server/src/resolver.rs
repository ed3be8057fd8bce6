use std::borrow::Cow;
use std::sync::Arc;

use faultwire_config::{Config, FieldPolicy, find_mapping};
use faultwire_core::{Failure, HandlerInfo, status_text};
use http::StatusCode;

use crate::metadata::{DeclaredMetadata, DeclaredStatus, MetadataTarget};

/// Status, code, and message resolved for one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMeta {
    pub status: StatusCode,
    pub status_text: String,
    /// Locally resolved code; `None` when no source provides one
    pub error_code: Option<String>,
    pub message: String,
}

/// Mapping-table values applicable to a failure
#[derive(Debug, Clone, Copy)]
struct MappedValues<'a> {
    status: StatusCode,
    message: Option<&'a str>,
    error_code: Option<&'a str>,
}

/// Applies the precedence rules for status, error code, and message
#[derive(Clone)]
pub struct Resolver {
    config: Arc<Config>,
    metadata: Arc<dyn DeclaredMetadata>,
}

impl Resolver {
    pub fn new(config: Arc<Config>, metadata: Arc<dyn DeclaredMetadata>) -> Self {
        Self { config, metadata }
    }

    /// Resolve status, code, and message for a single failure
    ///
    /// `handler` is the handler that was serving the request, if known.
    pub fn resolve(&self, failure: &dyn Failure, handler: Option<&HandlerInfo>, policy: &FieldPolicy) -> ResolvedMeta {
        let type_names = self.type_names(failure);
        let declared = self.declared_statuses(handler, &type_names);
        let mapped = self.mapped_values(failure);

        let status = failure
            .as_has_status()
            .map(|s| s.status())
            .or_else(|| failure.response_status().map(|(status, _)| status))
            .or_else(|| declared.first().map(|d| d.status))
            .unwrap_or(mapped.status);

        let own_code = failure
            .as_has_error_code()
            .and_then(|c| c.error_code())
            .filter(|code| !code.is_empty())
            .map(ToOwned::to_owned);
        let declared_code = || self.declared_error_code(handler, &type_names);
        let error_code = if policy.evaluate_declared_metadata_first {
            declared_code().or(own_code)
        } else {
            own_code.or_else(declared_code)
        }
        .or_else(|| mapped.error_code.map(ToOwned::to_owned));

        let own_message = failure.message().filter(|m| !m.trim().is_empty());
        let declared_reason = || declared.iter().find_map(|d| d.reason.clone());
        let message = if policy.evaluate_declared_metadata_first {
            declared_reason().or(own_message)
        } else {
            own_message.or_else(declared_reason)
        }
        .or_else(|| mapped.message.map(ToOwned::to_owned))
        .unwrap_or_else(|| status_text(status));

        if error_code.is_none() {
            tracing::debug!(failure = %failure.type_name(), "no error code resolved");
        }

        ResolvedMeta {
            status,
            status_text: status_text(status),
            error_code,
            message,
        }
    }

    /// The failure's own type followed by its declared supertypes
    pub fn type_names<'f>(&self, failure: &'f dyn Failure) -> Vec<Cow<'f, str>> {
        let mut names = vec![failure.type_name()];
        names.extend(failure.supertypes());
        if names.len() > self.config.max_cause_depth {
            tracing::warn!(
                failure = %names[0],
                max_depth = self.config.max_cause_depth,
                "type hierarchy truncated"
            );
            names.truncate(self.config.max_cause_depth);
        }
        names
    }

    /// Field policy selected by the failure's type hierarchy
    pub fn policy_for(&self, failure: &dyn Failure) -> FieldPolicy {
        self.config.policy_for(&self.type_names(failure))
    }

    /// Declared statuses in precedence order: method, handler type, error types
    fn declared_statuses(&self, handler: Option<&HandlerInfo>, type_names: &[Cow<'_, str>]) -> Vec<DeclaredStatus> {
        let handler_targets = handler
            .into_iter()
            .flat_map(|h| [MetadataTarget::Method(h), MetadataTarget::Type(&h.type_name)]);
        let type_targets = type_names.iter().map(|name| MetadataTarget::Type(name));

        handler_targets
            .chain(type_targets)
            .filter_map(|target| self.metadata.find_status(target))
            .collect()
    }

    fn declared_error_code(&self, handler: Option<&HandlerInfo>, type_names: &[Cow<'_, str>]) -> Option<String> {
        if let Some(handler) = handler {
            let found = self
                .metadata
                .find_error_code(MetadataTarget::Method(handler))
                .or_else(|| self.metadata.find_error_code(MetadataTarget::Type(&handler.type_name)));
            if found.is_some() {
                return found;
            }
        }

        type_names
            .iter()
            .find_map(|name| self.metadata.find_error_code(MetadataTarget::Type(name)))
    }

    /// First mapping entry matching the failure or any of its causes
    ///
    /// Falls back to the catch-all default mapping when nothing matches.
    fn mapped_values(&self, failure: &dyn Failure) -> MappedValues<'_> {
        let default = &self.config.default_mapping;
        let default_status = StatusCode::from_u16(default.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut current = Some(failure);
        let mut depth = 0;
        while let Some(link) = current {
            if depth == self.config.max_cause_depth {
                tracing::warn!(max_depth = depth, "cause chain truncated during mapping lookup");
                break;
            }

            if let Some(entry) = find_mapping(&self.config.mappings, &self.type_names(link)) {
                return MappedValues {
                    status: entry
                        .status
                        .and_then(|s| StatusCode::from_u16(s).ok())
                        .unwrap_or(default_status),
                    message: entry.message.as_deref(),
                    error_code: entry.error_code.as_deref(),
                };
            }

            current = link.cause();
            depth += 1;
        }

        MappedValues {
            status: default_status,
            message: default.message.as_deref(),
            error_code: default.error_code.as_deref(),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("application", &self.config.application)
            .finish_non_exhaustive()
    }
}
