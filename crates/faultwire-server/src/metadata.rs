use faultwire_config::{DeclaredEntry, MetadataConfig};
use faultwire_core::HandlerInfo;
use http::StatusCode;
use indexmap::IndexMap;

/// What a declared-metadata query is about
#[derive(Debug, Clone, Copy)]
pub enum MetadataTarget<'a> {
    /// An error type or a handler type, by name
    Type(&'a str),
    /// A handler method
    Method(&'a HandlerInfo),
}

/// Status and reason declared on a type or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredStatus {
    pub status: StatusCode,
    pub reason: Option<String>,
}

/// Lookup of statically declared status and error code metadata
///
/// Implementations must be pure queries; "not found" is a normal answer.
pub trait DeclaredMetadata: Send + Sync {
    fn find_status(&self, target: MetadataTarget<'_>) -> Option<DeclaredStatus>;

    fn find_error_code(&self, target: MetadataTarget<'_>) -> Option<String>;
}

/// Metadata lookup that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl DeclaredMetadata for NoMetadata {
    fn find_status(&self, _target: MetadataTarget<'_>) -> Option<DeclaredStatus> {
        None
    }

    fn find_error_code(&self, _target: MetadataTarget<'_>) -> Option<String> {
        None
    }
}

/// Metadata declared in a static table, typically from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    types: IndexMap<String, DeclaredEntry>,
    methods: IndexMap<String, DeclaredEntry>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare metadata for an error type or handler type
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, entry: DeclaredEntry) -> Self {
        self.types.insert(type_name.into(), entry);
        self
    }

    /// Declare metadata for a handler method
    #[must_use]
    pub fn with_method(mut self, handler: &HandlerInfo, entry: DeclaredEntry) -> Self {
        self.methods.insert(handler.method_key(), entry);
        self
    }

    fn entry(&self, target: MetadataTarget<'_>) -> Option<&DeclaredEntry> {
        match target {
            MetadataTarget::Type(name) => self.types.get(name),
            MetadataTarget::Method(handler) => self.methods.get(&handler.method_key()),
        }
    }
}

impl From<&MetadataConfig> for StaticMetadata {
    fn from(config: &MetadataConfig) -> Self {
        Self {
            types: config.types.clone(),
            methods: config.methods.clone(),
        }
    }
}

impl DeclaredMetadata for StaticMetadata {
    fn find_status(&self, target: MetadataTarget<'_>) -> Option<DeclaredStatus> {
        let entry = self.entry(target)?;
        let status = StatusCode::from_u16(entry.status?).ok()?;
        Some(DeclaredStatus {
            status,
            reason: entry.reason.clone().filter(|r| !r.trim().is_empty()),
        })
    }

    fn find_error_code(&self, target: MetadataTarget<'_>) -> Option<String> {
        self.entry(target)?
            .error_code
            .clone()
            .filter(|code| !code.is_empty())
    }
}
