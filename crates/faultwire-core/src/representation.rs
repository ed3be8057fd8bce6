use http::StatusCode;
use indexmap::IndexMap;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status used whenever nothing else resolves
pub const DEFAULT_STATUS: u16 = 500;

/// Canonical error value exchanged between services
///
/// Absent fields are omitted on the wire rather than written as `null`,
/// so a receiver can tell "not exposed" apart from "explicitly empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRepresentation {
    /// Correlation id of the failure event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// When the failure was handled (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,
    /// Human label for the status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Service-specific error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Whether `error_code` was copied from `cause`
    #[serde(default, skip_serializing_if = "is_false")]
    pub error_code_inherited: bool,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Name of the originating error type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    /// Name of the reporting service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Request path that triggered the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Handler that was serving the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerInfo>,
    /// Stack frames, innermost first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<Vec<StackFrame>>,
    /// Representation of the underlying cause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorRepresentation>>,
    /// Additional properties not captured by the named fields
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl ErrorRepresentation {
    /// Create a representation carrying only a status and its label
    pub fn new(status: StatusCode) -> Self {
        Self {
            id: None,
            timestamp: None,
            status: status.as_u16(),
            status_text: Some(status_text(status)),
            error_code: None,
            error_code_inherited: false,
            message: None,
            exception_type: None,
            application: None,
            path: None,
            handler: None,
            stack_trace: None,
            cause: None,
            extensions: IndexMap::new(),
        }
    }

    /// Status as a typed code, falling back to 500 for out-of-range values
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Overwrite `status` and `status_text` from a transport status
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status.as_u16();
        self.status_text = Some(status_text(status));
    }

    /// Depth of the cause chain below this representation
    pub fn cause_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.cause.as_deref();
        while let Some(cause) = current {
            depth += 1;
            current = cause.cause.as_deref();
        }
        depth
    }

    /// Iterate over this representation and all nested causes, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |rep| rep.cause.as_deref())
    }

    /// Insert an extension property, replacing any previous value
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }
}

/// Handler (type + method) that was serving a request when it failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerInfo {
    /// Declaring type of the handler
    pub type_name: String,
    /// Handler method name
    pub method_name: String,
    /// Parameter type names, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method_parameter_types: Vec<String>,
}

impl HandlerInfo {
    pub fn new(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method_name: method_name.into(),
            method_parameter_types: Vec::new(),
        }
    }

    /// Append a parameter type name
    #[must_use]
    pub fn with_parameter(mut self, type_name: impl Into<String>) -> Self {
        self.method_parameter_types.push(type_name.into());
        self
    }

    /// Key used by declared-metadata tables (`Type#method`)
    pub fn method_key(&self) -> String {
        format!("{}#{}", self.type_name, self.method_name)
    }
}

/// One element of a captured stack trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaring_type: Option<String>,
    pub method_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

/// Human label for a status, e.g. "Not Found"
pub fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown Status").to_owned()
}

const fn default_status() -> u16 {
    DEFAULT_STATUS
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted() {
        let rep = ErrorRepresentation::new(StatusCode::CONFLICT);
        let json = serde_json::to_value(&rep).unwrap();

        assert_eq!(json, serde_json::json!({ "status": 409, "statusText": "Conflict" }));
    }

    #[test]
    fn unknown_keys_become_extensions() {
        let rep: ErrorRepresentation = serde_json::from_str(
            r#"{"status":400,"message":"bad","tenant":"acme","limits":{"max":3}}"#,
        )
        .unwrap();

        assert_eq!(rep.message.as_deref(), Some("bad"));
        assert_eq!(rep.extensions.len(), 2);
        assert_eq!(rep.extensions["tenant"], "acme");
        assert_eq!(rep.extensions["limits"]["max"], 3);
    }

    #[test]
    fn missing_status_defaults_to_500() {
        let rep: ErrorRepresentation = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();
        assert_eq!(rep.status, 500);
        assert_eq!(rep.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn inherited_flag_only_written_when_true() {
        let mut rep = ErrorRepresentation::new(StatusCode::BAD_REQUEST);
        rep.error_code = Some("E1".to_owned());
        let json = serde_json::to_string(&rep).unwrap();
        assert!(!json.contains("errorCodeInherited"));

        rep.error_code_inherited = true;
        let json = serde_json::to_string(&rep).unwrap();
        assert!(json.contains(r#""errorCodeInherited":true"#));
    }

    #[test]
    fn chain_walks_nested_causes() {
        let mut inner = ErrorRepresentation::new(StatusCode::NOT_FOUND);
        inner.message = Some("inner".to_owned());
        let mut outer = ErrorRepresentation::new(StatusCode::BAD_GATEWAY);
        outer.cause = Some(Box::new(inner));

        assert_eq!(outer.cause_depth(), 1);
        let statuses: Vec<_> = outer.chain().map(|r| r.status).collect();
        assert_eq!(statuses, vec![502, 404]);
    }

    #[test]
    fn handler_method_key() {
        let handler = HandlerInfo::new("pets::PetController", "create").with_parameter("Pet");
        assert_eq!(handler.method_key(), "pets::PetController#create");
        assert_eq!(handler.method_parameter_types, vec!["Pet".to_owned()]);
    }
}
