//! Structured-document codec for [`ErrorRepresentation`]
//!
//! JSON goes through serde; XML is written and read with `quick-xml`
//! events so the self-referential `cause` and the open extension map
//! keep the same shape in both formats.

mod json;
mod xml;

use std::borrow::Cow;
use std::sync::OnceLock;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use thiserror::Error;

use crate::media::DocumentFormat;
use crate::representation::ErrorRepresentation;

/// Maximum element nesting accepted when decoding XML
pub const MAX_XML_DEPTH: usize = 256;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Failures while encoding or decoding a representation
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization or parsing failed
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// XML writing or parsing failed
    #[error("xml: {0}")]
    Xml(String),

    /// A field carried a value of the wrong shape
    #[error("invalid value for `{field}`: {value}")]
    InvalidField { field: &'static str, value: String },

    /// The document nests deeper than [`MAX_XML_DEPTH`]
    #[error("document nesting exceeds {MAX_XML_DEPTH} levels")]
    TooDeep,
}

/// Encode a representation in the given format
///
/// # Errors
///
/// Returns an error if the underlying writer fails
pub fn encode(rep: &ErrorRepresentation, format: DocumentFormat) -> Result<Vec<u8>> {
    match format {
        DocumentFormat::Json => json::encode(rep),
        DocumentFormat::Xml => xml::encode(rep),
    }
}

/// Decode a representation from the given format
///
/// JSON is always read as UTF-8. XML is transcoded from `charset` when
/// given, otherwise from the prolog's declared encoding, otherwise UTF-8.
///
/// # Errors
///
/// Returns an error if the body is not a well-formed representation
pub fn decode(bytes: &[u8], format: DocumentFormat, charset: Option<&str>) -> Result<ErrorRepresentation> {
    match format {
        DocumentFormat::Json => json::decode(bytes),
        DocumentFormat::Xml => {
            let encoding = charset
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .or_else(|| xml_declared_encoding(bytes))
                .unwrap_or(UTF_8);
            let text = decode_text(bytes, encoding);
            xml::decode(&text)
        }
    }
}

/// Decode bytes with the given encoding, replacing malformed sequences
pub fn decode_text<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Cow<'a, str> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "body contained malformed sequences");
    }
    text
}

/// Encoding named by an XML prolog, e.g. `<?xml version="1.0" encoding="ISO-8859-1"?>`
fn xml_declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r#"^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).expect("must be valid regex")
        })
    }

    let head = &bytes[..bytes.len().min(200)];
    let captures = re().captures(head)?;
    Encoding::for_label(&captures[1])
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::representation::{HandlerInfo, StackFrame};

    fn full_representation() -> ErrorRepresentation {
        let mut cause = ErrorRepresentation::new(StatusCode::NOT_FOUND);
        cause.message = Some("no pet with id 7".to_owned());
        cause.error_code = Some("PET:404".to_owned());
        cause.exception_type = Some("pets::PetNotFound".to_owned());

        ErrorRepresentation {
            id: Some("4c1f".to_owned()),
            timestamp: Some("2024-06-15T08:30:00.250Z".parse().unwrap()),
            status: 502,
            status_text: Some("Bad Gateway".to_owned()),
            error_code: Some("PET:404".to_owned()),
            error_code_inherited: true,
            message: Some("downstream failed <&> \"quoted\"".to_owned()),
            exception_type: Some("gateway::Downstream".to_owned()),
            application: Some("gateway".to_owned()),
            path: Some("/pets/7".to_owned()),
            handler: Some(HandlerInfo::new("gateway::PetHandler", "get").with_parameter("u64")),
            stack_trace: Some(vec![
                StackFrame {
                    declaring_type: Some("gateway::PetHandler".to_owned()),
                    method_name: "get".to_owned(),
                    file_name: Some("src/pets.rs".to_owned()),
                    line_number: Some(12),
                },
                StackFrame {
                    declaring_type: None,
                    method_name: "main".to_owned(),
                    file_name: None,
                    line_number: None,
                },
            ]),
            cause: Some(Box::new(cause)),
            extensions: IndexMap::from([
                ("tenant".to_owned(), json!("acme")),
                ("retries".to_owned(), json!(3)),
                ("limits".to_owned(), json!({ "max": 5, "tags": ["a", "b"] })),
            ]),
        }
    }

    #[test]
    fn json_round_trip() {
        let rep = full_representation();
        let bytes = encode(&rep, DocumentFormat::Json).unwrap();
        assert_eq!(decode(&bytes, DocumentFormat::Json, None).unwrap(), rep);
    }

    #[test]
    fn xml_round_trip() {
        let rep = full_representation();
        let bytes = encode(&rep, DocumentFormat::Xml).unwrap();
        assert_eq!(decode(&bytes, DocumentFormat::Xml, None).unwrap(), rep);
    }

    #[test]
    fn xml_charset_from_content_type() {
        // "Größe" in ISO-8859-1
        let body = b"<error><status>400</status><message>Gr\xf6\xdfe</message></error>";
        let rep = decode(body, DocumentFormat::Xml, Some("iso-8859-1")).unwrap();
        assert_eq!(rep.message.as_deref(), Some("Größe"));
    }

    #[test]
    fn xml_charset_from_prolog() {
        let body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><error><message>Gr\xf6\xdfe</message></error>";
        let rep = decode(body, DocumentFormat::Xml, None).unwrap();
        assert_eq!(rep.message.as_deref(), Some("Größe"));
    }

    #[test]
    fn malformed_documents_are_errors() {
        assert!(decode(b"{not json", DocumentFormat::Json, None).is_err());
        assert!(decode(b"[1, 2]", DocumentFormat::Json, None).is_err());
        assert!(decode(b"<error><status>abc</status></error>", DocumentFormat::Xml, None).is_err());
        assert!(decode(b"<error><message>unclosed</error>", DocumentFormat::Xml, None).is_err());
        assert!(decode(b"", DocumentFormat::Xml, None).is_err());
    }

    #[test]
    fn decode_text_borrows_valid_input() {
        let text = decode_text(b"plain ascii", UTF_8);
        assert!(matches!(text, Cow::Borrowed("plain ascii")));

        let text = decode_text(b"caf\xe9", encoding_rs::WINDOWS_1252);
        assert_eq!(text, "café");
    }
}
