use std::fmt;

use http::HeaderMap;
use http::header::{ACCEPT, CONTENT_TYPE};

/// Structured encodings an error body can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Xml,
}

impl DocumentFormat {
    /// Content type written on rendered bodies
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

/// Parsed media range, e.g. `application/problem+json; charset=utf-8`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: String,
    subtype: String,
    charset: Option<String>,
}

impl MediaType {
    /// Media range matching anything (`*/*`)
    pub fn any() -> Self {
        Self {
            kind: "*".to_owned(),
            subtype: "*".to_owned(),
            charset: None,
        }
    }

    /// Parse a single media range, ignoring parameters other than `charset`
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let essence = parts.next()?.trim();
        let (kind, subtype) = essence.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());

        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let charset = parts.find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
        });

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            charset,
        })
    }

    /// Parse a comma-separated `Accept` style list, skipping malformed entries
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',').filter_map(Self::parse).collect()
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Whether this range is compatible with the concrete `kind/subtype`
    ///
    /// Wildcards on either side match, including `application/*+json`
    /// style suffix wildcards.
    pub fn is_compatible_with(&self, kind: &str, subtype: &str) -> bool {
        if self.kind != "*" && kind != "*" && self.kind != kind {
            return false;
        }
        if self.subtype == "*" || subtype == "*" || self.subtype == subtype {
            return true;
        }
        match (self.subtype.strip_prefix("*+"), subtype.split_once('+')) {
            (Some(suffix), Some((_, other_suffix))) => suffix == other_suffix,
            (Some(suffix), None) => suffix == subtype,
            _ => match (subtype.strip_prefix("*+"), self.subtype.split_once('+')) {
                (Some(suffix), Some((_, own_suffix))) => suffix == own_suffix,
                (Some(suffix), None) => suffix == self.subtype,
                _ => false,
            },
        }
    }

    fn is_json_compatible(&self) -> bool {
        self.is_compatible_with("application", "json")
            || self.is_compatible_with("application", "*+json")
            || self.is_compatible_with("text", "plain")
    }

    fn is_xml_compatible(&self) -> bool {
        self.is_compatible_with("application", "xml")
            || self.is_compatible_with("application", "*+xml")
            || self.is_compatible_with("text", "xml")
    }

    /// Format this single media type supports, if any
    pub fn document_format(&self) -> Option<DocumentFormat> {
        if self.is_json_compatible() {
            Some(DocumentFormat::Json)
        } else if self.is_xml_compatible() {
            Some(DocumentFormat::Xml)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        if let Some(charset) = &self.charset {
            write!(f, ";charset={charset}")?;
        }
        Ok(())
    }
}

/// Pick the structured encoding for a set of accepted or declared types
///
/// JSON wins over XML whenever any entry supports it; `None` means
/// header-only rendering.
pub fn negotiate(accepted: &[MediaType]) -> Option<DocumentFormat> {
    if accepted.iter().any(MediaType::is_json_compatible) {
        Some(DocumentFormat::Json)
    } else if accepted.iter().any(MediaType::is_xml_compatible) {
        Some(DocumentFormat::Xml)
    } else {
        None
    }
}

/// Accepted media types of a request; a missing `Accept` means `*/*`
pub fn accepted_types(headers: &HeaderMap) -> Vec<MediaType> {
    let accepted: Vec<MediaType> = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(MediaType::parse_list)
        .collect();

    if accepted.is_empty() {
        vec![MediaType::any()]
    } else {
        accepted
    }
}

/// Declared content type of a response, if present and well-formed
pub fn content_type(headers: &HeaderMap) -> Option<MediaType> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(MediaType::parse)
}
