use encoding_rs::{Encoding, UTF_8};
use faultwire_core::codec::{self, decode_text};
use faultwire_core::{DocumentFormat, ErrorRepresentation, MediaType, headers, media};
use http::{HeaderMap, StatusCode};

/// Reconstructs representations from error responses
///
/// Parsing is total: any body, including empty, non-UTF-8, or malformed
/// input, yields a representation.
#[derive(Debug, Clone)]
pub struct WireParser {
    default_charset: &'static Encoding,
}

impl Default for WireParser {
    fn default() -> Self {
        Self {
            default_charset: UTF_8,
        }
    }
}

impl WireParser {
    /// Parser decoding non-document bodies with `default_charset`
    ///
    /// Unknown labels fall back to UTF-8.
    pub fn new(default_charset: &str) -> Self {
        let default_charset = Encoding::for_label(default_charset.as_bytes()).unwrap_or_else(|| {
            tracing::warn!(charset = default_charset, "unknown default charset, using utf-8");
            UTF_8
        });
        Self { default_charset }
    }

    pub fn parse(&self, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ErrorRepresentation {
        let content_type = media::content_type(headers);
        let format = content_type.as_ref().and_then(|media| media.document_format());
        let charset = content_type.as_ref().and_then(|media| media.charset());

        if let Some(format) = format
            && !body.is_empty()
        {
            match codec::decode(body, format, charset) {
                Ok(mut rep) => {
                    rep.set_status(status);
                    return rep;
                }
                Err(e) => {
                    tracing::debug!(error = %e, ?format, "error body did not decode, falling back to headers");
                }
            }
        }

        let mut rep = ErrorRepresentation::new(status);
        headers::read_headers(headers, &mut rep);
        if rep.message.is_none() && !body.is_empty() {
            let encoding = self.body_encoding(content_type.as_ref());
            rep.message = Some(decode_text(body, encoding).into_owned());
        }
        rep.set_status(status);
        rep
    }

    /// Charset for reading a body as plain text
    ///
    /// JSON is always UTF-8 and XML defaults to UTF-8; anything else uses
    /// its declared charset or the configured default.
    fn body_encoding(&self, content_type: Option<&MediaType>) -> &'static Encoding {
        let Some(media) = content_type else {
            return self.default_charset;
        };
        let declared = media.charset().and_then(|label| Encoding::for_label(label.as_bytes()));
        let subtype = media.subtype();

        if media.kind() == "application" && (subtype == "json" || subtype.ends_with("+json")) {
            UTF_8
        } else if media.document_format() == Some(DocumentFormat::Xml) {
            declared.unwrap_or(UTF_8)
        } else {
            declared.unwrap_or(self.default_charset)
        }
    }
}
