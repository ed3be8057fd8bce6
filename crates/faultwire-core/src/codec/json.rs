use crate::codec::Result;
use crate::representation::ErrorRepresentation;

pub(super) fn encode(rep: &ErrorRepresentation) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(rep)?)
}

pub(super) fn decode(bytes: &[u8]) -> Result<ErrorRepresentation> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[test]
    fn pet_store_conflict_snapshot() {
        let mut rep = ErrorRepresentation::new(StatusCode::CONFLICT);
        rep.error_code = Some("PET_STORE:1234".to_owned());
        rep.message = Some("Pet already exists.".to_owned());

        let body = String::from_utf8(encode(&rep).unwrap()).unwrap();
        insta::assert_snapshot!(body, @r#"{"status":409,"statusText":"Conflict","errorCode":"PET_STORE:1234","message":"Pet already exists."}"#);
    }

    #[test]
    fn extensions_are_flattened() {
        let rep = ErrorRepresentation::new(StatusCode::BAD_REQUEST).with_extension("field", "name");
        let body = String::from_utf8(encode(&rep).unwrap()).unwrap();
        assert_eq!(body, r#"{"status":400,"statusText":"Bad Request","field":"name"}"#);
    }

    #[test]
    fn non_utf8_is_rejected() {
        assert!(decode(b"{\"message\":\"\xff\"}").is_err());
    }
}
