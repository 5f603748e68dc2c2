//! Extraction of the payload bytes from an `otpauth-migration://offline?data=...` URI.

use base64::{Engine as _, engine::general_purpose};
use url::Url;

use crate::error::{MigrationError, Result};

pub const MIGRATION_SCHEME: &str = "otpauth-migration";
pub const MIGRATION_HOST: &str = "offline";

pub fn unwrap_migration_uri(uri: &str) -> Result<Vec<u8>> {
    let url = Url::parse(uri.trim())
        .map_err(|e| MigrationError::InvalidTransport(format!("cannot parse URI: {e}")))?;

    if url.scheme() != MIGRATION_SCHEME {
        return Err(MigrationError::InvalidTransport(format!(
            "expected scheme '{MIGRATION_SCHEME}', got '{}'",
            url.scheme()
        )));
    }

    let host = url.host_str().unwrap_or("");
    if host != MIGRATION_HOST {
        return Err(MigrationError::InvalidTransport(format!(
            "expected host '{MIGRATION_HOST}', got '{host}'"
        )));
    }

    let data = url
        .query_pairs()
        .find(|(k, _)| k == "data")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| MigrationError::malformed("URI has no 'data' parameter"))?;

    // form decoding turned any literal '+' of the base64 text into a space
    let data = data.replace(' ', "+");

    general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|e| MigrationError::malformed(format!("invalid base64 in 'data': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "Ch0KBUhlbGxvEgVhbGljZRoHRXhhbXBsZSACKAIwAhABGAEgACh7";
    // secret 00 00 fb ef be fb ef be fb ef be, name "bob"
    const PLUS_FIXTURE: &str = "ChIKCwAA++++++++++++EgNib2I=";

    #[test]
    fn unwraps_payload_bytes() {
        let bytes = unwrap_migration_uri(&format!("otpauth-migration://offline?data={FIXTURE}"))
            .unwrap();
        assert_eq!(
            hex::encode(bytes),
            "0a1d0a0548656c6c6f1205616c6963651a074578616d706c65200228023002100118012000287b"
        );
    }

    #[test]
    fn spaces_decode_like_plus() {
        let spaced = PLUS_FIXTURE.replace('+', " ");
        let escaped = PLUS_FIXTURE.replace('+', "%2B").replace('=', "%3D");

        let offline = |data: &str| format!("otpauth-migration://offline?data={data}");
        let from_plus = unwrap_migration_uri(&offline(PLUS_FIXTURE)).unwrap();
        let from_space = unwrap_migration_uri(&offline(&spaced)).unwrap();
        let from_escaped = unwrap_migration_uri(&offline(&escaped)).unwrap();

        assert_eq!(from_plus, from_space);
        assert_eq!(from_plus, from_escaped);
        assert_eq!(&from_plus[4..7], &[0x00u8, 0x00, 0xfb]);
    }

    #[test]
    fn rejects_wrong_scheme() {
        let err = unwrap_migration_uri(&format!("otpauth://offline?data={FIXTURE}")).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidTransport(_)));
    }

    #[test]
    fn rejects_wrong_host() {
        let uri = format!("otpauth-migration://online?data={FIXTURE}");
        let err = unwrap_migration_uri(&uri).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidTransport(_)));
    }

    #[test]
    fn rejects_non_uri_input() {
        let err = unwrap_migration_uri("not a uri at all").unwrap_err();
        assert!(matches!(err, MigrationError::InvalidTransport(_)));
    }

    #[test]
    fn missing_data_is_malformed() {
        let err = unwrap_migration_uri("otpauth-migration://offline?foo=bar").unwrap_err();
        assert!(matches!(err, MigrationError::MalformedPayload(_)));
    }

    #[test]
    fn bad_base64_is_malformed() {
        let err = unwrap_migration_uri("otpauth-migration://offline?data=%%%").unwrap_err();
        assert!(matches!(err, MigrationError::MalformedPayload(_)));

        let err = unwrap_migration_uri("otpauth-migration://offline?data=abc").unwrap_err();
        assert!(matches!(err, MigrationError::MalformedPayload(_)));
    }
}
