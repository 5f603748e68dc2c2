//! Canonical `otpauth://` URI construction.

use data_encoding::BASE32;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::normalize::{NormalizedRecord, OtpKind};

/// Same set JavaScript's `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// TOTP step; the migration payload does not carry one.
const TOTP_PERIOD: u32 = 30;

/// RFC 4648 base32 with the trailing `=` padding removed.
pub fn encode_secret(secret: &[u8]) -> String {
    BASE32.encode(secret).trim_end_matches('=').to_string()
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Build `otpauth://{type}/{name}?secret=..&issuer=..&algorithm=..&digits=..&counter|period=..`.
pub fn reconstruct(record: &NormalizedRecord) -> String {
    let mut params = vec![format!("secret={}", encode_secret(&record.secret))];

    if !record.issuer.is_empty() {
        params.push(format!("issuer={}", encode_component(&record.issuer)));
    }

    params.push(format!("algorithm={}", record.algorithm));
    params.push(format!("digits={}", record.digits));

    match record.kind {
        OtpKind::Hotp if record.counter != 0 => params.push(format!("counter={}", record.counter)),
        OtpKind::Hotp => {}
        OtpKind::Totp => params.push(format!("period={TOTP_PERIOD}")),
    }

    format!(
        "otpauth://{}/{}?{}",
        record.kind,
        encode_component(&record.name),
        params.join("&")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Digits, HashAlgorithm};
    use zeroize::Zeroizing;

    fn record(secret: &[u8], name: &str, issuer: &str) -> NormalizedRecord {
        NormalizedRecord {
            secret: Zeroizing::new(secret.to_vec()),
            name: name.to_string(),
            issuer: issuer.to_string(),
            algorithm: HashAlgorithm::Sha1,
            digits: Digits::Six,
            kind: OtpKind::Totp,
            counter: 0,
        }
    }

    #[test]
    fn builds_totp_uri_in_fixed_order() {
        let rec = NormalizedRecord {
            algorithm: HashAlgorithm::Sha256,
            digits: Digits::Eight,
            ..record(b"Hello", "alice", "Example")
        };
        assert_eq!(
            reconstruct(&rec),
            "otpauth://totp/alice?secret=JBSWY3DP&issuer=Example\
             &algorithm=SHA256&digits=8&period=30"
        );
    }

    #[test]
    fn omits_empty_issuer() {
        let uri = reconstruct(&record(b"Hello", "bob", ""));
        assert_eq!(
            uri,
            "otpauth://totp/bob?secret=JBSWY3DP&algorithm=SHA1&digits=6&period=30"
        );
    }

    #[test]
    fn hotp_includes_nonzero_counter_and_no_period() {
        let rec = NormalizedRecord {
            kind: OtpKind::Hotp,
            counter: 42,
            ..record(b"Hello", "bob", "")
        };
        assert_eq!(
            reconstruct(&rec),
            "otpauth://hotp/bob?secret=JBSWY3DP&algorithm=SHA1&digits=6&counter=42"
        );
    }

    #[test]
    fn hotp_with_zero_counter_omits_counter() {
        let rec = NormalizedRecord {
            kind: OtpKind::Hotp,
            ..record(b"Hello", "bob", "")
        };
        let uri = reconstruct(&rec);
        assert!(!uri.contains("counter="));
        assert!(!uri.contains("period="));
    }

    #[test]
    fn strips_padding_after_encoding() {
        assert_eq!(encode_secret(b"f"), "MY");
        assert_eq!(encode_secret(b"foobar"), "MZXW6YTBOI");
        assert_eq!(encode_secret(&[0xfb, 0xef, 0xbe]), "7PX34");
    }

    #[test]
    fn percent_encodes_name_and_issuer_like_uri_components() {
        let uri = reconstruct(&record(b"Hello", "Acme:alice@example.com", "Big & Co"));
        assert!(uri.starts_with("otpauth://totp/Acme%3Aalice%40example.com?"));
        assert!(uri.contains("&issuer=Big%20%26%20Co&"));

        let uri = reconstruct(&record(b"Hello", "it's (me)!~*_-.", "Ünïcode"));
        assert!(uri.starts_with("otpauth://totp/it's%20(me)!~*_-.?"));
        assert!(uri.contains("issuer=%C3%9Cn%C3%AFcode"));
    }
}
