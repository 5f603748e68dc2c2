//! Resolution of UNSPECIFIED enum values to their conventional defaults.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::payload::{AccountRecord, Algorithm, DigitCount, OtpType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
    #[serde(rename = "MD5")]
    Md5,
}

impl HashAlgorithm {
    /// Canonical uppercase name used in otpauth URIs.
    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
            HashAlgorithm::Md5 => "MD5",
        }
    }
}

impl From<Algorithm> for HashAlgorithm {
    fn from(value: Algorithm) -> Self {
        match value {
            Algorithm::Unspecified | Algorithm::Sha1 => HashAlgorithm::Sha1,
            Algorithm::Sha256 => HashAlgorithm::Sha256,
            Algorithm::Sha512 => HashAlgorithm::Sha512,
            Algorithm::Md5 => HashAlgorithm::Md5,
        }
    }
}

impl From<HashAlgorithm> for Algorithm {
    fn from(value: HashAlgorithm) -> Self {
        match value {
            HashAlgorithm::Sha1 => Algorithm::Sha1,
            HashAlgorithm::Sha256 => Algorithm::Sha256,
            HashAlgorithm::Sha512 => Algorithm::Sha512,
            HashAlgorithm::Md5 => Algorithm::Md5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Digits {
    Six,
    Eight,
}

impl Digits {
    pub fn count(self) -> u8 {
        match self {
            Digits::Six => 6,
            Digits::Eight => 8,
        }
    }
}

impl From<DigitCount> for Digits {
    fn from(value: DigitCount) -> Self {
        match value {
            DigitCount::Unspecified | DigitCount::Six => Digits::Six,
            DigitCount::Eight => Digits::Eight,
        }
    }
}

impl From<Digits> for DigitCount {
    fn from(value: Digits) -> Self {
        match value {
            Digits::Six => DigitCount::Six,
            Digits::Eight => DigitCount::Eight,
        }
    }
}

impl Serialize for Digits {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.count())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpKind {
    Totp,
    Hotp,
}

impl OtpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OtpKind::Totp => "totp",
            OtpKind::Hotp => "hotp",
        }
    }
}

impl From<OtpType> for OtpKind {
    fn from(value: OtpType) -> Self {
        match value {
            OtpType::Unspecified | OtpType::Totp => OtpKind::Totp,
            OtpType::Hotp => OtpKind::Hotp,
        }
    }
}

impl From<OtpKind> for OtpType {
    fn from(value: OtpKind) -> Self {
        match value {
            OtpKind::Totp => OtpType::Totp,
            OtpKind::Hotp => OtpType::Hotp,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account whose enum fields are resolved to concrete values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub secret: Zeroizing<Vec<u8>>,
    pub name: String,
    pub issuer: String,
    pub algorithm: HashAlgorithm,
    pub digits: Digits,
    pub kind: OtpKind,
    pub counter: u64,
}

impl NormalizedRecord {
    /// Back to payload form with every enum explicitly set.
    #[cfg(test)]
    pub fn to_record(&self) -> AccountRecord {
        AccountRecord {
            secret: self.secret.clone(),
            name: self.name.clone(),
            issuer: self.issuer.clone(),
            algorithm: self.algorithm.into(),
            digits: self.digits.into(),
            otp_type: self.kind.into(),
            counter: self.counter,
        }
    }
}

/// Apply the defaults: algorithm SHA1, 6 digits, TOTP.
pub fn normalize(record: &AccountRecord) -> NormalizedRecord {
    NormalizedRecord {
        secret: record.secret.clone(),
        name: record.name.clone(),
        issuer: record.issuer.clone(),
        algorithm: record.algorithm.into(),
        digits: record.digits.into(),
        kind: record.otp_type.into(),
        counter: record.counter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(secret: &[u8]) -> AccountRecord {
        AccountRecord {
            secret: Zeroizing::new(secret.to_vec()),
            ..AccountRecord::default()
        }
    }

    #[test]
    fn unspecified_fields_get_defaults() {
        let n = normalize(&bare(b"k"));
        assert_eq!(n.algorithm, HashAlgorithm::Sha1);
        assert_eq!(n.digits, Digits::Six);
        assert_eq!(n.kind, OtpKind::Totp);
    }

    #[test]
    fn explicit_values_keep_their_names() {
        let rec = AccountRecord {
            algorithm: Algorithm::Sha512,
            digits: DigitCount::Eight,
            otp_type: OtpType::Hotp,
            counter: 17,
            ..bare(b"k")
        };
        let n = normalize(&rec);
        assert_eq!(n.algorithm.as_str(), "SHA512");
        assert_eq!(n.digits.count(), 8);
        assert_eq!(n.kind.as_str(), "hotp");
        assert_eq!(n.counter, 17);
    }

    #[test]
    fn normalization_is_idempotent() {
        let records = [
            bare(b"k"),
            AccountRecord {
                name: "x".into(),
                algorithm: Algorithm::Md5,
                digits: DigitCount::Six,
                otp_type: OtpType::Hotp,
                counter: 3,
                ..bare(b"secret")
            },
        ];
        for rec in &records {
            let once = normalize(rec);
            let twice = normalize(&once.to_record());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalizing_does_not_touch_the_source() {
        let rec = bare(b"k");
        let before = rec.clone();
        let _ = normalize(&rec);
        assert_eq!(rec, before);
    }

    #[test]
    fn serializes_canonical_names() {
        assert_eq!(serde_json::to_string(&HashAlgorithm::Md5).unwrap(), "\"MD5\"");
        assert_eq!(serde_json::to_string(&OtpKind::Hotp).unwrap(), "\"hotp\"");
        assert_eq!(serde_json::to_string(&Digits::Eight).unwrap(), "8");
    }
}
