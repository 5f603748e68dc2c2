//! Decoder for the Google Authenticator migration payload.
//!
//! The payload is a protobuf message:
//!
//! ```text
//! MigrationPayload {
//!   repeated OtpParameters otp_parameters = 1;
//!   int32 version = 2; int32 batch_size = 3; int32 batch_index = 4; int32 batch_id = 5;
//! }
//! OtpParameters {
//!   bytes secret = 1; string name = 2; string issuer = 3;
//!   Algorithm algorithm = 4; DigitCount digits = 5; OtpType type = 6; int64 counter = 7;
//! }
//! ```

use zeroize::Zeroizing;

use crate::error::{MigrationError, Result};
use crate::wire::{WireReader, WireType};

struct FieldSpec {
    number: u32,
    name: &'static str,
    wire_type: WireType,
}

const fn field(number: u32, name: &'static str, wire_type: WireType) -> FieldSpec {
    FieldSpec {
        number,
        name,
        wire_type,
    }
}

const OTP_PARAMETERS: u32 = 1;
const VERSION: u32 = 2;
const BATCH_SIZE: u32 = 3;
const BATCH_INDEX: u32 = 4;
const BATCH_ID: u32 = 5;

const PAYLOAD_FIELDS: &[FieldSpec] = &[
    field(OTP_PARAMETERS, "otp_parameters", WireType::LengthDelimited),
    field(VERSION, "version", WireType::Varint),
    field(BATCH_SIZE, "batch_size", WireType::Varint),
    field(BATCH_INDEX, "batch_index", WireType::Varint),
    field(BATCH_ID, "batch_id", WireType::Varint),
];

const SECRET: u32 = 1;
const NAME: u32 = 2;
const ISSUER: u32 = 3;
const ALGORITHM: u32 = 4;
const DIGITS: u32 = 5;
const TYPE: u32 = 6;
const COUNTER: u32 = 7;

const OTP_FIELDS: &[FieldSpec] = &[
    field(SECRET, "secret", WireType::LengthDelimited),
    field(NAME, "name", WireType::LengthDelimited),
    field(ISSUER, "issuer", WireType::LengthDelimited),
    field(ALGORITHM, "algorithm", WireType::Varint),
    field(DIGITS, "digits", WireType::Varint),
    field(TYPE, "type", WireType::Varint),
    field(COUNTER, "counter", WireType::Varint),
];

/// Look up a known field; `None` means the field is unknown and must be skipped.
fn known_field(
    table: &'static [FieldSpec],
    number: u32,
    wire_type: WireType,
) -> Result<Option<&'static FieldSpec>> {
    match table.iter().find(|spec| spec.number == number) {
        None => Ok(None),
        Some(spec) if spec.wire_type == wire_type => Ok(Some(spec)),
        Some(spec) => Err(MigrationError::malformed(format!(
            "field '{}' has wire type {:?}, expected {:?}",
            spec.name, wire_type, spec.wire_type
        ))),
    }
}

/// Enumerations carried as raw varints in the payload.
trait RawEnum: Sized + Default {
    fn from_raw(raw: u64) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Unspecified,
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl RawEnum for Algorithm {
    fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(Algorithm::Unspecified),
            1 => Some(Algorithm::Sha1),
            2 => Some(Algorithm::Sha256),
            3 => Some(Algorithm::Sha512),
            4 => Some(Algorithm::Md5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigitCount {
    #[default]
    Unspecified,
    Six,
    Eight,
}

impl RawEnum for DigitCount {
    fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(DigitCount::Unspecified),
            1 => Some(DigitCount::Six),
            2 => Some(DigitCount::Eight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpType {
    #[default]
    Unspecified,
    Hotp,
    Totp,
}

impl RawEnum for OtpType {
    fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(OtpType::Unspecified),
            1 => Some(OtpType::Hotp),
            2 => Some(OtpType::Totp),
            _ => None,
        }
    }
}

/// What to do with enum values this decoder does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPolicy {
    /// Fail the payload with `MalformedPayload`.
    #[default]
    Strict,
    /// Decode as UNSPECIFIED and report it in `MigrationPayload::unknown_enums`.
    Lenient,
}

/// One OTP credential as found in the payload. Absent fields keep their zero value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountRecord {
    pub secret: Zeroizing<Vec<u8>>,
    pub name: String,
    pub issuer: String,
    pub algorithm: Algorithm,
    pub digits: DigitCount,
    pub otp_type: OtpType,
    pub counter: u64,
}

/// An unrecognised enum value accepted under `EnumPolicy::Lenient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEnum {
    pub record: usize,
    pub field: &'static str,
    pub raw: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationPayload {
    pub records: Vec<AccountRecord>,
    pub version: i32,
    pub batch_size: i32,
    pub batch_index: i32,
    pub batch_id: i32,
    pub unknown_enums: Vec<UnknownEnum>,
}

/// Decode a payload, rejecting unknown enum values.
#[cfg(test)]
pub fn decode(bytes: &[u8]) -> Result<MigrationPayload> {
    decode_with(bytes, EnumPolicy::Strict)
}

pub fn decode_with(bytes: &[u8], policy: EnumPolicy) -> Result<MigrationPayload> {
    let mut payload = MigrationPayload::default();
    let mut reader = WireReader::new(bytes);

    while !reader.is_empty() {
        let (number, wire_type) = reader.read_key()?;
        let Some(spec) = known_field(PAYLOAD_FIELDS, number, wire_type)? else {
            reader.skip(wire_type)?;
            continue;
        };

        match spec.number {
            OTP_PARAMETERS => {
                let index = payload.records.len();
                let body = reader.read_bytes()?;
                let record = decode_record(body, index, policy, &mut payload.unknown_enums)?;
                payload.records.push(record);
            }
            VERSION => payload.version = int32(reader.read_varint()?),
            BATCH_SIZE => payload.batch_size = int32(reader.read_varint()?),
            BATCH_INDEX => payload.batch_index = int32(reader.read_varint()?),
            BATCH_ID => payload.batch_id = int32(reader.read_varint()?),
            _ => reader.skip(wire_type)?,
        }
    }

    Ok(payload)
}

fn decode_record(
    body: &[u8],
    index: usize,
    policy: EnumPolicy,
    unknown: &mut Vec<UnknownEnum>,
) -> Result<AccountRecord> {
    let mut record = AccountRecord::default();
    let mut reader = WireReader::new(body);

    while !reader.is_empty() {
        let (number, wire_type) = reader.read_key()?;
        let Some(spec) = known_field(OTP_FIELDS, number, wire_type)? else {
            reader.skip(wire_type)?;
            continue;
        };

        match spec.number {
            SECRET => record.secret = Zeroizing::new(reader.read_bytes()?.to_vec()),
            NAME => record.name = reader.read_string()?,
            ISSUER => record.issuer = reader.read_string()?,
            ALGORITHM => {
                let raw = reader.read_varint()?;
                record.algorithm = enum_value(raw, spec, index, policy, unknown)?;
            }
            DIGITS => {
                let raw = reader.read_varint()?;
                record.digits = enum_value(raw, spec, index, policy, unknown)?;
            }
            TYPE => {
                let raw = reader.read_varint()?;
                record.otp_type = enum_value(raw, spec, index, policy, unknown)?;
            }
            COUNTER => record.counter = reader.read_varint()?,
            _ => reader.skip(wire_type)?,
        }
    }

    if record.secret.is_empty() {
        return Err(MigrationError::EmptySecret { index });
    }

    Ok(record)
}

fn enum_value<T: RawEnum>(
    raw: u64,
    spec: &'static FieldSpec,
    index: usize,
    policy: EnumPolicy,
    unknown: &mut Vec<UnknownEnum>,
) -> Result<T> {
    if let Some(value) = T::from_raw(raw) {
        return Ok(value);
    }
    match policy {
        EnumPolicy::Strict => Err(MigrationError::malformed(format!(
            "account #{index}: unknown {} value {raw}",
            spec.name
        ))),
        EnumPolicy::Lenient => {
            unknown.push(UnknownEnum {
                record: index,
                field: spec.name,
                raw,
            });
            Ok(T::default())
        }
    }
}

/// int32 fields travel as sign-extended varints; keep the low 32 bits.
fn int32(raw: u64) -> i32 {
    raw as u32 as i32
}
