//! Per-URI pipeline: unwrap -> decode -> normalize -> reconstruct.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MigrationError, Result};
use crate::normalize::{Digits, HashAlgorithm, NormalizedRecord, OtpKind, normalize};
use crate::payload::{EnumPolicy, decode_with};
use crate::transport::unwrap_migration_uri;
use crate::uri::reconstruct;

/// What the report renderer gets for each account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    pub name: String,
    pub issuer: String,
    pub secret_hex: String,
    #[serde(rename = "type")]
    pub kind: OtpKind,
    pub algorithm: HashAlgorithm,
    pub digits: Digits,
    pub uri: String,
}

impl From<&NormalizedRecord> for ExportRecord {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            name: record.name.clone(),
            issuer: record.issuer.clone(),
            secret_hex: hex::encode(record.secret.as_slice()),
            kind: record.kind,
            algorithm: record.algorithm,
            digits: record.digits,
            uri: reconstruct(record),
        }
    }
}

/// A URI that produced no records.
#[derive(Debug, Clone)]
pub struct UriFailure {
    /// 1-based position in the input list.
    pub position: usize,
    pub uri: String,
    pub error: MigrationError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<ExportRecord>,
    pub failures: Vec<UriFailure>,
}

/// Decode one migration URI into export records.
pub fn export_uri(uri: &str, policy: EnumPolicy) -> Result<Vec<ExportRecord>> {
    let bytes = unwrap_migration_uri(uri)?;
    let payload = decode_with(&bytes, policy)?;

    debug!(
        version = payload.version,
        batch_size = payload.batch_size,
        batch_index = payload.batch_index,
        batch_id = payload.batch_id,
        accounts = payload.records.len(),
        "decoded migration payload"
    );
    if payload.batch_size > 1 {
        info!(
            "payload is part {} of {} (batch id {})",
            payload.batch_index + 1,
            payload.batch_size,
            payload.batch_id
        );
    }
    for unknown in &payload.unknown_enums {
        warn!(
            "account #{}: unknown {} value {}, using default",
            unknown.record, unknown.field, unknown.raw
        );
    }

    Ok(payload
        .records
        .iter()
        .map(|record| ExportRecord::from(&normalize(record)))
        .collect())
}

/// Decode every URI independently; a bad URI contributes nothing and is
/// reported in `failures` instead of aborting the batch. Callers log the
/// failures.
pub fn collect_batch<I, S>(uris: I, policy: EnumPolicy) -> BatchOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut outcome = BatchOutcome::default();

    for (i, uri) in uris.into_iter().enumerate() {
        let uri = uri.as_ref();
        let position = i + 1;
        match export_uri(uri, policy) {
            Ok(records) => {
                debug!("URI #{position}: {} account(s)", records.len());
                outcome.records.extend(records);
            }
            Err(error) => {
                debug!("URI #{position} failed: {error}");
                outcome.failures.push(UriFailure {
                    position,
                    uri: uri.to_string(),
                    error,
                });
            }
        }
    }

    outcome
}

/// The payload is secret material; only show the start of a URI in logs.
pub fn preview(uri: &str) -> String {
    const MAX: usize = 40;
    match uri.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &uri[..cut]),
        None => uri.to_string(),
    }
}
