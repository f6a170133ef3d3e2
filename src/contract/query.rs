use serde::Serialize;
use serde_json::value::RawValue;
use thiserror::Error;

use crate::store::{LedgerStore, StoreError};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Stored value under `{key}` is not UTF-8")]
    NotUtf8 { key: String },
    #[error("Stored value under `{key}` is not a JSON record")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode query result")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct KeyRecord {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Record")]
    record: Box<RawValue>,
}

/// Returns the raw bytes stored under `key`, if any.
pub fn query<S: LedgerStore>(store: &S, key: &str) -> Result<Option<Vec<u8>>, QueryError> {
    Ok(store.get(key)?)
}

/// Every ledger entry as a JSON array of `{"Key", "Record"}` objects in key order.
/// Records are embedded verbatim.
pub fn query_all<S: LedgerStore>(store: &S) -> Result<Vec<u8>, QueryError> {
    let mut results = Vec::new();
    for entry in store.scan_range("", "")? {
        let (key, value) = entry?;
        let Ok(text) = String::from_utf8(value) else {
            return Err(QueryError::NotUtf8 { key });
        };
        let record = RawValue::from_string(text).map_err(|source| QueryError::Decode {
            key: key.clone(),
            source,
        })?;
        results.push(KeyRecord { key, record });
    }
    tracing::debug!(entries = results.len(), "queried all records");
    serde_json::to_vec(&results).map_err(QueryError::Encode)
}
