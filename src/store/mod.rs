use thiserror::Error;

pub mod in_memory_store;

pub type KeyValue = (String, Vec<u8>);

/// Lazy, key ordered scan. The underlying scan is released when this is dropped.
pub type RangeScan<'a> = Box<dyn Iterator<Item = Result<KeyValue, StoreError>> + 'a>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Key must not be empty")]
    EmptyKey,
    #[error("Invalid range: start key `{start}` is after end key `{end}`")]
    InvalidRange { start: String, end: String },
    #[error("Ledger backend failure: {0}")]
    Backend(String),
}

/// Ordered key-value ledger consumed by the contract.
///
/// Precondition: every `put` issued during one contract invocation must be
/// committed together with the others, or not at all. The contract never rolls
/// back writes on its own; a failed invocation relies on the host discarding its
/// whole write set (see [`in_memory_store::StagedWrites`]).
pub trait LedgerStore {
    /// Point lookup, an absent key is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Scans `[start, end)` in ascending key order. An empty bound is open on that side.
    fn scan_range(&self, start: &str, end: &str) -> Result<RangeScan<'_>, StoreError>;
}
