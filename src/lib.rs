/// Ledger records (banks, customers, exchange rates) and their key derivation.
pub mod model;

/// Parses a function name plus string arguments into a [`command::Command`].
pub mod command;

/// Ordered key-value ledger interface, plus "in memory" implementation with
/// staged write sets.
pub mod store;

/// Executes commands against a [`store::LedgerStore`]: write-if-absent record
/// creation, cross currency transfers and queries.
pub mod contract;

/// Replays invocation scripts for the binary. Lives in the library so the
/// integration tests can drive it.
pub mod bin_utils;
