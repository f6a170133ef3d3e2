use serde::Deserialize;
use thiserror::Error;

use crate::{
    command::{Command, CommandError},
    store::LedgerStore,
};

pub mod loader;
pub mod query;
pub mod transfer;

use loader::LoaderError;
use query::QueryError;
use transfer::TransferError;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    CommandErr(#[from] CommandError),
    #[error(transparent)]
    LoaderErr(#[from] LoaderError),
    #[error(transparent)]
    TransferErr(#[from] TransferError),
    #[error(transparent)]
    QueryErr(#[from] QueryError),
}

/// Switches from the lenient legacy behaviour to failing fast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Reject transfers between currencies with no rate instead of converting at zero.
    pub strict_forex: bool,
    /// Reject numeric arguments that do not parse instead of reading them as zero.
    pub strict_amounts: bool,
    /// Reject transfers touching absent customers or banks instead of using empty records.
    pub require_records: bool,
}

/// Successful invocation result, a JSON document for queries and nothing for updates.
pub type Payload = Option<Vec<u8>>;

/// Routes invocations to the loader, the transfer engine and the queries.
///
/// Holds configuration only, so one instance can serve any number of invocations.
/// Writes issued by a failed invocation are left in the store handed to
/// [`Contract::invoke`]; run each invocation in its own write set and drop it on
/// error.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    config: ContractConfig,
}

impl Contract {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    pub fn invoke<S: LedgerStore>(
        &self,
        store: &mut S,
        function: &str,
        args: &[String],
    ) -> Result<Payload, ContractError> {
        let command = Command::parse(function, args, self.config.strict_amounts)?;
        self.execute(store, command)
    }

    pub fn execute<S: LedgerStore>(
        &self,
        store: &mut S,
        command: Command,
    ) -> Result<Payload, ContractError> {
        match command {
            Command::InitLedger => {
                loader::seed_ledger(store)?;
                Ok(None)
            }
            Command::QueryAll { .. } => Ok(Some(query::query_all(store)?)),
            Command::Query { key } => Ok(query::query(store, &key)?),
            Command::Pay {
                from_key,
                to_key,
                amount,
            } => {
                transfer::pay(store, &self.config, &from_key, &to_key, amount)?;
                Ok(None)
            }
            Command::CreateBank(bank) => {
                loader::write_if_absent(store, &[bank])?;
                Ok(None)
            }
            Command::CreateCustomer(customer) => {
                loader::write_if_absent(store, &[customer])?;
                Ok(None)
            }
            Command::CreateForex(rate) => {
                loader::write_if_absent(store, &[rate])?;
                Ok(None)
            }
        }
    }
}
