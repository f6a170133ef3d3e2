use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    model::{Bank, Customer, ForexRate, LedgerRecord},
    store::{LedgerStore, StoreError},
};

use super::ContractConfig;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Insufficient funds in customer: {name} Customer ID: {cust_id}")]
    InsufficientFunds { name: String, cust_id: String },
    #[error("Insufficient funds in bank reserves: {name} Bank ID: {bank_id}")]
    InsufficientReserves { name: String, bank_id: String },
    #[error("Error writing updates to {role} account {name}")]
    Persist {
        role: &'static str,
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("No exchange rate for currency pair `{pair}`")]
    MissingRate { pair: String },
    #[error("{kind} with key `{key}` does not exist")]
    RecordNotFound { kind: &'static str, key: String },
    #[error("Arithmetic overflow while applying {operation}")]
    ArithmeticOverflow { operation: &'static str },
    #[error("Stored {kind} `{key}` is malformed")]
    Decode {
        kind: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode {kind} `{key}`")]
    Encode {
        kind: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub pair: String,
    pub amount: Decimal,
    pub rate: Decimal,
    pub converted: Decimal,
}

/// Moves `amount` from one customer to another, converting it at the ledger rate
/// between their currencies, and mirrors both legs on the customers' banks.
///
/// Both solvency checks run before anything is written. The four writes are issued
/// in a fixed order without rollback, see [`LedgerStore`] for the atomicity
/// precondition.
pub fn pay<S: LedgerStore>(
    store: &mut S,
    config: &ContractConfig,
    from_key: &str,
    to_key: &str,
    amount: Decimal,
) -> Result<TransferReceipt, TransferError> {
    let mut from: Customer = load(store, config, from_key)?;
    if from.balance < amount {
        return Err(TransferError::InsufficientFunds {
            name: from.name,
            cust_id: from.cust_id,
        });
    }

    let mut to: Customer = load(store, config, to_key)?;

    let pair = ForexRate::pair_key(&from.currency, &to.currency);
    let rate = match read::<ForexRate, _>(store, &pair)? {
        Some(forex) => forex.rate,
        None if config.strict_forex => return Err(TransferError::MissingRate { pair }),
        None => {
            tracing::warn!(pair = %pair, "no exchange rate on the ledger, converting at zero");
            Decimal::ZERO
        }
    };

    let from_bank_key = from.customer_bank_id.clone();
    let mut from_bank: Bank = load(store, config, &from_bank_key)?;
    if from_bank.reserves < amount {
        return Err(TransferError::InsufficientReserves {
            name: from_bank.name,
            bank_id: from_bank.bank_id,
        });
    }

    let converted = amount
        .checked_mul(rate)
        .ok_or(TransferError::ArithmeticOverflow {
            operation: "currency conversion",
        })?;

    from.balance = debit(from.balance, amount)?;
    from_bank.reserves = debit(from_bank.reserves, amount)?;
    if to_key == from_key {
        // paying oneself, both legs land on the same record
        to = from.clone();
    }
    to.balance = credit(to.balance, converted)?;
    if to_key == from_key {
        from = to.clone();
    }

    let to_bank_key = to.customer_bank_id.clone();
    let mut to_bank: Bank = if to_bank_key == from_bank_key {
        from_bank.clone()
    } else {
        load(store, config, &to_bank_key)?
    };
    to_bank.reserves = credit(to_bank.reserves, converted)?;
    if to_bank_key == from_bank_key {
        from_bank = to_bank.clone();
    }

    persist(store, from_key, &from, "FROM customer", &from.name)?;
    persist(store, to_key, &to, "TO customer", &to.name)?;
    persist(store, &from_bank_key, &from_bank, "FROM Bank", &from_bank.name)?;
    persist(store, &to_bank_key, &to_bank, "TO Bank", &to_bank.name)?;

    tracing::info!(
        from = %from.name,
        to = %to.name,
        %amount,
        %rate,
        %converted,
        "transfer completed"
    );
    Ok(TransferReceipt {
        pair,
        amount,
        rate,
        converted,
    })
}

fn read<R: LedgerRecord, S: LedgerStore>(store: &S, key: &str) -> Result<Option<R>, TransferError> {
    let Some(bytes) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| TransferError::Decode {
            kind: R::KIND,
            key: key.to_owned(),
            source,
        })
}

/// Reads a record, an absent one is a zero valued record unless `require_records` is set.
fn load<R: LedgerRecord, S: LedgerStore>(
    store: &S,
    config: &ContractConfig,
    key: &str,
) -> Result<R, TransferError> {
    match read(store, key)? {
        Some(record) => Ok(record),
        None if config.require_records => Err(TransferError::RecordNotFound {
            kind: R::KIND,
            key: key.to_owned(),
        }),
        None => {
            tracing::warn!(kind = R::KIND, key, "record not found, using an empty one");
            Ok(R::default())
        }
    }
}

fn debit(value: Decimal, amount: Decimal) -> Result<Decimal, TransferError> {
    value.checked_sub(amount).ok_or(TransferError::ArithmeticOverflow { operation: "debit" })
}

fn credit(value: Decimal, amount: Decimal) -> Result<Decimal, TransferError> {
    value.checked_add(amount).ok_or(TransferError::ArithmeticOverflow { operation: "credit" })
}

fn persist<S: LedgerStore, R: LedgerRecord>(
    store: &mut S,
    key: &str,
    record: &R,
    role: &'static str,
    name: &str,
) -> Result<(), TransferError> {
    let bytes = serde_json::to_vec(record).map_err(|source| TransferError::Encode {
        kind: R::KIND,
        key: key.to_owned(),
        source,
    })?;
    store
        .put(key, bytes)
        .map_err(|source| TransferError::Persist {
            role,
            name: name.to_owned(),
            source,
        })?;
    tracing::debug!(kind = R::KIND, key, "record updated");
    Ok(())
}
