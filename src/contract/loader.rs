use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    model::{Bank, Customer, ForexRate, LedgerRecord},
    store::{LedgerStore, StoreError},
};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("{kind} with key `{key}` already exists")]
    DuplicateKey { kind: &'static str, key: String },
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

/// Writes `records` in order, each one only if its key is still free.
///
/// Stops at the first key that already exists, records after it are not attempted.
/// Records written before the collision stay in the caller's write set, so callers
/// must run this inside a write set they discard on error.
pub fn write_if_absent<S, R>(store: &mut S, records: &[R]) -> Result<usize, LoaderError>
where
    S: LedgerStore,
    R: LedgerRecord,
{
    for record in records {
        let key = record.key();
        if store.get(&key)?.is_some() {
            return Err(LoaderError::DuplicateKey {
                kind: R::KIND,
                key,
            });
        }
        let bytes = serde_json::to_vec(record).map_err(|source| LoaderError::Encode {
            kind: R::KIND,
            key: key.clone(),
            source,
        })?;
        store.put(&key, bytes)?;
        tracing::debug!(kind = R::KIND, key = %key, "record created");
    }
    Ok(records.len())
}

/// Populates an empty ledger with the default banks, customers and rates.
///
/// Rates go first, then customers, then banks; a collision in any group aborts the rest.
pub fn seed_ledger<S: LedgerStore>(store: &mut S) -> Result<usize, LoaderError> {
    let rates = write_if_absent(store, &default_rates())?;
    let customers = write_if_absent(store, &default_customers())?;
    let banks = write_if_absent(store, &default_banks())?;
    tracing::info!(rates, customers, banks, "ledger seeded");
    Ok(rates + customers + banks)
}

pub fn default_banks() -> Vec<Bank> {
    [
        ("US_Bank", "USA", "USD", 1_000_000),
        ("UK_Bank", "UK", "GBP", 1_000_000),
        ("Japan_Bank", "JAPAN", "JPY", 10_000_000),
    ]
    .into_iter()
    .map(|(id, country, currency, reserves)| Bank {
        name: id.to_owned(),
        bank_id: id.to_owned(),
        country: country.to_owned(),
        currency: currency.to_owned(),
        reserves: Decimal::from(reserves),
    })
    .collect()
}

pub fn default_customers() -> Vec<Customer> {
    [
        ("US_John_Doe", "123", "US", "USD", 10_000, "US_Bank"),
        ("US_Alice", "456", "US", "USD", 10_000, "US_Bank"),
        ("UK_John_Doe", "123", "UK", "GBP", 10_000, "UK_Bank"),
        ("UK_Alice", "456", "UK", "GBP", 10_000, "UK_Bank"),
        ("JPY_John_Doe", "123", "Japan", "JPY", 1_000_000, "Japan_Bank"),
        ("JPY_Alice", "456", "Japan", "JPY", 1_000_000, "Japan_Bank"),
    ]
    .into_iter()
    .map(|(name, cust_id, country, currency, balance, bank_id)| Customer {
        name: name.to_owned(),
        cust_id: cust_id.to_owned(),
        country: country.to_owned(),
        currency: currency.to_owned(),
        balance: Decimal::from(balance),
        customer_bank_id: bank_id.to_owned(),
    })
    .collect()
}

pub fn default_rates() -> Vec<ForexRate> {
    // (from, to, mantissa, scale)
    [
        ("USD", "GBP", 75, 2),
        ("USD", "JPY", 115, 0),
        ("GBP", "USD", 135, 2),
        ("GBP", "JPY", 155, 0),
        ("JPY", "USD", 88, 4),
        ("JPY", "GBP", 65, 4),
        // same currency payments
        ("USD", "USD", 1, 0),
        ("GBP", "GBP", 1, 0),
        ("JPY", "JPY", 1, 0),
    ]
    .into_iter()
    .map(|(from, to, mantissa, scale)| ForexRate {
        pair: ForexRate::pair_key(from, to),
        rate: Decimal::new(mantissa, scale),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use crate::store::in_memory_store::InMemoryStore;

    use super::*;

    fn bank(id: &str) -> Bank {
        Bank {
            name: id.to_string(),
            bank_id: id.to_string(),
            country: "EU".to_string(),
            currency: "EUR".to_string(),
            reserves: Decimal::from(500),
        }
    }

    #[test]
    fn write_new_records() {
        let mut store = InMemoryStore::default();
        let written = write_if_absent(&mut store, &[bank("EU_Bank"), bank("CH_Bank")]).unwrap();
        assert_eq!(written, 2);

        let stored: Bank = serde_json::from_slice(&store.get("EU_Bank").unwrap().unwrap()).unwrap();
        assert_eq!(stored, bank("EU_Bank"));
    }

    #[test]
    fn abort_on_first_duplicate() {
        let mut store = InMemoryStore::default();
        write_if_absent(&mut store, &[bank("B")]).unwrap();

        let err = write_if_absent(&mut store, &[bank("A"), bank("B"), bank("C")]).unwrap_err();
        assert!(matches!(
            &err,
            LoaderError::DuplicateKey { kind: "Bank", key } if key == "B"
        ));
        assert_eq!(err.to_string(), "Bank with key `B` already exists");
        // records before the collision were written, records after it were not attempted
        assert!(store.get("A").unwrap().is_some());
        assert!(store.get("C").unwrap().is_none());
    }

    #[test]
    fn existing_record_is_not_overwritten() {
        let mut store = InMemoryStore::default();
        write_if_absent(&mut store, &[bank("EU_Bank")]).unwrap();
        let before = store.get("EU_Bank").unwrap();

        let richer = Bank {
            reserves: Decimal::from(1_000_000),
            ..bank("EU_Bank")
        };
        write_if_absent(&mut store, &[richer]).unwrap_err();
        assert_eq!(store.get("EU_Bank").unwrap(), before);
    }

    #[test]
    fn seed_twice() {
        let mut store = InMemoryStore::default();
        assert_eq!(seed_ledger(&mut store).unwrap(), 18);
        assert_eq!(store.len(), 18);

        let snapshot: Vec<_> = store.scan_range("", "").unwrap().map(Result::unwrap).collect();
        let err = seed_ledger(&mut store).unwrap_err();
        assert!(matches!(
            &err,
            LoaderError::DuplicateKey { kind: "Forex pair", key } if key == "USD:GBP"
        ));
        let after: Vec<_> = store.scan_range("", "").unwrap().map(Result::unwrap).collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn seed_contains_identity_rates() {
        let rates = default_rates();
        for currency in ["USD", "GBP", "JPY"] {
            let pair = ForexRate::pair_key(currency, currency);
            let rate = rates.iter().find(|rate| rate.pair == pair).unwrap();
            assert_eq!(rate.rate, Decimal::ONE);
        }
        let usd_gbp = rates.iter().find(|rate| rate.pair == "USD:GBP").unwrap();
        assert_eq!(usd_gbp.rate.to_string(), "0.75");
    }
}
