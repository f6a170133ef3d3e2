use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A record persisted in the ledger under a key derived from its own fields.
pub trait LedgerRecord: Serialize + DeserializeOwned + Default {
    /// Human readable record kind, used in error messages.
    const KIND: &'static str;

    fn key(&self) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    #[serde(rename = "bankID")]
    pub bank_id: String,
    pub country: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub reserves: Decimal,
}

impl LedgerRecord for Bank {
    const KIND: &'static str = "Bank";

    fn key(&self) -> String {
        self.bank_id.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(rename = "custID")]
    pub cust_id: String,
    pub country: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
    #[serde(rename = "customerBankID")]
    pub customer_bank_id: String,
}

impl Customer {
    pub fn key_for(name: &str, cust_id: &str) -> String {
        format!("{name}_{cust_id}")
    }
}

impl LedgerRecord for Customer {
    const KIND: &'static str = "Customer";

    fn key(&self) -> String {
        Self::key_for(&self.name, &self.cust_id)
    }
}

/// Converts one unit of the `FROM` currency into `rate` units of `TO`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForexRate {
    pub pair: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub rate: Decimal,
}

impl ForexRate {
    pub fn pair_key(from_currency: &str, to_currency: &str) -> String {
        format!("{from_currency}:{to_currency}")
    }
}

impl LedgerRecord for ForexRate {
    const KIND: &'static str = "Forex pair";

    fn key(&self) -> String {
        self.pair.clone()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    #[test]
    fn derive_keys() {
        let bank = Bank {
            name: "US Bank".to_string(),
            bank_id: "US_Bank".to_string(),
            ..Default::default()
        };
        assert_eq!(bank.key(), "US_Bank");

        let customer = Customer {
            name: "US_John_Doe".to_string(),
            cust_id: "123".to_string(),
            ..Default::default()
        };
        assert_eq!(customer.key(), "US_John_Doe_123");

        let rate = ForexRate {
            pair: ForexRate::pair_key("USD", "GBP"),
            rate: Decimal::from_f64(0.75).unwrap(),
        };
        assert_eq!(rate.key(), "USD:GBP");
        // case sensitive, never normalized
        assert_ne!(ForexRate::pair_key("usd", "GBP"), rate.key());
    }

    #[test]
    fn serialize_with_wire_field_names() {
        let customer = Customer {
            name: "UK_Alice".to_string(),
            cust_id: "456".to_string(),
            country: "UK".to_string(),
            currency: "GBP".to_string(),
            balance: Decimal::from_u32(10000).unwrap(),
            customer_bank_id: "UK_Bank".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["custID"], "456");
        assert_eq!(json["customerBankID"], "UK_Bank");
        assert!(json["balance"].is_number());
        assert_eq!(json["balance"].as_f64(), Some(10000.0));
    }

    #[test]
    fn deserialize_numbers_into_decimals() {
        let bank: Bank = serde_json::from_str(
            r#"{"name":"UK_Bank","bankID":"UK_Bank","country":"UK","currency":"GBP","reserves":1000000}"#,
        )
        .unwrap();
        assert_eq!(bank.reserves, Decimal::from_u32(1_000_000).unwrap());

        let rate: ForexRate = serde_json::from_str(r#"{"pair":"JPY:USD","rate":0.0088}"#).unwrap();
        assert_eq!(rate.rate, "0.0088".parse::<Decimal>().unwrap());
    }
}
