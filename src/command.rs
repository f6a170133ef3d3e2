use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::{Bank, Customer, ForexRate};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Incorrect number of arguments for {function}. Expecting {expected}, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid function name: `{name}`")]
    UnknownFunction { name: String },
    #[error("Invalid amount `{value}`")]
    InvalidAmount { value: String },
}

/// Parsed contract invocation, one variant per recognized function name.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InitLedger,
    /// The collection argument is required but has no effect on the result.
    QueryAll { collection: String },
    Query { key: String },
    Pay {
        from_key: String,
        to_key: String,
        amount: Decimal,
    },
    CreateBank(Bank),
    CreateCustomer(Customer),
    CreateForex(ForexRate),
}

/// Function names accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    InitLedger,
    QueryAll,
    Query,
    Pay,
    CreateBank,
    CreateCustomer,
    CreateForex,
}

impl Function {
    pub const ALL: [Function; 7] = [
        Function::InitLedger,
        Function::QueryAll,
        Function::Query,
        Function::Pay,
        Function::CreateBank,
        Function::CreateCustomer,
        Function::CreateForex,
    ];

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|function| function.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::InitLedger => "initLedger",
            Function::QueryAll => "queryAll",
            Function::Query => "query",
            Function::Pay => "pay",
            Function::CreateBank => "createBank",
            Function::CreateCustomer => "createCustomer",
            Function::CreateForex => "createForex",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Function::InitLedger => 0,
            Function::QueryAll | Function::Query => 1,
            Function::Pay => 3,
            Function::CreateBank => 5,
            Function::CreateCustomer => 6,
            Function::CreateForex => 2,
        }
    }
}

impl Command {
    /// Routes `function` to its command, checking the argument count first.
    ///
    /// With `strict_amounts` unset, a numeric argument that does not parse reads as
    /// zero. Negative numbers are rejected either way.
    pub fn parse(
        function: &str,
        args: &[String],
        strict_amounts: bool,
    ) -> Result<Self, CommandError> {
        let Some(function) = Function::lookup(function) else {
            return Err(CommandError::UnknownFunction {
                name: function.to_owned(),
            });
        };
        if args.len() != function.arity() {
            return Err(CommandError::ArgumentCount {
                function: function.name(),
                expected: function.arity(),
                actual: args.len(),
            });
        }
        let arg = |idx: usize| args[idx].clone();
        let amount = |idx: usize| parse_amount(&args[idx], strict_amounts);

        let command = match function {
            Function::InitLedger => Command::InitLedger,
            Function::QueryAll => Command::QueryAll { collection: arg(0) },
            Function::Query => Command::Query { key: arg(0) },
            Function::Pay => Command::Pay {
                from_key: arg(0),
                to_key: arg(1),
                amount: amount(2)?,
            },
            Function::CreateBank => Command::CreateBank(Bank {
                name: arg(0),
                bank_id: arg(1),
                country: arg(2),
                currency: arg(3),
                reserves: amount(4)?,
            }),
            Function::CreateCustomer => Command::CreateCustomer(Customer {
                name: arg(0),
                cust_id: arg(1),
                country: arg(2),
                currency: arg(3),
                balance: amount(4)?,
                customer_bank_id: arg(5),
            }),
            Function::CreateForex => Command::CreateForex(ForexRate {
                pair: arg(0),
                rate: amount(1)?,
            }),
        };
        Ok(command)
    }
}

pub fn parse_amount(value: &str, strict: bool) -> Result<Decimal, CommandError> {
    let trimmed = value.trim();
    let parsed = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed));
    match parsed {
        Ok(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            Err(CommandError::InvalidAmount {
                value: value.to_owned(),
            })
        }
        // "-0" parses with its sign bit set
        Ok(amount) if amount.is_zero() => Ok(Decimal::ZERO),
        Ok(amount) => Ok(amount),
        Err(_) if strict => Err(CommandError::InvalidAmount {
            value: value.to_owned(),
        }),
        Err(_) => {
            tracing::warn!(value, "unparsable amount, treating it as zero");
            Ok(Decimal::ZERO)
        }
    }
}
