//! Bootstraps [`crate::contract`] for the binary: replays an invocation script against
//! an in memory ledger, one staged write set per invocation.

use std::io::{Read, Write};

use crate::{
    contract::{Contract, ContractError, Payload, query},
    store::in_memory_store::InMemoryStore,
};
use anyhow::Result;
use csv_parser::{CsvInvocationParser, Invocation};
use response_printer::{Response, Status, print_responses};
pub mod csv_parser;
pub mod response_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub contract: Contract,
    /// Append the final ledger contents as a last `queryAll` row.
    pub dump: bool,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(self) -> Result<()> {
        let mut store = InMemoryStore::default();
        self.run_on(&mut store)
    }

    /// Same as [`Service::run`], against a caller provided ledger.
    pub fn run_on(self, store: &mut InMemoryStore) -> Result<()> {
        let parser = CsvInvocationParser::new(self.input);
        let contract = self.contract;

        let mut responses: Vec<Response> = parser
            .map(|(line, row)| match row {
                Ok(invocation) => {
                    let outcome = invoke_atomically(&contract, store, &invocation);
                    to_response(line, invocation.function, outcome)
                }
                Err(err) => {
                    tracing::error!(line, "unreadable invocation: {err}");
                    Response {
                        line,
                        function: String::new(),
                        status: Status::Error,
                        message: err.to_string(),
                    }
                }
            })
            .collect();

        if self.dump {
            let dump = query::query_all(&*store)
                .map(Some)
                .map_err(ContractError::from);
            responses.push(to_response(0, "queryAll".to_string(), dump));
        }
        print_responses(self.output, responses.into_iter())?;
        Ok(())
    }
}

/// Runs one invocation in its own write set, committed only if it succeeds.
pub fn invoke_atomically(
    contract: &Contract,
    store: &mut InMemoryStore,
    invocation: &Invocation,
) -> Result<Payload, ContractError> {
    let mut staged = store.begin();
    let outcome = contract.invoke(&mut staged, &invocation.function, &invocation.args);
    match &outcome {
        Ok(_) => {
            let written = staged.commit();
            tracing::debug!(function = %invocation.function, written, "invocation committed");
        }
        Err(err) => {
            // dropping the staged writes discards everything the invocation wrote
            tracing::warn!(function = %invocation.function, "invocation failed: {err}");
        }
    }
    outcome
}

fn to_response(line: u64, function: String, outcome: Result<Payload, ContractError>) -> Response {
    match outcome {
        Ok(payload) => Response {
            line,
            function,
            status: Status::Ok,
            message: payload
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default(),
        },
        Err(err) => Response {
            line,
            function,
            status: Status::Error,
            message: err.to_string(),
        },
    }
}
