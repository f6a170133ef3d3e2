use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use forex_ledger::{
    bin_utils::Service,
    contract::{Contract, ContractConfig},
};
use tracing_subscriber::EnvFilter;

/// Replay a script of ledger invocations against a fresh in memory ledger
#[derive(Parser, Debug)]
#[command(name = "forex-ledger")]
struct Args {
    /// CSV script, one `function,arg1,arg2,...` invocation per line
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Fail transfers between currencies with no exchange rate on the ledger
    #[arg(long)]
    strict_forex: bool,

    /// Fail invocations whose numeric arguments do not parse
    #[arg(long)]
    strict_amounts: bool,

    /// Fail transfers that reference customers or banks missing from the ledger
    #[arg(long)]
    require_records: bool,

    /// Print the final ledger contents after the script
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn contract_config(&self) -> ContractConfig {
        ContractConfig {
            strict_forex: self.strict_forex,
            strict_amounts: self.strict_amounts,
            require_records: self.require_records,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let file = File::open(&args.script)
        .with_context(|| format!("Failed to open `{}`", args.script.display()))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        contract: Contract::new(args.contract_config()),
        dump: args.dump,
    };
    service.run()
}
