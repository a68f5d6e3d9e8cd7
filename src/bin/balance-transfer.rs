use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use balance_transfer::{bin_utils::Service, processor::InvocationError};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Replays a CSV script of balance transfer invocations and prints the resulting accounts.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Script with one `mspid,client,function,args...` invocation per row
    script: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = File::open(&args.script)
        .with_context(|| format!("Failed to open `{}`", args.script.display()))?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|line, err| match err {
            InvocationError::CommandErr(err) => eprintln!("Error at line {line}: {err}"),
            InvocationError::AccountErr(err) => eprintln!("Rejected at line {line}: {err}"),
        }),
    };
    service.run()
}
