//! Bootstraps [`balance_transfer`](crate) for the command-line driver: reads an
//! invocation script, runs every row through the in-memory host and prints the
//! committed accounts.

use std::io::{Read, Write};

use crate::processor::{
    InvocationError, InvocationProcessor, in_memory_processor::InMemoryInvocationProcessor,
};
use anyhow::Result;
use csv_parser::CsvInvocationParser;
use csv_printer::{AccountRow, print_accounts};
use tracing::info;
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, InvocationError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvInvocationParser::new(self.input);

        let mut processor = InMemoryInvocationProcessor::default();

        for row in parser {
            let (line, invocation) = row?;
            match processor.process_invocation(
                &invocation.caller,
                &invocation.function,
                &invocation.args,
            ) {
                Ok(Some(response)) => {
                    info!(line, function = %invocation.function, %response, "Invocation returned")
                }
                Ok(None) => {}
                Err(err) => (self.error_printer)(line, err),
            }
        }

        let accounts = processor.accounts()?;
        print_accounts(
            self.output,
            accounts.iter().map(|acc| AccountRow {
                id: acc.id(),
                owner: acc.owner(),
                balance: acc.balance(),
            }),
        )
    }
}
