use std::io::Read;

use anyhow::Context;
use csv::{StringRecord, StringRecordsIntoIter, Trim};

use crate::identity::Caller;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub caller: Caller,
    pub function: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Columns are `mspid,client,function`, followed by as many arguments as the
    /// function takes.
    fn from_record(record: &StringRecord) -> anyhow::Result<Self> {
        let mut fields = record.iter();
        let (Some(msp_id), Some(client), Some(function)) =
            (fields.next(), fields.next(), fields.next())
        else {
            anyhow::bail!("Expected at least `mspid,client,function` columns");
        };
        Ok(Self {
            caller: Caller::new(msp_id, client),
            function: function.to_owned(),
            args: fields.map(ToOwned::to_owned).collect(),
        })
    }
}

/// Parses an invocation script in CSV format, one invocation per row.
pub struct CsvInvocationParser<R> {
    records: StringRecordsIntoIter<R>,
}

impl<R> CsvInvocationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            records: reader.into_records(),
        }
    }
}

impl<R> Iterator for CsvInvocationParser<R>
where
    R: Read,
{
    type Item = anyhow::Result<(u64, Invocation)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|row| -> Self::Item {
            let record = row.context("Failed to read invocation script")?;
            let line = record.position().map_or(0, |pos| pos.line());
            let invocation = Invocation::from_record(&record)
                .with_context(|| format!("Malformed invocation at line {line}"))?;
            Ok((line, invocation))
        })
    }
}
