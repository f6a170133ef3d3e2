use std::io::Read;

use csv::{StringRecordsIntoIter, Trim};

/// One row of an invocation script: a function name followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
}

/// Parses a headerless CSV script, one invocation per row.
///
/// Rows may have any number of fields. Lines starting with `#` are skipped.
pub struct CsvInvocationParser<R> {
    iter: StringRecordsIntoIter<R>,
}

impl<R> CsvInvocationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);

        Self {
            iter: reader.into_records(),
        }
    }
}

impl<R> Iterator for CsvInvocationParser<R>
where
    R: Read,
{
    type Item = (u64, csv::Result<Invocation>);

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.iter.next()?;
        let line = match &row {
            Ok(record) => record.position().map_or(0, |pos| pos.line()),
            Err(err) => err.position().map_or(0, |pos| pos.line()),
        };
        let invocation = row.map(|record| {
            let mut fields = record.iter().map(ToOwned::to_owned);
            Invocation {
                function: fields.next().unwrap_or_default(),
                args: fields.collect(),
            }
        });
        Some((line, invocation))
    }
}
