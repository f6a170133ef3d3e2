use std::io::Write;

use csv::Writer;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub line: u64,
    pub function: String,
    pub status: Status,
    /// Payload for successful invocations, error text otherwise.
    pub message: String,
}

pub fn print_responses<W>(
    output: &mut W,
    responses: impl Iterator<Item = Response>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for response in responses {
        if let Err(err) = writer.serialize(response) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
