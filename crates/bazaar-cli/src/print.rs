#![deny(clippy::all, clippy::pedantic)]

use bazaar::client::into_data;
use bazaar_api_types::ResponseEnvelope;
use serde::Serialize;

use crate::context::CliError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::Render(e.to_string()))?;
    println!("{out}");
    Ok(())
}

/// Prints the payload of a write; `success: false` becomes an error.
pub fn print_envelope<T: Serialize>(
    envelope: ResponseEnvelope<T>,
    fallback: &str,
) -> Result<(), CliError> {
    let data = into_data(envelope, fallback)?;
    print_json(&data)
}
