//! CLI runners for `desk ask` and `desk records`.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::error::{QueryError, MSG_RECORDS_UNAVAILABLE};
use crate::prompt;
use crate::records;
use crate::resolver::{QueryRequest, QueryResolver};

/// Loads the inputs, resolves one request, and prints the answer.
///
/// An empty query is a usage error (non-zero exit); every other failure is
/// printed as the advisory message, like a normal answer.
pub async fn run_ask(config: &Config, request: QueryRequest) -> Result<()> {
    let resolver = QueryResolver::from_config(config);
    match resolver.try_resolve(&request).await {
        Ok(answer) => println!("{}", answer.text),
        Err(QueryError::EmptyQuery) => bail!("query must not be empty"),
        Err(e) => println!("{}", e.user_message()),
    }
    Ok(())
}

/// Prints the first `limit` records exactly as they are fed to the model.
pub fn run_records(config: &Config, limit: Option<usize>) -> Result<()> {
    let dataset = match records::load(&config.data.spreadsheet, config.data.sheet.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "cannot load notification spreadsheet");
            println!("{}", MSG_RECORDS_UNAVAILABLE);
            return Ok(());
        }
    };

    let limit = limit.unwrap_or(config.resolver.record_limit);
    println!("{}", prompt::records_context(dataset.records().iter().take(limit)));
    println!("showing {} of {} records", limit.min(dataset.len()), dataset.len());
    Ok(())
}
