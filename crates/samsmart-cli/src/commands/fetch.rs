//! Fetch command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use samsmart_core::{ApiClient, Config, household_records};
use time::OffsetDateTime;
use tracing::info;

use crate::cli::TableArgs;
use crate::util::emit_table;

/// Arguments for the fetch command.
pub struct FetchArgs<'a> {
    pub config_path: &'a Path,
    pub household: &'a str,
    pub table: &'a TableArgs,
}

pub async fn cmd_fetch(args: FetchArgs<'_>) -> Result<()> {
    let FetchArgs {
        config_path,
        household,
        table,
    } = args;

    let deployment = Config::load_validated(config_path, OffsetDateTime::now_utc())
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;

    let Some(selected) = deployment.households.get(household) else {
        let known: Vec<&str> = deployment.households.keys().map(String::as_str).collect();
        bail!(
            "Unknown household '{}'. Configured households are: {}",
            household,
            known.join(", ")
        );
    };

    let client = ApiClient::from_deployment(&deployment)?;
    info!(
        "Fetching {} timeframes of household '{}' from {}",
        selected.timeframes.len(),
        household,
        client.base_url()
    );

    let records = household_records(&client, &deployment.sensors, selected).await?;
    info!(
        "Collected {} rows across {} sensors",
        records.len(),
        records.columns().len()
    );

    emit_table(&records, table)
}
