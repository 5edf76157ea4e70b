//! Check command implementation.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use samsmart_core::{Config, Deployment};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::util::write_output;

pub fn cmd_check(config_path: &Path, quiet: bool) -> Result<()> {
    let deployment = Config::load_validated(config_path, OffsetDateTime::now_utc())
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;

    if quiet {
        return Ok(());
    }
    let summary = format_summary(config_path, &deployment)?;
    write_output(None, summary.as_bytes())
}

fn format_summary(config_path: &Path, deployment: &Deployment) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Configuration OK: {}", config_path.display())?;
    writeln!(out, "API: {}", deployment.server.base_url)?;

    let ids: Vec<&str> = deployment.sensors.ids().collect();
    writeln!(out, "Sensors ({}): {}", ids.len(), ids.join(", "))?;

    for (id, household) in &deployment.households {
        writeln!(out, "Household {} ({} timeframes)", id, household.timeframes.len())?;
        for timeframe in &household.timeframes {
            writeln!(
                out,
                "  {:<8} {:<12} {} .. {}",
                timeframe.source(),
                timeframe.tag(),
                timeframe.oldest_record().format(&Rfc3339)?,
                timeframe.newest_record().format(&Rfc3339)?,
            )?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const CONFIG: &str = r#"
[user]
od_session = "secret"

[available_sensors]
Gas = "cardinal"
Licht = "cardinal"

[[households.h1.timeframes]]
source = "koffer1"
tag = "haushalt1"
oldest_record = "2024-01-01T00:00:00Z"
newest_record = "2024-01-10T00:00:00Z"
"#;

    #[test]
    fn test_summary_lists_households_and_timeframes() {
        let deployment = Config::from_toml(CONFIG)
            .unwrap()
            .into_deployment(datetime!(2024-02-01 0:00 UTC))
            .unwrap();
        let summary = format_summary(Path::new("config.toml"), &deployment).unwrap();

        assert!(summary.contains("Configuration OK: config.toml"));
        assert!(summary.contains("Sensors (2): Gas, Licht"));
        assert!(summary.contains("Household h1 (1 timeframes)"));
        assert!(summary.contains("2024-01-01T00:00:00Z .. 2024-01-10T00:00:00Z"));
        assert!(!summary.contains("secret"));
    }
}
