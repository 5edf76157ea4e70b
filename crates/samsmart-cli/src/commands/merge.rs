//! Merge command implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use samsmart_core::{AggregationMap, Config, RawTable, merge};
use tracing::{debug, info};

use crate::cli::TableArgs;
use crate::util::emit_table;

/// Arguments for the merge command.
pub struct MergeArgs<'a> {
    pub config_path: &'a Path,
    /// Whether `--config` was given; a missing default config is not an error.
    pub explicit_config: bool,
    pub files: &'a [PathBuf],
    pub table: &'a TableArgs,
}

pub fn cmd_merge(args: MergeArgs<'_>) -> Result<()> {
    let MergeArgs {
        config_path,
        explicit_config,
        files,
        table,
    } = args;

    let aggregations = sensor_aggregations(config_path, explicit_config)?;

    let raw = files
        .iter()
        .map(|path| read_raw(path))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge(raw, &aggregations)?;
    info!(
        "Merged {} files into {} rows",
        files.len(),
        merged.len()
    );

    emit_table(&merged, table)
}

/// Per-sensor aggregation rules from the registry, if a config is available.
fn sensor_aggregations(config_path: &Path, explicit: bool) -> Result<AggregationMap> {
    if !explicit && !config_path.exists() {
        debug!(
            "No config at {}, every sensor uses 'first'",
            config_path.display()
        );
        return Ok(AggregationMap::new());
    }

    let config = Config::load(config_path)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;
    Ok(config.available_sensors.aggregations())
}

fn read_raw(path: &Path) -> Result<RawTable> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let table = RawTable::from_csv(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("Read {} rows of '{}' from {}", table.len(), table.label(), path.display());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use samsmart_core::Aggregation;

    #[test]
    fn test_missing_default_config_uses_empty_rules() {
        let dir = tempfile::tempdir().unwrap();
        let rules = sensor_aggregations(&dir.path().join("config.toml"), false).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sensor_aggregations(&dir.path().join("config.toml"), true).is_err());
    }

    #[test]
    fn test_rules_come_from_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[user]
od_session = "secret"

[available_sensors]
Gas = "cardinal"
Licht = { role = "cardinal", aggregation = "mean" }
"#,
        )
        .unwrap();

        let rules = sensor_aggregations(&path, true).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules["Licht"].name(), Aggregation::Mean.name());
    }
}
