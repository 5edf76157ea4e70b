//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use samsmart_core::{WideTable, default_config_path, downsample};
use tracing::debug;

use crate::cli::TableArgs;

/// The configuration file to use, falling back to the platform default.
pub fn config_path(explicit: Option<&PathBuf>) -> PathBuf {
    explicit.cloned().unwrap_or_else(default_config_path)
}

/// Apply the optional downsampling step and write the table as CSV.
pub fn emit_table(table: &WideTable, args: &TableArgs) -> Result<()> {
    let table = match args.bin {
        Some(width) => {
            debug!("Downsampling to {} using '{}'", width, args.agg);
            downsample(table, width, &args.agg)?
        }
        None => table.clone(),
    };

    let mut buf = Vec::new();
    table.write_csv(&mut buf)?;
    write_output(args.output.as_deref(), &buf)
}

/// Write bytes to a file or to stdout.
pub fn write_output(output: Option<&Path>, content: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
