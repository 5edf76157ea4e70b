//! Wide, timestamp-indexed tables with one column per sensor.

use std::collections::BTreeMap;
use std::io;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};
use crate::series::TIMESTAMP_COLUMN;

/// A table of per-sensor values keyed by timestamp.
///
/// Every row has one cell per column; a sensor without a value at a row's
/// timestamp holds `None`. Rows are kept in ascending timestamp order and
/// timestamps are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    columns: Vec<String>,
    rows: BTreeMap<OffsetDateTime, Vec<Option<f64>>>,
}

impl WideTable {
    /// An empty table without columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table with the given columns.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(
        columns: Vec<String>,
        rows: BTreeMap<OffsetDateTime, Vec<Option<f64>>>,
    ) -> Self {
        debug_assert!(rows.values().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = OffsetDateTime> + '_ {
        self.rows.keys().copied()
    }

    /// Rows in ascending timestamp order.
    pub fn rows(&self) -> impl Iterator<Item = (OffsetDateTime, &[Option<f64>])> + '_ {
        self.rows.iter().map(|(ts, row)| (*ts, row.as_slice()))
    }

    /// The row at `timestamp`.
    pub fn row(&self, timestamp: OffsetDateTime) -> Option<&[Option<f64>]> {
        self.rows.get(&timestamp).map(Vec::as_slice)
    }

    /// The cell at `timestamp` in `column`; `None` if absent or missing.
    pub fn get(&self, timestamp: OffsetDateTime, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(&timestamp).and_then(|row| row[idx])
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<(OffsetDateTime, Option<f64>)>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|(ts, row)| (*ts, row[idx])).collect())
    }

    /// Whether a column holds any present, non-zero value.
    ///
    /// Useful for boolean sensors stored as `0.0`/`1.0`: missing cells are
    /// ignored, and a column of only missing cells yields `false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the column does not exist.
    pub fn not_missing_any(&self, column: &str) -> Result<bool> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown column '{column}'")))?;
        Ok(self
            .rows
            .values()
            .any(|row| row[idx].is_some_and(|v| v != 0.0)))
    }

    /// A table with only the given columns, in the given order.
    ///
    /// Rows are kept even when all their selected cells are missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown column.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<WideTable> {
        let indices = columns
            .iter()
            .map(|c| {
                self.column_index(c.as_ref()).ok_or_else(|| {
                    Error::InvalidArgument(format!("unknown column '{}'", c.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|(ts, row)| (*ts, indices.iter().map(|&i| row[i]).collect()))
            .collect();
        let names = columns.iter().map(|c| c.as_ref().to_string()).collect();
        Ok(WideTable::from_parts(names, rows))
    }

    /// Stack several tables into one.
    ///
    /// Columns are the union in first-seen order and rows the union of all
    /// timestamps. When two tables share a timestamp, a later table only
    /// fills cells that are still missing.
    pub fn concat<I>(tables: I) -> WideTable
    where
        I: IntoIterator<Item = WideTable>,
    {
        let tables: Vec<WideTable> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let width = columns.len();
        let mut rows: BTreeMap<OffsetDateTime, Vec<Option<f64>>> = BTreeMap::new();
        for table in tables {
            let targets: Vec<usize> = table
                .columns
                .iter()
                .map(|c| columns.iter().position(|name| name == c).unwrap_or_default())
                .collect();
            for (ts, row) in table.rows {
                let merged = rows.entry(ts).or_insert_with(|| vec![None; width]);
                for (cell, &target) in row.into_iter().zip(&targets) {
                    if merged[target].is_none() {
                        merged[target] = cell;
                    }
                }
            }
        }

        WideTable::from_parts(columns, rows)
    }

    /// Write the table as CSV.
    ///
    /// The first column is `timestamp` in RFC 3339; missing cells are empty.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec![TIMESTAMP_COLUMN.to_string()];
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (ts, row) in &self.rows {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(
                ts.format(&Rfc3339)
                    .map_err(|e| Error::InvalidArgument(format!("unformattable timestamp: {e}")))?,
            );
            record.extend(row.iter().map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
