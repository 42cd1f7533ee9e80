//! Collapse allocated rows onto a reduced key.

use std::collections::HashSet;

use tracing::debug;

use super::grouping::GroupIndex;
use super::numeric::{NullPolicy, format_number, read_numeric};
use crate::error::{ClickshareError, Result};
use crate::input::DataTable;

/// Columns an aggregation pass reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSpec {
    /// Columns identifying an output row.
    pub group_key: Vec<String>,
    /// Clicks column to sum.
    pub clicks: String,
    /// Estimate columns to sum.
    pub estimated: Vec<String>,
}

/// Sums clicks and estimates per distinct key; every other column is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// One output row per distinct key tuple, in first-seen order.
    ///
    /// Null cells are skipped by the sums, so a group of nothing but nulls
    /// sums to 0.
    pub fn aggregate(&self, table: &DataTable, spec: &AggregationSpec) -> Result<DataTable> {
        let summed: Vec<&String> = std::iter::once(&spec.clicks).chain(&spec.estimated).collect();

        let key: HashSet<&str> = spec.group_key.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        for column in &summed {
            if key.contains(column.as_str()) || !seen.insert(column.as_str()) {
                return Err(ClickshareError::Config(format!(
                    "Column '{}' cannot be both summed and used as a key, or summed twice",
                    column
                )));
            }
        }

        let index = GroupIndex::build(table, &spec.group_key)?;
        let sums = summed
            .iter()
            .map(|column| {
                read_numeric(table, column, NullPolicy::Missing)
                    .map(|col| index.sum_by_group(&col.values))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut headers = spec.group_key.clone();
        headers.extend(summed.iter().map(|c| c.to_string()));

        let rows = (0..index.group_count())
            .map(|group| {
                let mut row = index.key(group).to_vec();
                row.extend(sums.iter().map(|s| format_number(s[group])));
                row
            })
            .collect::<Vec<_>>();

        debug!(
            rows_in = table.row_count(),
            rows_out = rows.len(),
            key = ?spec.group_key,
            "aggregation pass complete"
        );

        Ok(DataTable::new(headers, rows, table.delimiter))
    }
}
