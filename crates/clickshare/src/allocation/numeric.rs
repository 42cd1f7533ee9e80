//! Numeric views over string columns.

use crate::error::{ClickshareError, Result};
use crate::input::DataTable;

/// What a null-like cell becomes when a column is read as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// Nulls read as `0.0`.
    Zero,
    /// Nulls read as `NaN` and are skipped by group sums.
    Missing,
}

/// A column parsed as `f64`.
#[derive(Debug, Clone)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<f64>,
    /// Number of null-like cells encountered.
    pub nulls: usize,
}

/// Parse a named column as numbers.
///
/// Null-like cells and cells that parse to `NaN` follow `policy`. Fails with
/// `ColumnNotFound` if the header is absent and `TypeMismatch` on the first
/// non-null cell that does not parse to a finite number.
pub fn read_numeric(
    table: &DataTable,
    column: &str,
    policy: NullPolicy,
) -> Result<NumericColumn> {
    let index = table
        .column_index(column)
        .ok_or_else(|| ClickshareError::column_not_found(column, &table.headers))?;

    let mut values = Vec::with_capacity(table.row_count());
    let mut nulls = 0;

    for (row, cell) in table.column_values(index).enumerate() {
        let parsed = if DataTable::is_null_value(cell) {
            None
        } else {
            let mismatch = || ClickshareError::TypeMismatch {
                column: column.to_string(),
                row: row + 1,
                value: cell.to_string(),
            };
            let value = cell.trim().parse::<f64>().map_err(|_| mismatch())?;
            if value.is_infinite() {
                return Err(mismatch());
            }
            Some(value).filter(|v| !v.is_nan())
        };

        match parsed {
            Some(value) => values.push(value),
            None => {
                nulls += 1;
                values.push(match policy {
                    NullPolicy::Zero => 0.0,
                    NullPolicy::Missing => f64::NAN,
                });
            }
        }
    }

    Ok(NumericColumn {
        name: column.to_string(),
        values,
        nulls,
    })
}

/// Render a derived number for output; `NaN` becomes an empty cell.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
