//! Serialize tables to CSV, TSV or JSON.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ClickshareError, Result};
use crate::input::DataTable;

/// Output file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    /// Array of records, one object per row, keys in column order.
    Json,
}

impl OutputFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }

    /// Pick a format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" | "tab" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writes a [`DataTable`] in one [`OutputFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TableWriter {
    format: OutputFormat,
}

impl TableWriter {
    /// Create a writer for the given format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// The configured format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write the table to any sink.
    pub fn write_to<W: Write>(&self, table: &DataTable, writer: W) -> Result<()> {
        match self.format {
            OutputFormat::Csv => write_delimited(table, writer, b','),
            OutputFormat::Tsv => write_delimited(table, writer, b'\t'),
            OutputFormat::Json => write_json(table, writer),
        }
    }

    /// Write the table to a file, creating parent directories as needed.
    pub fn write_file(&self, table: &DataTable, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |e| ClickshareError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_to(table, &mut writer)?;
        writer.flush().map_err(io_err)
    }

    /// Render the table into a string.
    pub fn render(&self, table: &DataTable) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(table, &mut buf)?;
        // Every cell came from a `String`, so the output is valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn write_delimited<W: Write>(table: &DataTable, writer: W, delimiter: u8) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    csv_writer.write_record(&table.headers)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn write_json<W: Write>(table: &DataTable, writer: W) -> Result<()> {
    let records: Vec<IndexMap<&str, Value>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .headers
                .iter()
                .zip(row)
                .map(|(header, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.clone())
                    };
                    (header.as_str(), value)
                })
                .collect()
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}
