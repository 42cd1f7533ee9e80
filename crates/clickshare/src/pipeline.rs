//! Main pipeline struct and public API.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::{
    AggregationSpec, Aggregator, AllocationMode, AllocationSpec, Allocator, Diagnostic,
    DiagnosticKind, Severity, estimated_column,
};
use crate::error::{ClickshareError, Result};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};
use crate::roles::{ColumnRoles, PartialRoles};

/// Configuration for a breakdown run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownConfig {
    /// Parser configuration.
    #[serde(skip)]
    pub parser: ParserConfig,
    /// Explicit role bindings; unset roles are guessed when `guess_roles` is on.
    pub roles: PartialRoles,
    /// Fill unset roles by substring match on the headers.
    pub guess_roles: bool,
    /// Add the date column to the grouping key.
    pub include_date: bool,
    /// Collapse allocated rows onto url, country, device and query.
    pub aggregate: bool,
    /// Zero-click policy.
    pub mode: AllocationMode,
}

impl Default for BreakdownConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            roles: PartialRoles::default(),
            guess_roles: true,
            include_date: true,
            aggregate: false,
            mode: AllocationMode::default(),
        }
    }
}

impl BreakdownConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ClickshareError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
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
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Totals for one breakdown metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSummary {
    pub column: String,
    /// Sum of the raw metric over input rows.
    pub raw_total: f64,
    /// Sum of `{column}_estimated` over input rows.
    pub estimated_total: f64,
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownSummary {
    pub mode: AllocationMode,
    pub rows_in: usize,
    pub rows_out: usize,
    pub groups: usize,
    pub include_date: bool,
    pub aggregated: bool,
    /// Zero-click groups with undefined shares (proportional mode).
    pub degenerate_groups: usize,
    /// Zero-click groups routed to their top-impression row (fallback mode).
    pub fallback_groups: usize,
    pub metrics: Vec<MetricSummary>,
}

/// Result of processing a table.
#[derive(Debug, Clone)]
pub struct BreakdownResult {
    /// Metadata about the source file, when read from disk.
    pub source: Option<SourceMetadata>,
    /// The bindings the run used.
    pub roles: ColumnRoles,
    /// Augmented (or aggregated) output table.
    pub table: DataTable,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
    pub summary: BreakdownSummary,
}

impl BreakdownResult {
    /// Diagnostics at warning level.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// The breakdown pipeline: parse, bind roles, allocate, optionally aggregate.
pub struct Breakdown {
    config: BreakdownConfig,
    parser: Parser,
    allocator: Allocator,
    aggregator: Aggregator,
}

impl Breakdown {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(BreakdownConfig::default())
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(config: BreakdownConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let allocator = Allocator::new(config.mode);

        Self {
            config,
            parser,
            allocator,
            aggregator: Aggregator::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &BreakdownConfig {
        &self.config
    }

    /// Bindings for `table`: explicit roles over guesses (when enabled).
    pub fn resolve_roles(&self, table: &DataTable) -> Result<ColumnRoles> {
        let roles = if self.config.guess_roles {
            PartialRoles::guess(&table.headers).overlay(self.config.roles.clone())
        } else {
            self.config.roles.clone()
        };
        let roles = roles.resolve()?;
        roles.validate(table)?;
        Ok(roles)
    }

    /// Read a file and process it.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<BreakdownResult> {
        let (table, source) = self.parser.parse_file(path)?;
        let mut result = self.process(&table)?;
        result.source = Some(source);
        Ok(result)
    }

    /// Process an in-memory table.
    pub fn process(&self, table: &DataTable) -> Result<BreakdownResult> {
        let roles = self.resolve_roles(table)?;

        let spec = AllocationSpec {
            group_key: roles.group_key(self.config.include_date)?,
            clicks: roles.clicks.clone(),
            breakdown: roles.breakdown.clone(),
            impressions: roles.impressions.clone(),
        };
        let allocation = self.allocator.allocate(table, &spec)?;
        let mut output = allocation.augment(table);

        if self.config.aggregate {
            let agg_spec = AggregationSpec {
                group_key: roles.aggregation_key(),
                clicks: roles.clicks.clone(),
                estimated: roles.breakdown.iter().map(|c| estimated_column(c)).collect(),
            };
            output = self.aggregator.aggregate(&output, &agg_spec)?;
        }

        let summary = BreakdownSummary {
            mode: allocation.mode,
            rows_in: table.row_count(),
            rows_out: output.row_count(),
            groups: allocation.group_count,
            include_date: self.config.include_date,
            aggregated: self.config.aggregate,
            degenerate_groups: allocation.count(DiagnosticKind::DegenerateGroup),
            fallback_groups: allocation.count(DiagnosticKind::FallbackApplied),
            metrics: allocation
                .metrics
                .iter()
                .map(|m| MetricSummary {
                    column: m.column.clone(),
                    raw_total: m.raw_total(),
                    estimated_total: m.estimated_total(),
                })
                .collect(),
        };

        info!(
            mode = %self.allocator.mode(),
            rows_in = summary.rows_in,
            rows_out = summary.rows_out,
            groups = summary.groups,
            fallback_groups = summary.fallback_groups,
            degenerate_groups = summary.degenerate_groups,
            "breakdown complete"
        );

        Ok(BreakdownResult {
            source: None,
            roles,
            table: output,
            diagnostics: allocation.diagnostics,
            summary,
        })
    }
}

impl Default for Breakdown {
    fn default() -> Self {
        Self::new()
    }
}
