//! Click-share allocation of page-level metrics to the rows of each group.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::diagnostics::{Diagnostic, DiagnosticKind};
use super::grouping::GroupIndex;
use super::numeric::{NullPolicy, format_number, read_numeric};
use super::rank::rank_within_groups;
use crate::error::{ClickshareError, Result};
use crate::input::DataTable;

/// Group sum of clicks, broadcast to each row.
pub const TOTAL_CLICKS_COLUMN: &str = "total_clicks_by_page";
/// Row share of its group's clicks.
pub const PERCENTAGE_COLUMN: &str = "percentage_breakdown";
/// Rank of the row inside its group by impressions.
pub const ROW_NUMBER_COLUMN: &str = "row_number";

/// Name of the estimate column derived from a breakdown metric.
pub fn estimated_column(metric: &str) -> String {
    format!("{}_estimated", metric)
}

/// Name of the group-total column derived from a breakdown metric.
pub fn page_total_column(metric: &str) -> String {
    format!("total_{}_per_page", metric)
}

/// How a group with zero clicks is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Plain `clicks / total`; zero-click groups yield undefined shares and
    /// are reported as degenerate.
    Proportional,
    /// Nulls read as zero, shares default to 0, and zero-click groups with a
    /// positive metric send everything to their top-impression row.
    #[default]
    Fallback,
}

impl std::str::FromStr for AllocationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proportional" | "simple" => Ok(AllocationMode::Proportional),
            "fallback" | "richer" => Ok(AllocationMode::Fallback),
            _ => Err(format!(
                "Unknown allocation mode: {}. Use fallback or proportional.",
                s
            )),
        }
    }
}

impl std::fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationMode::Proportional => write!(f, "proportional"),
            AllocationMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// Columns an allocation pass reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSpec {
    /// Columns whose values define a group.
    pub group_key: Vec<String>,
    /// Allocation weight.
    pub clicks: String,
    /// Metrics to redistribute.
    pub breakdown: Vec<String>,
    /// Ranking column for the zero-click fallback.
    pub impressions: Option<String>,
}

impl AllocationSpec {
    /// Check that every column exists and that breakdown metrics do not
    /// overlap the key or base metric columns.
    pub fn validate(&self, table: &DataTable) -> Result<()> {
        if self.group_key.is_empty() {
            return Err(ClickshareError::Config(
                "Grouping key must name at least one column".to_string(),
            ));
        }
        if self.breakdown.is_empty() {
            return Err(ClickshareError::Config(
                "No breakdown columns selected".to_string(),
            ));
        }

        let referenced = self
            .group_key
            .iter()
            .chain(std::iter::once(&self.clicks))
            .chain(self.impressions.iter())
            .chain(self.breakdown.iter());
        for column in referenced {
            if table.column_index(column).is_none() {
                return Err(ClickshareError::column_not_found(column.as_str(), &table.headers));
            }
        }

        let reserved: HashSet<&str> = self
            .group_key
            .iter()
            .chain(std::iter::once(&self.clicks))
            .chain(self.impressions.iter())
            .map(String::as_str)
            .collect();
        if let Some(overlap) = self.breakdown.iter().find(|c| reserved.contains(c.as_str())) {
            return Err(ClickshareError::Config(format!(
                "Breakdown column '{}' is also a key or base metric column",
                overlap
            )));
        }

        Ok(())
    }
}

/// Derived values for one breakdown metric.
#[derive(Debug, Clone)]
pub struct MetricAllocation {
    /// Source column name.
    pub column: String,
    /// Parsed input values (`NaN` for nulls).
    pub raw: Vec<f64>,
    /// Group sum of the raw metric per row (fallback mode only).
    pub page_total: Option<Vec<f64>>,
    /// `percentage_breakdown * raw` per row.
    pub estimated: Vec<f64>,
}

impl MetricAllocation {
    /// Sum of the raw metric over all rows, nulls skipped.
    pub fn raw_total(&self) -> f64 {
        self.raw.iter().filter(|v| !v.is_nan()).sum()
    }

    /// Sum of the estimates over all rows, undefined values skipped.
    pub fn estimated_total(&self) -> f64 {
        self.estimated.iter().filter(|v| !v.is_nan()).sum()
    }
}

/// Result of one allocation pass. Row `i` of every vector describes input
/// row `i`.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub mode: AllocationMode,
    pub group_count: usize,
    pub total_clicks_by_page: Vec<f64>,
    pub percentage_breakdown: Vec<f64>,
    pub metrics: Vec<MetricAllocation>,
    /// 1-based rank by impressions (fallback mode only).
    pub row_number: Option<Vec<usize>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Allocation {
    /// Number of allocated rows.
    pub fn row_count(&self) -> usize {
        self.percentage_breakdown.len()
    }

    /// Count diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Copy `table` and append (or overwrite) the derived columns.
    pub fn augment(&self, table: &DataTable) -> DataTable {
        debug_assert_eq!(table.row_count(), self.row_count());

        let render = |values: &[f64]| -> Vec<String> {
            values.iter().copied().map(format_number).collect()
        };

        let mut out = table.clone();
        out.set_column(TOTAL_CLICKS_COLUMN, render(&self.total_clicks_by_page));
        out.set_column(PERCENTAGE_COLUMN, render(&self.percentage_breakdown));
        for metric in &self.metrics {
            if let Some(page_total) = &metric.page_total {
                out.set_column(&page_total_column(&metric.column), render(page_total));
            }
            out.set_column(&estimated_column(&metric.column), render(&metric.estimated));
        }
        if let Some(ranks) = &self.row_number {
            out.set_column(
                ROW_NUMBER_COLUMN,
                ranks.iter().map(|r| r.to_string()).collect(),
            );
        }
        out
    }
}

/// Redistributes group-level metrics to rows by click share.
#[derive(Debug, Clone, Copy, Default)]
pub struct Allocator {
    mode: AllocationMode,
}

impl Allocator {
    /// Create an allocator for the given zero-click policy.
    pub fn new(mode: AllocationMode) -> Self {
        Self { mode }
    }

    /// The configured policy.
    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Run one allocation pass over `table`.
    pub fn allocate(&self, table: &DataTable, spec: &AllocationSpec) -> Result<Allocation> {
        spec.validate(table)?;
        let index = GroupIndex::build(table, &spec.group_key)?;

        let allocation = match self.mode {
            AllocationMode::Proportional => allocate_proportional(table, spec, &index)?,
            AllocationMode::Fallback => allocate_with_fallback(table, spec, &index)?,
        };

        debug!(
            mode = %self.mode,
            rows = allocation.row_count(),
            groups = allocation.group_count,
            metrics = allocation.metrics.len(),
            "allocation pass complete"
        );
        Ok(allocation)
    }
}

fn read_metrics(table: &DataTable, spec: &AllocationSpec) -> Result<Vec<Vec<f64>>> {
    spec.breakdown
        .iter()
        .map(|col| read_numeric(table, col, NullPolicy::Missing).map(|c| c.values))
        .collect()
}

fn estimate(percentage: &[f64], raw: &[f64]) -> Vec<f64> {
    percentage.iter().zip(raw).map(|(p, r)| p * r).collect()
}

fn allocate_proportional(
    table: &DataTable,
    spec: &AllocationSpec,
    index: &GroupIndex,
) -> Result<Allocation> {
    let clicks = read_numeric(table, &spec.clicks, NullPolicy::Missing)?;
    let raw_metrics = read_metrics(table, spec)?;

    let click_totals = index.sum_by_group(&clicks.values);
    let total_clicks_by_page = index.broadcast(&click_totals);
    let percentage_breakdown: Vec<f64> = clicks
        .values
        .iter()
        .zip(&total_clicks_by_page)
        .map(|(c, t)| c / t)
        .collect();

    let mut diagnostics = Vec::new();
    for (group, members) in index.groups() {
        if click_totals[group] == 0.0 {
            debug!(group = ?index.key(group), "zero-click group");
            diagnostics.push(Diagnostic::degenerate_group(index.key(group), members));
        }
    }
    if !diagnostics.is_empty() {
        warn!(
            groups = diagnostics.len(),
            "groups with zero total clicks have undefined percentage_breakdown"
        );
    }

    let metrics = spec
        .breakdown
        .iter()
        .zip(raw_metrics)
        .map(|(column, raw)| MetricAllocation {
            column: column.clone(),
            estimated: estimate(&percentage_breakdown, &raw),
            raw,
            page_total: None,
        })
        .collect();

    Ok(Allocation {
        mode: AllocationMode::Proportional,
        group_count: index.group_count(),
        total_clicks_by_page,
        percentage_breakdown,
        metrics,
        row_number: None,
        diagnostics,
    })
}

fn allocate_with_fallback(
    table: &DataTable,
    spec: &AllocationSpec,
    index: &GroupIndex,
) -> Result<Allocation> {
    let mut diagnostics = Vec::new();

    let clicks = read_numeric(table, &spec.clicks, NullPolicy::Zero)?;
    if clicks.nulls > 0 {
        diagnostics.push(Diagnostic::nulls_replaced(&clicks.name, clicks.nulls));
    }
    let impressions = match &spec.impressions {
        Some(column) => {
            let col = read_numeric(table, column, NullPolicy::Zero)?;
            if col.nulls > 0 {
                diagnostics.push(Diagnostic::nulls_replaced(&col.name, col.nulls));
            }
            col.values
        }
        None => vec![0.0; table.row_count()],
    };
    let raw_metrics = read_metrics(table, spec)?;

    let click_totals = index.sum_by_group(&clicks.values);
    let total_clicks_by_page = index.broadcast(&click_totals);
    let mut percentage_breakdown: Vec<f64> = clicks
        .values
        .iter()
        .zip(&total_clicks_by_page)
        .map(|(&c, &t)| if t > 0.0 { c / t } else { 0.0 })
        .collect();

    let metric_sums: Vec<Vec<f64>> = raw_metrics
        .iter()
        .map(|raw| index.sum_by_group(raw))
        .collect();
    let row_number = rank_within_groups(index, &impressions);

    for (group, members) in index.groups() {
        let has_signal = metric_sums.iter().any(|sums| sums[group] > 0.0);
        if click_totals[group] != 0.0 || !has_signal {
            continue;
        }

        let mut target = members[0];
        for &row in members {
            if row_number[row] == 1 {
                percentage_breakdown[row] = 1.0;
                target = row;
            } else {
                percentage_breakdown[row] = 0.0;
            }
        }
        debug!(group = ?index.key(group), row = target, "zero-click fallback");
        diagnostics.push(Diagnostic::fallback_applied(index.key(group), members, target));
    }

    let metrics = spec
        .breakdown
        .iter()
        .zip(raw_metrics)
        .zip(metric_sums)
        .map(|((column, raw), sums)| MetricAllocation {
            column: column.clone(),
            estimated: estimate(&percentage_breakdown, &raw),
            page_total: Some(index.broadcast(&sums)),
            raw,
        })
        .collect();

    Ok(Allocation {
        mode: AllocationMode::Fallback,
        group_count: index.group_count(),
        total_clicks_by_page,
        percentage_breakdown,
        metrics,
        row_number: Some(row_number),
        diagnostics,
    })
}
