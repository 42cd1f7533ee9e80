//! clickshare: query-level estimates of page-level analytics metrics.
//!
//! Web analytics reports metrics such as sessions or conversions per landing
//! page; search analytics reports clicks per page *and* query. Given a table
//! joining the two, clickshare spreads each page-level metric over the page's
//! queries in proportion to their clicks.
//!
//! # Core Principles
//!
//! - **Click share**: within a (page, country, device[, date]) group, each row
//!   receives `clicks / group clicks` of the group's metrics
//! - **Zero-click fallback**: groups without clicks send everything to their
//!   most-impressed row instead of dropping the metric
//! - **Non-destructive**: input rows are kept in order; derived values are
//!   appended as new columns
//!
//! # Example
//!
//! ```no_run
//! use clickshare::{Breakdown, BreakdownConfig, PartialRoles};
//!
//! let config = BreakdownConfig {
//!     roles: PartialRoles {
//!         breakdown: vec!["Sessions".to_string()],
//!         ..PartialRoles::default()
//!     },
//!     ..BreakdownConfig::default()
//! };
//! let result = Breakdown::with_config(config).run("joined.csv").unwrap();
//!
//! println!("Groups: {}", result.summary.groups);
//! println!("Rows: {}", result.table.row_count());
//! ```

pub mod allocation;
pub mod error;
pub mod input;
pub mod output;
pub mod roles;

mod pipeline;

pub use crate::pipeline::{
    Breakdown, BreakdownConfig, BreakdownResult, BreakdownSummary, MetricSummary,
};
pub use allocation::{
    AggregationSpec, Aggregator, Allocation, AllocationMode, AllocationSpec, Allocator,
    Diagnostic, DiagnosticKind, Severity,
};
pub use error::{ClickshareError, Result};
pub use input::{DataTable, Parser, ParserConfig, SourceMetadata};
pub use output::{OutputFormat, TableWriter};
pub use roles::{ColumnRoles, PartialRoles, guess_column};
