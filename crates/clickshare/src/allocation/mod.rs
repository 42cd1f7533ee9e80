//! Click-share allocation and aggregation.
//!
//! The [`Allocator`] spreads page-level metrics over the rows of each
//! (page, country, device[, date]) group in proportion to their clicks; the
//! [`Aggregator`] then optionally collapses the result onto a smaller key.

mod aggregator;
mod allocator;
mod diagnostics;
mod grouping;
mod numeric;
mod rank;

pub use aggregator::{AggregationSpec, Aggregator};
pub use allocator::{
    Allocation, AllocationMode, AllocationSpec, Allocator, MetricAllocation, PERCENTAGE_COLUMN,
    ROW_NUMBER_COLUMN, TOTAL_CLICKS_COLUMN, estimated_column, page_total_column,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use grouping::GroupIndex;
pub use numeric::{NullPolicy, NumericColumn, format_number, read_numeric};
pub use rank::rank_within_groups;
