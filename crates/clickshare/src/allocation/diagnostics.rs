//! Non-fatal findings raised while allocating.

use serde::{Deserialize, Serialize};

/// Kind of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A group has zero total clicks, so proportional shares are undefined.
    DegenerateGroup,
    /// A zero-click group had its metrics routed to its top-impression row.
    FallbackApplied,
    /// Null clicks or impressions were read as zero.
    NullsReplaced,
}

impl DiagnosticKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::DegenerateGroup => "Degenerate Group",
            DiagnosticKind::FallbackApplied => "Fallback Applied",
            DiagnosticKind::NullsReplaced => "Nulls Replaced",
        }
    }
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected behavior worth recording.
    Info,
    /// Output contains undefined values the caller must handle.
    Warning,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
        }
    }
}

/// A finding about one group or one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Key values of the affected group (empty for column-level findings).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
    /// Affected column (column-level findings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Affected 0-based row indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<usize>,
    pub message: String,
}

impl Diagnostic {
    /// Zero-click group left without a defined share.
    pub fn degenerate_group(group: &[String], rows: &[usize]) -> Self {
        Self {
            kind: DiagnosticKind::DegenerateGroup,
            severity: Severity::Warning,
            group: group.to_vec(),
            column: None,
            rows: rows.to_vec(),
            message: format!(
                "Group [{}] has zero total clicks; percentage_breakdown is undefined for {} row(s)",
                group.join(", "),
                rows.len()
            ),
        }
    }

    /// Zero-click group routed to its top row.
    pub fn fallback_applied(group: &[String], rows: &[usize], target_row: usize) -> Self {
        Self {
            kind: DiagnosticKind::FallbackApplied,
            severity: Severity::Info,
            group: group.to_vec(),
            column: None,
            rows: rows.to_vec(),
            message: format!(
                "Group [{}] has zero clicks; all breakdown metrics assigned to row {}",
                group.join(", "),
                target_row + 1
            ),
        }
    }

    /// Null cells read as zero in a base metric column.
    pub fn nulls_replaced(column: &str, count: usize) -> Self {
        Self {
            kind: DiagnosticKind::NullsReplaced,
            severity: Severity::Info,
            group: Vec::new(),
            column: Some(column.to_string()),
            rows: Vec::new(),
            message: format!("{} null value(s) in '{}' treated as 0", count, column),
        }
    }
}
