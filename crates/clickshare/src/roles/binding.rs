//! Column-role bindings and their validation against a table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ClickshareError, Result};
use crate::input::DataTable;

/// Which input column plays which role in the allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Landing page URL (grouping key).
    pub url: String,
    /// Device category (grouping key).
    pub device: String,
    /// Country (grouping key).
    pub country: String,
    /// Date (grouping key when dates are included).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Search query; distinguishes rows inside a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Search clicks, the allocation weight.
    pub clicks: String,
    /// Search impressions, used to rank rows for the zero-click fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impressions: Option<String>,
    /// Page-level metrics to redistribute.
    #[serde(default)]
    pub breakdown: Vec<String>,
}

impl ColumnRoles {
    /// Bind the mandatory roles.
    pub fn new(
        url: impl Into<String>,
        device: impl Into<String>,
        country: impl Into<String>,
        clicks: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            device: device.into(),
            country: country.into(),
            clicks: clicks.into(),
            ..Self::default()
        }
    }

    /// Bind the date column.
    pub fn with_date(mut self, column: impl Into<String>) -> Self {
        self.date = Some(column.into());
        self
    }

    /// Bind the query column.
    pub fn with_query(mut self, column: impl Into<String>) -> Self {
        self.query = Some(column.into());
        self
    }

    /// Bind the impressions column.
    pub fn with_impressions(mut self, column: impl Into<String>) -> Self {
        self.impressions = Some(column.into());
        self
    }

    /// Add breakdown metric columns.
    pub fn with_breakdown<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.breakdown.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Columns that define allocation groups: url, country, device and,
    /// when requested, date.
    pub fn group_key(&self, include_date: bool) -> Result<Vec<String>> {
        let mut key = vec![self.url.clone(), self.country.clone(), self.device.clone()];
        if include_date {
            match &self.date {
                Some(date) => key.push(date.clone()),
                None => {
                    return Err(ClickshareError::Config(
                        "Date grouping requested but no date column is bound".to_string(),
                    ));
                }
            }
        }
        Ok(key)
    }

    /// Columns that define the collapsed output: url, country, device and the
    /// query when bound.
    pub fn aggregation_key(&self) -> Vec<String> {
        let mut key = vec![self.url.clone(), self.country.clone(), self.device.clone()];
        if let Some(query) = &self.query {
            key.push(query.clone());
        }
        key
    }

    /// Every bound column except the breakdown metrics.
    pub fn identifying_columns(&self) -> Vec<&str> {
        let mut cols = vec![
            self.url.as_str(),
            self.device.as_str(),
            self.country.as_str(),
            self.clicks.as_str(),
        ];
        cols.extend(self.date.as_deref());
        cols.extend(self.query.as_deref());
        cols.extend(self.impressions.as_deref());
        cols
    }

    /// Check the binding against a table's headers.
    pub fn validate(&self, table: &DataTable) -> Result<()> {
        let bound = self
            .identifying_columns()
            .into_iter()
            .chain(self.breakdown.iter().map(String::as_str));
        for column in bound {
            if table.column_index(column).is_none() {
                return Err(ClickshareError::column_not_found(column, &table.headers));
            }
        }

        if self.breakdown.is_empty() {
            return Err(ClickshareError::Config(
                "No breakdown columns selected".to_string(),
            ));
        }

        let identifying: HashSet<&str> = self.identifying_columns().into_iter().collect();
        let mut seen = HashSet::new();
        for column in &self.breakdown {
            if identifying.contains(column.as_str()) {
                return Err(ClickshareError::Config(format!(
                    "Breakdown column '{}' is already bound to another role",
                    column
                )));
            }
            if !seen.insert(column.as_str()) {
                return Err(ClickshareError::Config(format!(
                    "Breakdown column '{}' selected more than once",
                    column
                )));
            }
        }

        Ok(())
    }
}
