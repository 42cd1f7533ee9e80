//! Single-pass grouping of rows by a composite key.

use indexmap::IndexMap;

use crate::error::{ClickshareError, Result};
use crate::input::DataTable;

/// Rows partitioned by the raw cell values of a set of key columns.
///
/// Groups are numbered in first-seen order; members keep input row order.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    keys: Vec<Vec<String>>,
    group_of: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl GroupIndex {
    /// Build the index in one scan over the table.
    pub fn build(table: &DataTable, key_columns: &[String]) -> Result<Self> {
        if key_columns.is_empty() {
            return Err(ClickshareError::Config(
                "Grouping key must name at least one column".to_string(),
            ));
        }

        let positions = key_columns
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| ClickshareError::column_not_found(name.as_str(), &table.headers))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut lookup: IndexMap<Vec<&str>, usize> = IndexMap::new();
        let mut group_of = Vec::with_capacity(table.row_count());
        let mut members: Vec<Vec<usize>> = Vec::new();

        for (row_idx, row) in table.rows.iter().enumerate() {
            let key: Vec<&str> = positions
                .iter()
                .map(|&p| row.get(p).map(String::as_str).unwrap_or(""))
                .collect();

            let next_id = lookup.len();
            let group = *lookup.entry(key).or_insert(next_id);
            if group == members.len() {
                members.push(Vec::new());
            }
            members[group].push(row_idx);
            group_of.push(group);
        }

        let keys = lookup
            .into_keys()
            .map(|k| k.into_iter().map(str::to_string).collect())
            .collect();

        Ok(Self {
            keys,
            group_of,
            members,
        })
    }

    /// Number of distinct groups.
    pub fn group_count(&self) -> usize {
        self.members.len()
    }

    /// Number of indexed rows.
    pub fn row_count(&self) -> usize {
        self.group_of.len()
    }

    /// Group id of a row.
    pub fn group_of(&self, row: usize) -> usize {
        self.group_of[row]
    }

    /// Key values of a group.
    pub fn key(&self, group: usize) -> &[String] {
        &self.keys[group]
    }

    /// Row indices of a group, in input order.
    pub fn members(&self, group: usize) -> &[usize] {
        &self.members[group]
    }

    /// Iterate over `(group id, member rows)`.
    pub fn groups(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.members.iter().enumerate().map(|(g, rows)| (g, rows.as_slice()))
    }

    /// Sum per group, skipping `NaN`.
    pub fn sum_by_group(&self, values: &[f64]) -> Vec<f64> {
        let mut sums = vec![0.0; self.group_count()];
        for (row, &value) in values.iter().enumerate() {
            if !value.is_nan() {
                sums[self.group_of[row]] += value;
            }
        }
        sums
    }

    /// Spread per-group values back onto rows.
    pub fn broadcast(&self, per_group: &[f64]) -> Vec<f64> {
        self.group_of.iter().map(|&g| per_group[g]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 3]]) -> DataTable {
        DataTable::new(
            vec!["url".to_string(), "device".to_string(), "clicks".to_string()],
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            b',',
        )
    }

    fn key(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let t = table(&[["/b", "mobile", "1"], ["/a", "mobile", "2"], ["/b", "mobile", "3"]]);
        let index = GroupIndex::build(&t, &key(&["url", "device"])).unwrap();

        assert_eq!(index.group_count(), 2);
        assert_eq!(index.key(0), ["/b", "mobile"]);
        assert_eq!(index.members(0), &[0, 2]);
        assert_eq!(index.members(1), &[1]);
        assert_eq!(index.group_of(2), 0);
    }

    #[test]
    fn test_sum_and_broadcast_skip_nan() {
        let t = table(&[["/a", "m", ""], ["/a", "m", ""], ["/b", "m", ""]]);
        let index = GroupIndex::build(&t, &key(&["url"])).unwrap();

        let sums = index.sum_by_group(&[3.0, f64::NAN, 5.0]);
        assert_eq!(sums, vec![3.0, 5.0]);
        assert_eq!(index.broadcast(&sums), vec![3.0, 3.0, 5.0]);
    }

    #[test]
    fn test_empty_cells_form_their_own_group() {
        let t = table(&[["", "m", "1"], ["/a", "m", "1"], ["", "m", "1"]]);
        let index = GroupIndex::build(&t, &key(&["url"])).unwrap();

        assert_eq!(index.group_count(), 2);
        assert_eq!(index.members(0), &[0, 2]);
    }

    #[test]
    fn test_empty_key_rejected() {
        let t = table(&[["/a", "m", "1"]]);
        assert!(matches!(GroupIndex::build(&t, &[]), Err(ClickshareError::Config(_))));
    }

    #[test]
    fn test_unknown_key_column() {
        let t = table(&[["/a", "m", "1"]]);
        let err = GroupIndex::build(&t, &key(&["country"])).unwrap_err();
        assert!(matches!(err, ClickshareError::ColumnNotFound { .. }));
    }
}
