//! Within-group ranking by impressions.

use super::grouping::GroupIndex;

/// Rank each row inside its group by descending `weights`, 1-based.
///
/// Ties keep input order, so every group receives the permutation
/// `1..=group_size` with no shared ranks. `NaN` weights rank as 0, and
/// `-0.0` ties with `0.0`.
pub fn rank_within_groups(index: &GroupIndex, weights: &[f64]) -> Vec<usize> {
    let weights: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_nan() || w == 0.0 { 0.0 } else { w })
        .collect();
    let mut ranks = vec![0; index.row_count()];
    let mut order: Vec<usize> = Vec::new();

    for (_, members) in index.groups() {
        order.clear();
        order.extend_from_slice(members);
        // Stable sort: equal weights stay in input order
        order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));
        for (position, &row) in order.iter().enumerate() {
            ranks[row] = position + 1;
        }
    }

    ranks
}
