//! Column-role binding: which input columns are the page, device, country,
//! date, query, clicks, impressions and breakdown metrics.

mod binding;
mod guess;

pub use binding::ColumnRoles;
pub use guess::{PartialRoles, guess_column};
