//! Best-effort role guessing from header names, plus partial bindings that
//! can be layered (guess, then config file, then explicit choices).

use serde::{Deserialize, Serialize};

use super::binding::ColumnRoles;
use crate::error::{ClickshareError, Result};

/// Return the first header containing `needle`, ignoring case.
pub fn guess_column<'a>(headers: &'a [String], needle: &str) -> Option<&'a str> {
    let needle = needle.to_lowercase();
    headers
        .iter()
        .find(|h| h.to_lowercase().contains(&needle))
        .map(String::as_str)
}

/// A role binding where any role may still be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialRoles {
    pub url: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub date: Option<String>,
    pub query: Option<String>,
    pub clicks: Option<String>,
    pub impressions: Option<String>,
    pub breakdown: Vec<String>,
}

impl PartialRoles {
    /// Guess every role by substring match against the headers.
    ///
    /// Breakdown columns are never guessed.
    pub fn guess(headers: &[String]) -> Self {
        let pick = |needle: &str| guess_column(headers, needle).map(str::to_string);
        Self {
            url: pick("url"),
            device: pick("device"),
            country: pick("country"),
            date: pick("date"),
            query: pick("query"),
            clicks: pick("clicks"),
            impressions: pick("impressions"),
            breakdown: Vec::new(),
        }
    }

    /// Layer `other` on top of `self`: any role set in `other` wins, and a
    /// non-empty breakdown list in `other` replaces this one.
    pub fn overlay(self, other: PartialRoles) -> Self {
        Self {
            url: other.url.or(self.url),
            device: other.device.or(self.device),
            country: other.country.or(self.country),
            date: other.date.or(self.date),
            query: other.query.or(self.query),
            clicks: other.clicks.or(self.clicks),
            impressions: other.impressions.or(self.impressions),
            breakdown: if other.breakdown.is_empty() {
                self.breakdown
            } else {
                other.breakdown
            },
        }
    }

    /// Turn into a full binding, failing on the first unset mandatory role.
    pub fn resolve(self) -> Result<ColumnRoles> {
        fn required(value: Option<String>, role: &str) -> Result<String> {
            value.ok_or_else(|| {
                ClickshareError::Config(format!(
                    "No column bound for '{}' and none could be guessed",
                    role
                ))
            })
        }

        Ok(ColumnRoles {
            url: required(self.url, "url")?,
            device: required(self.device, "device")?,
            country: required(self.country, "country")?,
            clicks: required(self.clicks, "clicks")?,
            date: self.date,
            query: self.query,
            impressions: self.impressions,
            breakdown: self.breakdown,
        })
    }
}

impl From<ColumnRoles> for PartialRoles {
    fn from(roles: ColumnRoles) -> Self {
        Self {
            url: Some(roles.url),
            device: Some(roles.device),
            country: Some(roles.country),
            date: roles.date,
            query: roles.query,
            clicks: Some(roles.clicks),
            impressions: roles.impressions,
            breakdown: roles.breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_guess_column_case_insensitive() {
        let h = headers(&["Landing Page URL", "deviceCategory", "Clicks"]);
        assert_eq!(guess_column(&h, "url"), Some("Landing Page URL"));
        assert_eq!(guess_column(&h, "DEVICE"), Some("deviceCategory"));
        assert_eq!(guess_column(&h, "country"), None);
    }

    #[test]
    fn test_guess_column_takes_first_match() {
        let h = headers(&["Clicks (GSC)", "Clicks (Ads)"]);
        assert_eq!(guess_column(&h, "clicks"), Some("Clicks (GSC)"));
    }

    #[test]
    fn test_guess_all_roles() {
        let h = headers(&[
            "url",
            "device",
            "country",
            "date",
            "query",
            "clicks",
            "impressions",
            "sessions",
        ]);
        let guess = PartialRoles::guess(&h);

        assert_eq!(guess.url.as_deref(), Some("url"));
        assert_eq!(guess.impressions.as_deref(), Some("impressions"));
        assert!(guess.breakdown.is_empty());
    }

    #[test]
    fn test_overlay_prefers_explicit_roles() {
        let guessed = PartialRoles {
            url: Some("url".to_string()),
            clicks: Some("clicks".to_string()),
            breakdown: vec!["sessions".to_string()],
            ..PartialRoles::default()
        };
        let explicit = PartialRoles {
            url: Some("page".to_string()),
            ..PartialRoles::default()
        };

        let merged = guessed.overlay(explicit);
        assert_eq!(merged.url.as_deref(), Some("page"));
        assert_eq!(merged.clicks.as_deref(), Some("clicks"));
        assert_eq!(merged.breakdown, vec!["sessions"]);
    }

    #[test]
    fn test_resolve_reports_missing_role() {
        let partial = PartialRoles {
            url: Some("url".to_string()),
            device: Some("device".to_string()),
            country: Some("country".to_string()),
            ..PartialRoles::default()
        };
        let err = partial.resolve().unwrap_err();
        assert!(err.to_string().contains("'clicks'"));
    }

    #[test]
    fn test_from_roles_round_trip() {
        let roles = ColumnRoles::new("u", "d", "c", "k").with_query("q");
        let back = PartialRoles::from(roles.clone()).resolve().unwrap();
        assert_eq!(back, roles);
    }
}
