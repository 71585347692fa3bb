//! Column resolution across heterogeneous yearly headers.
//!
//! Cost report exports drift from year to year in casing, punctuation and
//! wording. A [`ColumnMap`] indexes one table's labels by their normalized key
//! so that human-readable variable names can be located regardless of that
//! drift.
//!
//! Resolution of a wanted name tries an exact key match first and then falls
//! back to the first key (in header order) that contains the wanted key. The
//! substring path can produce false positives when names share a common
//! fragment; callers receive a [`ResolutionKind`] so that the path taken is
//! auditable. Drop lists only ever match exactly.

use std::fmt;

use serde::Serialize;

use crate::data::normalize_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Exact,
    Substring,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::Exact => write!(f, "exact"),
            ResolutionKind::Substring => write!(f, "substring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub label: String,
    pub kind: ResolutionKind,
}

/// Normalized key to first-seen original label, in header order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    /// Indexes `labels` in order. When two labels share a key the earlier one
    /// is kept and later ones are ignored.
    pub fn build<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut entries: Vec<(String, String)> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            let key = normalize_label(label);
            if !entries.iter().any(|(existing, _)| *existing == key) {
                entries.push((key, label.to_string()));
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, label)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(key, label)| (key.as_str(), label.as_str()))
    }

    /// Locates `wanted` among every indexed label.
    pub fn resolve(&self, wanted: &str) -> Option<Resolution> {
        self.resolve_where(wanted, |_| true)
    }

    /// Locates `wanted` among indexed labels for which `present` holds.
    ///
    /// A label filtered out by `present` is skipped on both paths, so a wanted
    /// name whose exact column was dropped may still resolve by substring to a
    /// surviving column.
    pub fn resolve_where<F>(&self, wanted: &str, present: F) -> Option<Resolution>
    where
        F: Fn(&str) -> bool,
    {
        let wanted_key = normalize_label(wanted);
        if let Some(label) = self.get(&wanted_key)
            && present(label)
        {
            return Some(Resolution {
                label: label.to_string(),
                kind: ResolutionKind::Exact,
            });
        }
        self.entries
            .iter()
            .find(|(key, label)| key.contains(wanted_key.as_str()) && present(label))
            .map(|(_, label)| Resolution {
                label: label.clone(),
                kind: ResolutionKind::Substring,
            })
    }

    /// Labels whose key exactly equals the key of one of `names`, in header
    /// order.
    pub fn resolve_drop_set<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let keys = names
            .iter()
            .map(|name| normalize_label(name.as_ref()))
            .collect::<Vec<_>>();
        self.entries
            .iter()
            .filter(|(key, _)| keys.contains(key))
            .map(|(_, label)| label.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_keeps_first_seen_label_for_shared_key() {
        let map = ColumnMap::build(&["Net Income", "net   income", "Other"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("net income"), Some("Net Income"));
        let keys = map.iter().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(keys, vec!["net income", "other"]);
    }

    #[test]
    fn resolve_prefers_exact_match_over_earlier_substring() {
        let map = ColumnMap::build(&["Net Income from service to patients", "NET_INCOME"]);
        let resolved = map.resolve("Net Income").unwrap();
        assert_eq!(resolved.label, "NET_INCOME");
        assert_eq!(resolved.kind, ResolutionKind::Exact);
    }

    #[test]
    fn resolve_falls_back_to_first_containing_key() {
        let map = ColumnMap::build(&["Provider CCN", "Prepaid expenses total", "Prepaid expenses other"]);
        let resolved = map.resolve("Prepaid Expenses").unwrap();
        assert_eq!(resolved.label, "Prepaid expenses total");
        assert_eq!(resolved.kind, ResolutionKind::Substring);
        assert!(map.resolve("Total Assets").is_none());
    }

    #[test]
    fn resolve_where_skips_labels_that_are_not_present() {
        let map = ColumnMap::build(&["Net Income", "Net Income from service to patients"]);
        let resolved = map
            .resolve_where("Net Income", |label| label != "Net Income")
            .unwrap();
        assert_eq!(resolved.label, "Net Income from service to patients");
        assert_eq!(resolved.kind, ResolutionKind::Substring);
        assert!(map.resolve_where("Net Income", |_| false).is_none());
    }

    #[test]
    fn drop_set_matches_exactly_without_substring_fallback() {
        let map = ColumnMap::build(&["City", "City Code", "zip_code", "Total Costs"]);
        let dropped = map.resolve_drop_set(&["city", "Zip Code", "Costs"]);
        assert_eq!(dropped, vec!["City".to_string(), "zip_code".to_string()]);
    }
}
