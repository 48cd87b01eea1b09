//! Attribute / baseline / target selection for bias comparisons.
//!
//! The selection always resolves against the category catalog of the loaded
//! metrics snapshot. `reconcile` is the single update rule that runs after
//! every user change or catalog reload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{AttributeMeta, MetricsSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub attribute: Option<String>,
    pub baseline: Option<String>,
    pub targets: Vec<String>,
}

/// Attributes and their categories available for selection.
pub trait Catalog {
    fn attributes(&self) -> Vec<&str>;
    fn meta(&self, attribute: &str) -> Option<&AttributeMeta>;
}

impl Catalog for BTreeMap<String, AttributeMeta> {
    fn attributes(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn meta(&self, attribute: &str) -> Option<&AttributeMeta> {
        self.get(attribute)
    }
}

impl Catalog for MetricsSnapshot {
    fn attributes(&self) -> Vec<&str> {
        self.attributes.attributes()
    }

    fn meta(&self, attribute: &str) -> Option<&AttributeMeta> {
        self.attributes.get(attribute)
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changing the attribute invalidates baseline and targets.
    pub fn set_attribute(&mut self, attribute: impl Into<String>) {
        let attribute = attribute.into();
        if self.attribute.as_deref() == Some(attribute.as_str()) {
            return;
        }
        self.attribute = Some(attribute);
        self.baseline = None;
        self.targets.clear();
    }

    /// Keeps targets, minus the new baseline.
    pub fn set_baseline(&mut self, baseline: impl Into<String>) {
        let baseline = baseline.into();
        self.targets.retain(|t| *t != baseline);
        self.baseline = Some(baseline);
    }

    /// Adds or removes a target. The baseline can never become a target.
    pub fn toggle_target(&mut self, category: impl Into<String>) {
        let category = category.into();
        if self.baseline.as_deref() == Some(category.as_str()) {
            return;
        }
        if let Some(pos) = self.targets.iter().position(|t| *t == category) {
            self.targets.remove(pos);
        } else {
            self.targets.push(category);
        }
    }

    /// Resolves every field against `catalog`.
    ///
    /// Unset or unknown attributes fall back to the first attribute; the
    /// baseline falls back to the attribute's default, then its first
    /// category; invalid targets are dropped and an empty target set is
    /// re-derived as the first category that is not the baseline.
    pub fn reconcile<C: Catalog + ?Sized>(&mut self, catalog: &C) {
        let attributes = catalog.attributes();
        let attribute_valid = self
            .attribute
            .as_deref()
            .is_some_and(|a| attributes.contains(&a));
        if !attribute_valid {
            match attributes.first() {
                Some(first) => {
                    let first = first.to_string();
                    self.attribute = Some(first);
                    self.baseline = None;
                    self.targets.clear();
                }
                None => {
                    *self = Selection::default();
                    return;
                }
            }
        }

        let Some(meta) = self.attribute.as_deref().and_then(|a| catalog.meta(a)) else {
            return;
        };
        let categories = &meta.categories;

        let baseline_valid = self
            .baseline
            .as_ref()
            .is_some_and(|b| categories.contains(b));
        if !baseline_valid {
            self.baseline = meta
                .baseline
                .clone()
                .filter(|b| categories.contains(b))
                .or_else(|| categories.first().cloned());
        }

        let baseline = self.baseline.clone();
        self.targets
            .retain(|t| categories.contains(t) && Some(t) != baseline.as_ref());
        let mut seen = Vec::with_capacity(self.targets.len());
        self.targets.retain(|t| {
            if seen.contains(t) {
                false
            } else {
                seen.push(t.clone());
                true
            }
        });

        if self.targets.is_empty() {
            if let Some(first) = categories.iter().find(|c| Some(*c) != baseline.as_ref()) {
                self.targets.push(first.clone());
            }
        }
    }

    /// Categories available as targets under the current baseline.
    pub fn target_options<'a, C: Catalog + ?Sized>(&self, catalog: &'a C) -> Vec<&'a str> {
        let Some(meta) = self.attribute.as_deref().and_then(|a| catalog.meta(a)) else {
            return vec![];
        };
        meta.categories
            .iter()
            .map(String::as_str)
            .filter(|c| Some(*c) != self.baseline.as_deref())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.attribute.is_some() && self.baseline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> BTreeMap<String, AttributeMeta> {
        let mut c = BTreeMap::new();
        c.insert(
            "gender".to_string(),
            AttributeMeta {
                categories: vec!["male".into(), "female".into(), "diverse".into()],
                baseline: Some("male".into()),
            },
        );
        c.insert(
            "age".to_string(),
            AttributeMeta {
                categories: vec!["young".into(), "middle".into(), "old".into()],
                baseline: Some("middle".into()),
            },
        );
        c.insert(
            "solo".to_string(),
            AttributeMeta {
                categories: vec!["only".into()],
                baseline: None,
            },
        );
        c
    }

    #[test]
    fn test_gender_male_defaults_to_female() {
        let mut s = Selection::new();
        s.set_attribute("gender");
        s.set_baseline("male");
        s.reconcile(&catalog());
        assert_eq!(s.attribute.as_deref(), Some("gender"));
        assert_eq!(s.baseline.as_deref(), Some("male"));
        assert_eq!(s.targets, vec!["female".to_string()]);
    }

    #[test]
    fn test_initial_load_picks_first_attribute_and_default_baseline() {
        let mut s = Selection::new();
        assert!(!s.is_complete());
        s.reconcile(&catalog());
        assert_eq!(s.attribute.as_deref(), Some("age"));
        assert_eq!(s.baseline.as_deref(), Some("middle"));
        assert_eq!(s.targets, vec!["young".to_string()]);
        assert!(s.is_complete());
    }

    #[test]
    fn test_attribute_change_clears_baseline_and_targets() {
        let mut s = Selection::new();
        s.set_attribute("gender");
        s.reconcile(&catalog());
        s.toggle_target("diverse");
        assert_eq!(s.targets.len(), 2);

        s.set_attribute("age");
        assert_eq!(s.baseline, None);
        assert!(s.targets.is_empty());

        s.reconcile(&catalog());
        assert_eq!(s.baseline.as_deref(), Some("middle"));
        assert_eq!(s.targets, vec!["young".to_string()]);
    }

    #[test]
    fn test_baseline_change_removes_it_from_targets() {
        let mut s = Selection::new();
        s.set_attribute("gender");
        s.reconcile(&catalog());
        s.toggle_target("diverse");
        assert_eq!(s.targets, vec!["female".to_string(), "diverse".to_string()]);

        s.set_baseline("female");
        assert_eq!(s.targets, vec!["diverse".to_string()]);

        s.set_baseline("diverse");
        assert!(s.targets.is_empty());
        s.reconcile(&catalog());
        assert_eq!(s.targets, vec!["male".to_string()]);
    }

    #[test]
    fn test_baseline_is_never_a_target() {
        let mut s = Selection::new();
        s.set_attribute("gender");
        s.reconcile(&catalog());
        s.toggle_target("male");
        assert!(!s.targets.contains(&"male".to_string()));
        assert_eq!(s.targets, vec!["female".to_string()]);
    }

    #[test]
    fn test_invalid_values_are_re_derived() {
        let mut s = Selection {
            attribute: Some("gender".into()),
            baseline: Some("unknown".into()),
            targets: vec!["ghost".into(), "female".into(), "female".into()],
        };
        s.reconcile(&catalog());
        assert_eq!(s.baseline.as_deref(), Some("male"));
        assert_eq!(s.targets, vec!["female".to_string()]);

        let mut s = Selection {
            attribute: Some("removed".into()),
            baseline: Some("x".into()),
            targets: vec!["y".into()],
        };
        s.reconcile(&catalog());
        assert_eq!(s.attribute.as_deref(), Some("age"));
        assert_eq!(s.targets, vec!["young".to_string()]);
    }

    #[test]
    fn test_single_category_leaves_targets_empty() {
        let mut s = Selection::new();
        s.set_attribute("solo");
        s.reconcile(&catalog());
        assert_eq!(s.baseline.as_deref(), Some("only"));
        assert!(s.targets.is_empty());
    }

    #[test]
    fn test_empty_catalog_resets() {
        let mut s = Selection {
            attribute: Some("gender".into()),
            baseline: Some("male".into()),
            targets: vec!["female".into()],
        };
        s.reconcile(&BTreeMap::<String, AttributeMeta>::new());
        assert_eq!(s, Selection::default());
    }

    #[test]
    fn test_target_options_exclude_baseline() {
        let mut s = Selection::new();
        s.set_attribute("gender");
        s.reconcile(&catalog());
        assert_eq!(s.target_options(&catalog()), vec!["female", "diverse"]);
    }
}
