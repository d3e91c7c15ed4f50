//! Lookup tables for the soft foreign-key check.

use std::collections::{HashMap, HashSet};

/// Rows of referenced resources, keyed by resource name. Each row maps a
/// field name to the canonical text of its cast value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    tables: HashMap<String, Vec<HashMap<String, String>>>,
}

impl Relations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: impl Into<String>, rows: Vec<HashMap<String, String>>) {
        self.tables.insert(resource.into(), rows);
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.tables.contains_key(resource)
    }

    pub fn rows(&self, resource: &str) -> Option<&[HashMap<String, String>]> {
        self.tables.get(resource).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Distinct tuples of `fields` in `resource`, or `None` when the
    /// resource is not part of the lookup. Rows lacking one of the fields
    /// contribute nothing.
    pub(crate) fn key_set(&self, resource: &str, fields: &[&str]) -> Option<HashSet<Vec<String>>> {
        let rows = self.tables.get(resource)?;
        Some(
            rows.iter()
                .filter_map(|row| {
                    fields
                        .iter()
                        .map(|f| row.get(*f).cloned())
                        .collect::<Option<Vec<_>>>()
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn key_set_collects_tuples() {
        let mut relations = Relations::new();
        relations.insert(
            "organization",
            vec![row(&[("id", "1"), ("name", "a")]), row(&[("id", "2")])],
        );
        let keys = relations.key_set("organization", &["id"]).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&vec!["1".to_string()]));

        let pairs = relations.key_set("organization", &["id", "name"]).unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn unknown_resource_has_no_key_set() {
        let relations = Relations::new();
        assert!(relations.is_empty());
        assert!(relations.key_set("program", &["id"]).is_none());
        assert!(!relations.contains("program"));
    }
}
