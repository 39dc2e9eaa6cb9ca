//! Resolved-package table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resolved package as recorded by a lockfile or an installed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    /// Resolved version. Empty when the source did not pin one.
    pub version: String,
    /// Names of the packages this one requires, in declaration order.
    pub requires: Vec<String>,
}

impl PackageRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, requires: Vec<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            requires,
        }
    }
}

/// Name-keyed table of resolved packages.
#[derive(Debug, Clone, Default)]
pub struct PackageTable {
    by_name: HashMap<String, PackageRecord>,
}

impl PackageTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its name is already present.
    ///
    /// Returns `true` if the record was inserted.
    pub fn insert_if_absent(&mut self, record: PackageRecord) -> bool {
        if self.by_name.contains_key(&record.name) {
            return false;
        }
        self.by_name.insert(record.name.clone(), record);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Build the table from lockfile records and installed-directory records.
///
/// Lockfile records go in first; directory records only fill names the
/// lockfile did not cover. Within each source the first record for a name wins.
pub fn build_table(
    lockfile: impl IntoIterator<Item = PackageRecord>,
    installed: impl IntoIterator<Item = PackageRecord>,
) -> PackageTable {
    let mut table = PackageTable::new();
    for record in lockfile.into_iter().chain(installed) {
        if record.name.is_empty() {
            continue;
        }
        table.insert_if_absent(record);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockfile_wins_over_installed() {
        let table = build_table(
            vec![PackageRecord::new("acme/log", "1.2.0", vec![])],
            vec![
                PackageRecord::new("acme/log", "9.9.9", vec!["acme/extra".into()]),
                PackageRecord::new("acme/http", "2.0.0", vec![]),
            ],
        );

        assert_eq!(table.len(), 2);
        let log = table.get("acme/log").unwrap();
        assert_eq!(log.version, "1.2.0");
        assert!(log.requires.is_empty());
        assert_eq!(table.get("acme/http").unwrap().version, "2.0.0");
    }

    #[test]
    fn test_first_seen_wins_within_source() {
        let table = build_table(
            vec![
                PackageRecord::new("acme/log", "1.0.0", vec![]),
                PackageRecord::new("acme/log", "2.0.0", vec![]),
            ],
            Vec::new(),
        );
        assert_eq!(table.get("acme/log").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_empty_inputs() {
        let table = build_table(Vec::new(), Vec::new());
        assert!(table.is_empty());
    }

    #[test]
    fn test_nameless_records_are_skipped() {
        let table = build_table(vec![PackageRecord::new("", "1.0.0", vec![])], Vec::new());
        assert!(table.is_empty());
    }
}
