//! Dependency tree assembly from a resolved-package table.

use super::table::{PackageRecord, PackageTable};
use crate::model::{DependencyNode, Requirement};
use std::collections::HashSet;

/// Recursion stops once more than this many names are on the ancestor path,
/// so no path holds more than `MAX_ANCESTORS + 1` distinct names.
pub const MAX_ANCESTORS: usize = 3;

/// Open-ended version wildcard.
const WILDCARD: &str = "*";

/// Names that describe the host runtime rather than installable packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPolicy {
    /// Exact name of the runtime itself (e.g. `php`).
    runtime: Option<String>,
    /// Prefix of runtime extension names (e.g. `ext-`).
    extension_prefix: Option<String>,
}

impl PlatformPolicy {
    /// Composer platform packages: `php` and `ext-*`.
    #[must_use]
    pub fn composer() -> Self {
        Self {
            runtime: Some("php".to_string()),
            extension_prefix: Some("ext-".to_string()),
        }
    }

    /// Prune nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            runtime: None,
            extension_prefix: None,
        }
    }

    /// True if `name` is the runtime or one of its extensions.
    #[must_use]
    pub fn is_platform(&self, name: &str) -> bool {
        self.is_runtime(name) || self.is_extension(name)
    }

    fn is_runtime(&self, name: &str) -> bool {
        self.runtime.as_deref() == Some(name)
    }

    fn is_extension(&self, name: &str) -> bool {
        self.extension_prefix
            .as_deref()
            .is_some_and(|prefix| name.starts_with(prefix))
    }

    /// Decide whether a target is runtime infrastructure to leave out of the tree.
    ///
    /// The runtime is always pruned. An extension is pruned when the constraint
    /// is the open wildcard or the table has no pinned version for it.
    fn prunes(&self, name: &str, constraint: &str, record: Option<&PackageRecord>) -> bool {
        if self.is_runtime(name) {
            return true;
        }
        if !self.is_extension(name) {
            return false;
        }
        let pinned = record.map_or("", |r| r.version.as_str());
        constraint == WILDCARD || pinned.is_empty() || pinned == WILDCARD
    }
}

impl Default for PlatformPolicy {
    fn default() -> Self {
        Self::composer()
    }
}

/// Builds dependency trees out of a resolved-package table.
#[derive(Debug, Clone)]
pub struct LockfileTree<'a> {
    table: &'a PackageTable,
    policy: PlatformPolicy,
}

impl<'a> LockfileTree<'a> {
    /// Create a builder over `table` using Composer platform rules.
    #[must_use]
    pub fn new(table: &'a PackageTable) -> Self {
        Self {
            table,
            policy: PlatformPolicy::default(),
        }
    }

    /// Replace the platform policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PlatformPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build one tree per top-level requirement, dropping pruned ones.
    #[must_use]
    pub fn build_forest(&self, requires: &[Requirement]) -> Vec<DependencyNode> {
        requires
            .iter()
            .filter_map(|req| {
                self.build_dependency_node(&mut HashSet::new(), &req.name, &req.constraint)
            })
            .collect()
    }

    /// Build the subtree for `target`.
    ///
    /// `visited` holds the names on the current ancestor path. It is restored
    /// to its entry state before this returns.
    ///
    /// Returns `None` when the target is already an ancestor, when the path is
    /// at its bound, or when the target is pruned as platform infrastructure.
    pub fn build_dependency_node(
        &self,
        visited: &mut HashSet<String>,
        target: &str,
        constraint: &str,
    ) -> Option<DependencyNode> {
        if visited.contains(target) || visited.len() > MAX_ANCESTORS {
            return None;
        }

        let record = self.table.get(target);
        if self.policy.prunes(target, constraint, record) {
            return None;
        }

        // Unpinned entries carry no resolution data.
        let Some(record) = record.filter(|r| !r.version.is_empty()) else {
            return Some(DependencyNode::leaf(target, constraint));
        };

        visited.insert(target.to_string());
        let dependencies = record
            .requires
            .iter()
            // Transitive constraints are not re-applied; only table versions count.
            .filter_map(|child| self.build_dependency_node(visited, child, ""))
            .collect();
        visited.remove(target);

        Some(DependencyNode {
            name: target.to_string(),
            version: record.version.clone(),
            dependencies,
        })
    }
}
