//! Data model shared by the lockfile and remote strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of a package: name plus version.
///
/// Two versions of the same name are distinct coordinates. For remote
/// requests the version may still be a constraint (`^2.0`, `[1.0,2.0)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// Package name (e.g., "monolog/monolog" or "org.slf4j:slf4j-api").
    pub name: String,
    /// Package version or version constraint.
    pub version: String,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A declared top-level requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    /// Raw constraint: a concrete version, a range, or a wildcard.
    pub constraint: String,
}

impl Requirement {
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

/// A project's own identity and declared requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub requires: Vec<Requirement>,
}

/// One node of the output dependency tree.
///
/// `version` is the resolved version when resolution data exists, otherwise
/// the declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Create a node without children.
    #[must_use]
    pub fn leaf(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path, counting this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .dependencies
            .iter()
            .map(DependencyNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Find a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DependencyNode> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}

/// Package manager that produced a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Composer,
    Maven,
}

impl PackageManager {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Composer => "composer",
            Self::Maven => "maven",
        }
    }
}

/// Source language of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Php,
    Java,
}

impl Language {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Java => "java",
        }
    }
}

/// The resolved dependency forest of one manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub package_manager: PackageManager,
    pub language: Language,
    /// Absolute path to the manifest file.
    pub manifest_path: PathBuf,
    pub name: String,
    pub version: String,
    pub dependencies: Vec<DependencyNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_coordinate_identity() {
        let a = Coordinate::new("acme/log", "1.0.0");
        let b = Coordinate::new("acme/log", "1.0.0");
        let c = Coordinate::new("acme/log", "2.0.0");

        let set: HashSet<Coordinate> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a.to_string(), "acme/log@1.0.0");
    }

    #[test]
    fn test_node_depth() {
        let mut root = DependencyNode::leaf("a", "1");
        assert_eq!(root.depth(), 1);

        let mut b = DependencyNode::leaf("b", "1");
        b.dependencies.push(DependencyNode::leaf("c", "1"));
        root.dependencies.push(b);
        root.dependencies.push(DependencyNode::leaf("d", "1"));
        assert_eq!(root.depth(), 3);
        assert_eq!(root.child("d").map(|n| n.version.as_str()), Some("1"));
    }

    #[test]
    fn test_leaf_serializes_without_children() {
        let json = serde_json::to_value(DependencyNode::leaf("foo/bar", "^2.0")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "foo/bar", "version": "^2.0"}));
    }

    #[test]
    fn test_module_serialization_tags() {
        let module = Module {
            package_manager: PackageManager::Composer,
            language: Language::Php,
            manifest_path: PathBuf::from("/app/composer.json"),
            name: "acme/app".to_string(),
            version: String::new(),
            dependencies: Vec::new(),
        };
        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["package_manager"], "composer");
        assert_eq!(json["language"], "php");
    }
}
