//! Package metadata as returned by a repository, and parent merging.

use crate::model::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Interpolation passes before giving up on nested `${...}` references.
const MAX_INTERPOLATION_PASSES: usize = 8;

/// Scopes that are not visible to consumers of a package.
const NON_TRANSITIVE_SCOPES: &[&str] = &["test", "provided", "system"];

/// A dependency as declared in package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    pub name: String,
    /// Raw version constraint. Empty when the declaration left it to defaults.
    pub constraint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl DeclaredDependency {
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
            scope: None,
            optional: false,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Whether consumers of the declaring package inherit this dependency.
    #[must_use]
    pub fn is_transitive(&self) -> bool {
        !self.optional
            && !self
                .scope
                .as_deref()
                .is_some_and(|scope| NON_TRANSITIVE_SCOPES.contains(&scope))
    }

    /// The coordinate this declaration asks for.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.name.clone(), self.constraint.clone())
    }
}

/// Metadata of one package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Concrete coordinate of this package.
    pub coordinate: Coordinate,
    /// Parent whose metadata is inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Coordinate>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Requirement defaults: versions and scopes for dependencies that omit them.
    #[serde(default)]
    pub managed: Vec<DeclaredDependency>,
    /// Declared dependencies, in declaration order.
    #[serde(default)]
    pub requires: Vec<DeclaredDependency>,
}

impl PackageMetadata {
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            parent: None,
            properties: BTreeMap::new(),
            managed: Vec::new(),
            requires: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Coordinate) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_requires(mut self, requires: Vec<DeclaredDependency>) -> Self {
        self.requires = requires;
        self
    }

    #[must_use]
    pub fn with_managed(mut self, managed: Vec<DeclaredDependency>) -> Self {
        self.managed = managed;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Merge inherited metadata from a resolved parent. Values declared here win.
    ///
    /// Properties and requirement defaults fill gaps by key/name. Parent
    /// dependencies are inherited after this package's own, unless this
    /// package already declares the same name.
    pub fn merge_parent(&mut self, parent: &PackageMetadata) {
        for (key, value) in &parent.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        for managed in &parent.managed {
            if !self.managed.iter().any(|m| m.name == managed.name) {
                self.managed.push(managed.clone());
            }
        }

        for inherited in &parent.requires {
            if !self.requires.iter().any(|r| r.name == inherited.name) {
                self.requires.push(inherited.clone());
            }
        }

        let parent_coord = &parent.coordinate;
        self.properties
            .entry("project.parent.version".to_string())
            .or_insert_with(|| parent_coord.version.clone());
        if let Some((group, artifact)) = parent_coord.name.split_once(':') {
            self.properties
                .entry("project.parent.groupId".to_string())
                .or_insert_with(|| group.to_string());
            self.properties
                .entry("project.parent.artifactId".to_string())
                .or_insert_with(|| artifact.to_string());
        }
    }

    /// Interpolate `${...}` references and apply requirement defaults.
    ///
    /// Run once after all parents have been merged.
    pub fn finalize(&mut self) {
        let context = self.interpolation_context();

        for managed in &mut self.managed {
            managed.name = interpolate(&managed.name, &context);
            managed.constraint = interpolate(&managed.constraint, &context);
        }

        for dep in &mut self.requires {
            dep.name = interpolate(&dep.name, &context);
            dep.constraint = interpolate(&dep.constraint, &context);
            if let Some(defaults) = self.managed.iter().find(|m| m.name == dep.name) {
                if dep.constraint.is_empty() {
                    dep.constraint.clone_from(&defaults.constraint);
                }
                if dep.scope.is_none() {
                    dep.scope.clone_from(&defaults.scope);
                }
            }
        }
    }

    fn interpolation_context(&self) -> BTreeMap<String, String> {
        let mut context = self.properties.clone();
        let version = self.coordinate.version.clone();
        context.insert("project.version".to_string(), version.clone());
        context.insert("pom.version".to_string(), version.clone());
        context.insert("version".to_string(), version);
        if let Some((group, artifact)) = self.coordinate.name.split_once(':') {
            context.insert("project.groupId".to_string(), group.to_string());
            context.insert("pom.groupId".to_string(), group.to_string());
            context.insert("project.artifactId".to_string(), artifact.to_string());
        }
        context
    }
}

/// Replace `${key}` references from `context`, following nested references a
/// bounded number of times. Unknown references are left in place.
#[must_use]
pub fn interpolate(input: &str, context: &BTreeMap<String, String>) -> String {
    let mut current = input.to_string();
    for _ in 0..MAX_INTERPOLATION_PASSES {
        if !current.contains("${") {
            break;
        }
        let next = interpolate_once(&current, context);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn interpolate_once(input: &str, context: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match context.get(key) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("${");
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parent_requirements_inherited() {
        let parent = PackageMetadata::new(Coordinate::new("g:y", "2.0"))
            .with_requires(vec![DeclaredDependency::new("g:z", "1.0")]);
        let mut child = PackageMetadata::new(Coordinate::new("g:x", "1.0"))
            .with_parent(parent.coordinate.clone());

        child.merge_parent(&parent);
        child.finalize();

        assert_eq!(child.requires, vec![DeclaredDependency::new("g:z", "1.0")]);
    }

    #[test]
    fn test_child_requirement_wins() {
        let parent = PackageMetadata::new(Coordinate::new("g:y", "2.0"))
            .with_requires(vec![DeclaredDependency::new("g:z", "1.0")]);
        let mut child = PackageMetadata::new(Coordinate::new("g:x", "1.0"))
            .with_requires(vec![DeclaredDependency::new("g:z", "3.0")]);

        child.merge_parent(&parent);
        assert_eq!(child.requires.len(), 1);
        assert_eq!(child.requires[0].constraint, "3.0");
    }

    #[test]
    fn test_managed_defaults_fill_missing_version_and_scope() {
        let parent = PackageMetadata::new(Coordinate::new("g:y", "2.0")).with_managed(vec![
            DeclaredDependency::new("g:lib", "4.1").with_scope("test"),
        ]);
        let mut child = PackageMetadata::new(Coordinate::new("g:x", "1.0"))
            .with_requires(vec![DeclaredDependency::new("g:lib", "")]);

        child.merge_parent(&parent);
        child.finalize();

        assert_eq!(child.requires[0].constraint, "4.1");
        assert_eq!(child.requires[0].scope.as_deref(), Some("test"));
    }

    #[test]
    fn test_child_managed_wins() {
        let parent = PackageMetadata::new(Coordinate::new("g:y", "2.0"))
            .with_managed(vec![DeclaredDependency::new("g:lib", "4.1")]);
        let mut child = PackageMetadata::new(Coordinate::new("g:x", "1.0"))
            .with_managed(vec![DeclaredDependency::new("g:lib", "5.0")])
            .with_requires(vec![DeclaredDependency::new("g:lib", "")]);

        child.merge_parent(&parent);
        child.finalize();
        assert_eq!(child.requires[0].constraint, "5.0");
    }

    #[test]
    fn test_properties_merge_child_wins() {
        let parent = PackageMetadata::new(Coordinate::new("g:y", "2.0"))
            .with_property("lib.version", "1.0")
            .with_property("other", "x");
        let mut child = PackageMetadata::new(Coordinate::new("g:x", "1.0"))
            .with_property("lib.version", "2.0")
            .with_requires(vec![DeclaredDependency::new("g:lib", "${lib.version}")]);

        child.merge_parent(&parent);
        child.finalize();

        assert_eq!(child.properties["other"], "x");
        assert_eq!(child.requires[0].constraint, "2.0");
        assert_eq!(child.properties["project.parent.version"], "2.0");
        assert_eq!(child.properties["project.parent.groupId"], "g");
    }

    #[test]
    fn test_project_version_interpolation() {
        let mut meta = PackageMetadata::new(Coordinate::new("org.acme:core", "3.1.4"))
            .with_requires(vec![DeclaredDependency::new(
                "${project.groupId}:util",
                "${project.version}",
            )]);
        meta.finalize();
        assert_eq!(meta.requires[0].name, "org.acme:util");
        assert_eq!(meta.requires[0].constraint, "3.1.4");
    }

    #[test]
    fn test_interpolate_nested() {
        let context = ctx(&[("a", "${b}"), ("b", "1.2")]);
        assert_eq!(interpolate("v${a}", &context), "v1.2");
    }

    #[test]
    fn test_interpolate_unknown_left_in_place() {
        assert_eq!(interpolate("${missing}-x", &ctx(&[])), "${missing}-x");
    }

    #[test]
    fn test_interpolate_self_reference_terminates() {
        let context = ctx(&[("loop", "${loop}")]);
        assert_eq!(interpolate("${loop}", &context), "${loop}");
    }

    #[test]
    fn test_interpolate_unterminated() {
        assert_eq!(interpolate("1.${oops", &ctx(&[("oops", "x")])), "1.${oops");
    }

    #[test]
    fn test_transitive_visibility() {
        assert!(DeclaredDependency::new("a", "1").is_transitive());
        assert!(DeclaredDependency::new("a", "1")
            .with_scope("compile")
            .is_transitive());
        assert!(DeclaredDependency::new("a", "1")
            .with_scope("runtime")
            .is_transitive());
        assert!(!DeclaredDependency::new("a", "1")
            .with_scope("test")
            .is_transitive());
        assert!(!DeclaredDependency::new("a", "1")
            .with_scope("provided")
            .is_transitive());
        assert!(!DeclaredDependency::new("a", "1")
            .with_optional(true)
            .is_transitive());
    }
}
