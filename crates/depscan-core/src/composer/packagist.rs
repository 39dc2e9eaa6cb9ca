//! Packagist metadata repository (`/p2/{vendor}/{package}.json`).

use crate::error::Error;
use crate::model::Coordinate;
use crate::remote::error::ResolveError;
use crate::remote::http::{get_text, join, parse_base_url};
use crate::remote::metadata::{DeclaredDependency, PackageMetadata};
use crate::remote::repository::Repository;
use crate::remote::select::select_highest;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

/// Marker removing an inherited field in minified metadata.
const UNSET: &str = "__unset";

type VersionEntry = Map<String, Value>;

/// Composer package names always have a vendor part. Anything else
/// (`php`, `ext-*`, `lib-*`, `composer-plugin-api`) is a platform requirement.
#[must_use]
pub fn is_installable_name(name: &str) -> bool {
    name.split_once('/')
        .is_some_and(|(vendor, package)| !vendor.is_empty() && !package.is_empty())
}

/// A Packagist-compatible metadata repository.
#[derive(Debug, Clone)]
pub struct PackagistRepository {
    base_url: Url,
    http: Client,
}

impl PackagistRepository {
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: &str, http: Client) -> Result<Self, Error> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http,
        })
    }
}

#[async_trait]
impl Repository for PackagistRepository {
    fn name(&self) -> &str {
        self.base_url.as_str()
    }

    async fn fetch(&self, coordinate: &Coordinate) -> Result<PackageMetadata, ResolveError> {
        if !is_installable_name(&coordinate.name) {
            return Err(ResolveError::malformed(
                coordinate.to_string(),
                "Not a vendor/package name",
            ));
        }

        let url = join(&self.base_url, &format!("p2/{}.json", coordinate.name))?;
        let Some(body) = get_text(&self.http, &url).await? else {
            return Err(ResolveError::not_found(coordinate));
        };

        let entries = parse_versions(&body, &coordinate.name)
            .map_err(|e| ResolveError::malformed(url.as_str(), e))?;
        metadata_for(coordinate, &entries)
    }
}

/// Parse a `/p2/` response into the full version entries of `name`.
fn parse_versions(body: &str, name: &str) -> Result<Vec<VersionEntry>, String> {
    let mut doc: Value = serde_json::from_str(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    let minified = doc.get("minified").and_then(Value::as_str).is_some();

    let entries = match doc
        .get_mut("packages")
        .and_then(|p| p.get_mut(name))
        .map(Value::take)
    {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(format!("Versions of {name} are not a list")),
        None => return Err(format!("Response has no entry for {name}")),
    };

    let entries: Vec<VersionEntry> = entries
        .into_iter()
        .filter_map(|e| match e {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    Ok(if minified {
        expand_minified(entries)
    } else {
        entries
    })
}

/// Undo Composer 2 minification: each entry only lists what changed since
/// the previous one, with `"__unset"` removing a field.
fn expand_minified(entries: Vec<VersionEntry>) -> Vec<VersionEntry> {
    let mut expanded = Vec::with_capacity(entries.len());
    let mut previous = VersionEntry::new();

    for entry in entries {
        let mut current = previous.clone();
        for (key, value) in entry {
            if value.as_str() == Some(UNSET) {
                current.remove(&key);
            } else {
                current.insert(key, value);
            }
        }
        expanded.push(current.clone());
        previous = current;
    }

    expanded
}

fn metadata_for(
    coordinate: &Coordinate,
    entries: &[VersionEntry],
) -> Result<PackageMetadata, ResolveError> {
    let versions = entries
        .iter()
        .filter_map(|e| e.get("version").and_then(Value::as_str));

    let selected = select_highest(&coordinate.version, versions)
        .map_err(|e| ResolveError::malformed(coordinate.to_string(), e))?
        .ok_or_else(|| ResolveError::not_found(coordinate))?;

    let entry = entries
        .iter()
        .find(|e| e.get("version").and_then(Value::as_str) == Some(selected))
        .ok_or_else(|| ResolveError::not_found(coordinate))?;

    let requires = entry
        .get("require")
        .and_then(Value::as_object)
        .map(|require| {
            require
                .iter()
                .filter(|(name, _)| is_installable_name(name))
                .map(|(name, constraint)| {
                    DeclaredDependency::new(name.clone(), constraint.as_str().unwrap_or_default())
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(PackageMetadata::new(Coordinate::new(coordinate.name.clone(), selected))
        .with_requires(requires))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIFIED: &str = r#"{
        "minified": "composer/2.0",
        "packages": {
            "acme/log": [
                {"name": "acme/log", "version": "3.1.0", "require": {"php": ">=8.1", "psr/log": "^3.0"}},
                {"version": "3.0.0"},
                {"version": "2.0.0", "require": "__unset"},
                {"version": "1.0.0", "require": {"psr/log": "^1.0"}}
            ]
        }
    }"#;

    #[test]
    fn test_installable_names() {
        assert!(is_installable_name("acme/log"));
        assert!(!is_installable_name("php"));
        assert!(!is_installable_name("ext-json"));
        assert!(!is_installable_name("lib-icu"));
        assert!(!is_installable_name("/x"));
    }

    #[test]
    fn test_expand_minified_inherits_and_unsets() {
        let entries = parse_versions(MINIFIED, "acme/log").unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1]["name"], "acme/log");
        assert_eq!(entries[1]["require"]["psr/log"], "^3.0");
        assert!(entries[2].get("require").is_none());
        assert_eq!(entries[3]["require"]["psr/log"], "^1.0");
    }

    #[test]
    fn test_metadata_for_constraint() {
        let entries = parse_versions(MINIFIED, "acme/log").unwrap();

        let meta = metadata_for(&Coordinate::new("acme/log", "^3.0"), &entries).unwrap();
        assert_eq!(meta.coordinate, Coordinate::new("acme/log", "3.1.0"));
        assert_eq!(meta.requires, vec![DeclaredDependency::new("psr/log", "^3.0")]);

        let meta = metadata_for(&Coordinate::new("acme/log", "^2.0"), &entries).unwrap();
        assert!(meta.requires.is_empty());
    }

    #[test]
    fn test_metadata_for_no_match() {
        let entries = parse_versions(MINIFIED, "acme/log").unwrap();
        assert!(matches!(
            metadata_for(&Coordinate::new("acme/log", "^9.0"), &entries),
            Err(ResolveError::NotFound { .. })
        ));
        assert!(matches!(
            metadata_for(&Coordinate::new("acme/log", "dev-main"), &entries),
            Err(ResolveError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unminified_entries_kept_as_is() {
        let body = r#"{"packages": {"a/b": [
            {"version": "2.0.0", "require": {"c/d": "^1"}},
            {"version": "1.0.0"}
        ]}}"#;
        let entries = parse_versions(body, "a/b").unwrap();
        assert!(entries[1].get("require").is_none());
    }

    #[test]
    fn test_bad_documents() {
        assert!(parse_versions("nope", "a/b").is_err());
        assert!(parse_versions(r#"{"packages": {}}"#, "a/b").is_err());
        assert!(parse_versions(r#"{"packages": {"a/b": {}}}"#, "a/b").is_err());
    }
}
