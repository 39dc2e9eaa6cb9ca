//! `composer.json` reading.

use crate::error::Error;
use crate::lockfile::PackageRecord;
use crate::model::{Manifest, Requirement};
use depscan_util::fs::{read_to_string_limited, MANIFEST_SIZE_LIMIT};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Manifest file name.
pub const MANIFEST_FILE_NAME: &str = "composer.json";

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    require: BTreeMap<String, Value>,
}

/// Parse manifest JSON. Requirements come out sorted by name; a constraint
/// that is not a string is kept as an empty constraint.
///
/// # Errors
/// Returns the JSON error if the text is not a manifest object.
pub fn parse_manifest(json: &str) -> Result<Manifest, serde_json::Error> {
    let raw: RawManifest = serde_json::from_str(json)?;
    Ok(Manifest {
        name: raw.name.unwrap_or_default(),
        version: raw.version.unwrap_or_default(),
        requires: raw
            .require
            .into_iter()
            .map(|(name, constraint)| {
                let constraint = constraint.as_str().unwrap_or_default().to_string();
                Requirement::new(name, constraint)
            })
            .collect(),
    })
}

/// Read and parse a manifest file, refusing files over 4 MiB.
///
/// # Errors
/// Returns `ManifestRead` or `ManifestParse`.
pub fn read_manifest(path: &Path) -> Result<Manifest, Error> {
    let content = read_to_string_limited(path, MANIFEST_SIZE_LIMIT).map_err(|source| {
        Error::ManifestRead {
            path: path.to_path_buf(),
            source,
        }
    })?;
    parse_manifest(&content).map_err(|e| Error::manifest_parse(path, e.to_string()))
}

impl From<Manifest> for PackageRecord {
    /// An installed package described by its own manifest: the requirement
    /// names are its edges.
    fn from(manifest: Manifest) -> Self {
        PackageRecord::new(
            manifest.name,
            manifest.version,
            manifest.requires.into_iter().map(|r| r.name).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(
            r#"{
                "name": "acme/app",
                "version": "1.0.0",
                "require": {
                    "php": ">=8.1",
                    "monolog/monolog": "^3.0",
                    "ext-json": "*"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.name, "acme/app");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(
            manifest.requires,
            vec![
                Requirement::new("ext-json", "*"),
                Requirement::new("monolog/monolog", "^3.0"),
                Requirement::new("php", ">=8.1"),
            ]
        );
    }

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = parse_manifest("{}").unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_non_string_constraint_is_empty() {
        let manifest = parse_manifest(r#"{"require": {"acme/odd": 5}}"#).unwrap();
        assert_eq!(manifest.requires, vec![Requirement::new("acme/odd", "")]);
    }

    #[test]
    fn test_read_manifest_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);

        assert!(matches!(read_manifest(&path), Err(Error::ManifestRead { .. })));

        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(read_manifest(&path), Err(Error::ManifestParse { .. })));
    }

    #[test]
    fn test_manifest_as_record() {
        let manifest = parse_manifest(
            r#"{"name": "acme/log", "require": {"psr/log": "^3.0", "php": ">=8.1"}}"#,
        )
        .unwrap();
        let record = PackageRecord::from(manifest);
        assert_eq!(record.name, "acme/log");
        assert!(record.version.is_empty());
        assert_eq!(record.requires, vec!["php", "psr/log"]);
    }
}
