//! `composer.lock` reading.

use crate::error::Error;
use crate::lockfile::PackageRecord;
use depscan_util::fs::{read_to_string_limited, MANIFEST_SIZE_LIMIT};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Lockfile name.
pub const LOCK_FILE_NAME: &str = "composer.lock";

#[derive(Debug, Default, Deserialize)]
struct RawLock {
    #[serde(default)]
    packages: Vec<Value>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawLockPackage {
    name: String,
    #[serde(default)]
    version: String,
    /// Kept in declaration order.
    #[serde(default)]
    require: Map<String, Value>,
}

/// Parse lockfile JSON into records, `packages` before `packages-dev`.
///
/// Entries that are not package objects are skipped.
///
/// # Errors
/// Returns the JSON error if the document itself is not a lockfile object.
pub fn parse_lock(json: &str) -> Result<Vec<PackageRecord>, serde_json::Error> {
    let raw: RawLock = serde_json::from_str(json)?;

    Ok(raw
        .packages
        .into_iter()
        .chain(raw.packages_dev)
        .filter_map(|entry| match serde_json::from_value::<RawLockPackage>(entry) {
            Ok(pkg) => Some(PackageRecord::new(
                pkg.name,
                pkg.version,
                pkg.require.into_iter().map(|(name, _)| name).collect(),
            )),
            Err(e) => {
                debug!(error = %e, "Skipping malformed lockfile entry");
                None
            }
        })
        .collect())
}

/// Read and parse a lockfile.
///
/// # Errors
/// Returns `ManifestRead` if the file is missing or too large, and
/// `ManifestParse` if it is not a lockfile.
pub fn read_lock(path: &Path) -> Result<Vec<PackageRecord>, Error> {
    let content = read_to_string_limited(path, MANIFEST_SIZE_LIMIT).map_err(|source| {
        Error::ManifestRead {
            path: path.to_path_buf(),
            source,
        }
    })?;
    parse_lock(&content).map_err(|e| Error::manifest_parse(path, e.to_string()))
}
