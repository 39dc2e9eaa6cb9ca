//! Installed packages under `vendor/`.

use super::manifest::{read_manifest, MANIFEST_FILE_NAME};
use crate::lockfile::PackageRecord;
use depscan_util::walk::find_files_named;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Enumerates the manifests of installed packages below a directory.
pub trait SubManifestSource: Send + Sync + Debug {
    /// Paths of every manifest below `root`. A missing `root` yields none.
    fn manifests(&self, root: &Path) -> Vec<PathBuf>;
}

/// Recursive directory walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkdirSource;

impl SubManifestSource for WalkdirSource {
    fn manifests(&self, root: &Path) -> Vec<PathBuf> {
        find_files_named(root, MANIFEST_FILE_NAME)
    }
}

/// Turn every parsable manifest below `vendor_dir` into a record.
///
/// Unreadable or unparsable manifests are skipped.
pub fn scan_vendor(source: &dyn SubManifestSource, vendor_dir: &Path) -> Vec<PackageRecord> {
    debug!(dir = %vendor_dir.display(), "Scanning installed packages");

    let records: Vec<PackageRecord> = source
        .manifests(vendor_dir)
        .into_iter()
        .filter_map(|path| match read_manifest(&path) {
            Ok(manifest) => Some(PackageRecord::from(manifest)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping installed manifest");
                None
            }
        })
        .collect();

    debug!(dir = %vendor_dir.display(), count = records.len(), "Installed package scan done");
    records
}
