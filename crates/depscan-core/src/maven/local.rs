//! Local Maven repository (`~/.m2/repository` layout).

use super::layout::{
    artifact_dir, is_unexpanded, needs_version_listing, pom_path, split_name, VersionListing,
};
use super::{metadata_from_pom, pick_version};
use crate::model::Coordinate;
use crate::remote::error::ResolveError;
use crate::remote::metadata::PackageMetadata;
use crate::remote::repository::Repository;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// An offline repository read from disk.
///
/// Version ranges are matched against the version directories present.
#[derive(Debug, Clone)]
pub struct MavenLocalRepository {
    root: PathBuf,
    name: String,
}

impl MavenLocalRepository {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = format!("local:{}", root.display());
        Self { root, name }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn list_versions(&self, group: &str, artifact: &str) -> Result<Vec<String>, ResolveError> {
        let dir = self.root.join(artifact_dir(group, artifact));
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, &e)),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, &e))? {
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    versions.push(name.to_string());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }
}

fn io_error(path: &Path, e: &io::Error) -> ResolveError {
    ResolveError::network(path.display().to_string(), e.to_string())
}

#[async_trait]
impl Repository for MavenLocalRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, coordinate: &Coordinate) -> Result<PackageMetadata, ResolveError> {
        if is_unexpanded(&coordinate.version) {
            return Err(ResolveError::malformed(
                coordinate.to_string(),
                "Version has an unexpanded property",
            ));
        }
        let (group, artifact) = split_name(coordinate)?;

        let version = if needs_version_listing(&coordinate.version) {
            let listing = VersionListing {
                versions: self.list_versions(group, artifact).await?,
                ..VersionListing::default()
            };
            pick_version(coordinate, &listing)?
        } else {
            coordinate.version.trim().to_string()
        };

        let path = self.root.join(pom_path(group, artifact, &version));
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ResolveError::not_found(coordinate))
            }
            Err(e) => return Err(io_error(&path, &e)),
        };

        metadata_from_pom(coordinate, version, &body, &path.display().to_string())
    }
}
