//! Maven ecosystem: POM parsing, repositories and project inspection.
//!
//! Maven has no lockfile, so every module goes through the remote strategy.
//! Sibling modules are pre-seeded so references between them never hit the
//! network.

pub mod http;
pub mod inspector;
pub mod layout;
pub mod local;
pub mod pom;
pub mod project;
pub mod version;

pub use http::MavenHttpRepository;
pub use inspector::MavenInspector;
pub use local::MavenLocalRepository;
pub use project::{read_local_project, LocalModule};

use crate::config::Config;
use crate::error::Error;
use crate::model::Coordinate;
use crate::remote::error::ResolveError;
use crate::remote::metadata::PackageMetadata;
use crate::remote::repository::Repository;
use layout::VersionListing;
use reqwest::Client;
use std::sync::Arc;

/// Build the repository chain for a session: the local repository first when
/// it exists, then the remote ones in configured order.
///
/// # Errors
/// Returns an error if a configured URL is invalid.
pub fn repositories_from_config(
    config: &Config,
    http: Client,
) -> Result<Vec<Arc<dyn Repository>>, Error> {
    let mut chain: Vec<Arc<dyn Repository>> = Vec::new();

    if let Some(local) = config
        .local_maven_repository
        .as_ref()
        .filter(|path| path.is_dir())
    {
        chain.push(Arc::new(MavenLocalRepository::new(local.clone())));
    }

    for url in &config.maven_repositories {
        chain.push(Arc::new(MavenHttpRepository::new(url, http.clone())?));
    }

    Ok(chain)
}

/// Pick a concrete version for `coordinate` from a version listing.
pub(crate) fn pick_version(
    coordinate: &Coordinate,
    listing: &VersionListing,
) -> Result<String, ResolveError> {
    version::select_version(&coordinate.version, &listing.versions, listing.preferred())
        .map_err(|e| ResolveError::malformed(coordinate.to_string(), e))?
        .ok_or_else(|| ResolveError::not_found(coordinate))
}

/// Turn a fetched POM into metadata for the requested coordinate.
pub(crate) fn metadata_from_pom(
    requested: &Coordinate,
    version: String,
    xml: &str,
    target: &str,
) -> Result<PackageMetadata, ResolveError> {
    let pom = pom::parse_pom(xml).map_err(|e| ResolveError::malformed(target, e))?;
    let mut metadata = pom.metadata;
    metadata.coordinate = Coordinate::new(requested.name.clone(), version);
    Ok(metadata)
}
