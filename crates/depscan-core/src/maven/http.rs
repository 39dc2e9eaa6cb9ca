//! Remote Maven repository over HTTP.

use super::layout::{
    is_unexpanded, metadata_path, needs_version_listing, parse_version_listing, pom_path,
    split_name,
};
use super::{metadata_from_pom, pick_version};
use crate::error::Error;
use crate::model::Coordinate;
use crate::remote::error::ResolveError;
use crate::remote::http::{get_text, join, parse_base_url};
use crate::remote::metadata::PackageMetadata;
use crate::remote::repository::Repository;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// A Maven repository reachable over HTTP(S), e.g. Maven Central.
#[derive(Debug, Clone)]
pub struct MavenHttpRepository {
    base_url: Url,
    http: Client,
}

impl MavenHttpRepository {
    /// Create a repository rooted at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: &str, http: Client) -> Result<Self, Error> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn resolve_version(
        &self,
        coordinate: &Coordinate,
        group: &str,
        artifact: &str,
    ) -> Result<String, ResolveError> {
        if !needs_version_listing(&coordinate.version) {
            return Ok(coordinate.version.trim().to_string());
        }

        let url = join(&self.base_url, &metadata_path(group, artifact))?;
        let Some(body) = get_text(&self.http, &url).await? else {
            return Err(ResolveError::not_found(coordinate));
        };
        let listing =
            parse_version_listing(&body).map_err(|e| ResolveError::malformed(url.as_str(), e))?;
        pick_version(coordinate, &listing)
    }
}

#[async_trait]
impl Repository for MavenHttpRepository {
    fn name(&self) -> &str {
        self.base_url.as_str()
    }

    async fn fetch(&self, coordinate: &Coordinate) -> Result<PackageMetadata, ResolveError> {
        if is_unexpanded(&coordinate.version) {
            return Err(ResolveError::malformed(
                coordinate.to_string(),
                "Version has an unexpanded property",
            ));
        }
        let (group, artifact) = split_name(coordinate)?;
        let version = self.resolve_version(coordinate, group, artifact).await?;

        let url = join(&self.base_url, &pom_path(group, artifact, &version))?;
        let Some(body) = get_text(&self.http, &url).await? else {
            return Err(ResolveError::not_found(coordinate));
        };

        metadata_from_pom(coordinate, version, &body, url.as_str())
    }
}
