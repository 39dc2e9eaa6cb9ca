//! The repository seam: one fetch capability per metadata source.

use super::error::ResolveError;
use super::metadata::PackageMetadata;
use crate::model::Coordinate;
use async_trait::async_trait;
use std::fmt::Debug;

/// A source of package metadata.
///
/// `fetch` receives the requested coordinate, whose version may still be a
/// constraint, and returns metadata whose coordinate carries the concrete
/// version that was picked. Implementations do not cache and do not follow
/// parents; the [`Resolver`](super::Resolver) does both.
#[async_trait]
pub trait Repository: Send + Sync + Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Fetch metadata for `coordinate`.
    async fn fetch(&self, coordinate: &Coordinate) -> Result<PackageMetadata, ResolveError>;
}
