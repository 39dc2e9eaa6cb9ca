//! Coordinate resolution over an ordered repository chain.

use super::cache::ResolutionCache;
use super::error::ResolveError;
use super::metadata::PackageMetadata;
use super::repository::Repository;
use crate::model::Coordinate;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default bound on concurrent repository fetches.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Resolves coordinates to metadata for one session.
///
/// Lookup order for a coordinate: the cache, then pre-seeded local metadata,
/// then each repository in registration order. The first repository that
/// answers wins; answers are never merged across repositories.
#[derive(Debug)]
pub struct Resolver {
    repositories: Vec<Arc<dyn Repository>>,
    cache: Arc<ResolutionCache>,
    local: DashMap<Coordinate, PackageMetadata>,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl Resolver {
    /// Create a resolver with no repositories and a fresh cache.
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            repositories: Vec::new(),
            cache: Arc::new(ResolutionCache::new()),
            local: DashMap::new(),
            cancel,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_FETCHES)),
            max_concurrency: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Append a repository to the chain.
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repositories.push(repository);
        self
    }

    /// Append a repository to the chain.
    pub fn add_repository(&mut self, repository: Arc<dyn Repository>) {
        self.repositories.push(repository);
    }

    /// Bound the number of concurrent fetches.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        let max = max.max(1);
        self.permits = Arc::new(Semaphore::new(max));
        self.max_concurrency = max;
        self
    }

    /// Use an existing cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Make local metadata resolvable without touching any repository.
    ///
    /// Used for sibling modules of a multi-module project. The metadata goes
    /// through the same parent merge as fetched metadata.
    pub fn preseed(&self, metadata: PackageMetadata) {
        self.local.insert(metadata.coordinate.clone(), metadata);
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[must_use]
    pub fn repository_count(&self) -> usize {
        self.repositories.len()
    }

    /// Resolve `coordinate` to merged, interpolated metadata.
    ///
    /// A second call for the same coordinate returns the same `Arc` without
    /// any repository access.
    pub async fn resolve(&self, coordinate: &Coordinate) -> Result<Arc<PackageMetadata>, ResolveError> {
        self.resolve_in_lineage(coordinate, Vec::new()).await
    }

    /// Resolve while tracking the chain of children whose parent is being
    /// resolved, so a parent cycle terminates.
    fn resolve_in_lineage<'a>(
        &'a self,
        coordinate: &'a Coordinate,
        lineage: Vec<Coordinate>,
    ) -> BoxFuture<'a, Result<Arc<PackageMetadata>, ResolveError>> {
        async move {
            if self.cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            if let Some(hit) = self.cache.get(coordinate) {
                return Ok(hit);
            }
            if let Some(failure) = self.cache.get_failure(coordinate) {
                return Err(failure);
            }

            let local = self.local.get(coordinate).map(|e| e.value().clone());
            let mut metadata = match local {
                Some(metadata) => metadata,
                None => match self.fetch_from_chain(coordinate).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        self.cache.insert_failure(coordinate.clone(), &e);
                        return Err(e);
                    }
                },
            };

            if let Some(parent) = metadata.parent.clone() {
                if parent == metadata.coordinate || lineage.contains(&parent) {
                    warn!(coordinate = %coordinate, parent = %parent, "Parent cycle, not merging");
                } else {
                    let mut parent_lineage = lineage;
                    parent_lineage.push(metadata.coordinate.clone());
                    match self.resolve_in_lineage(&parent, parent_lineage).await {
                        Ok(resolved) => metadata.merge_parent(&resolved),
                        Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                        Err(e) => {
                            warn!(
                                coordinate = %coordinate,
                                parent = %parent,
                                error = %e,
                                "Parent unavailable, resolution degraded"
                            );
                        }
                    }
                }
            }

            metadata.finalize();

            let resolved = metadata.coordinate.clone();
            let stored = self.cache.insert(resolved.clone(), Arc::new(metadata));
            if resolved != *coordinate {
                self.cache.insert(coordinate.clone(), Arc::clone(&stored));
            }
            Ok(stored)
        }
        .boxed()
    }

    /// Try each repository in order until one answers.
    async fn fetch_from_chain(&self, coordinate: &Coordinate) -> Result<PackageMetadata, ResolveError> {
        let mut last_error = None;
        let mut network_error = None;

        for repository in &self.repositories {
            let result = tokio::select! {
                () = self.cancel.cancelled() => Err(ResolveError::Cancelled),
                result = self.fetch_one(repository.as_ref(), coordinate) => result,
            };

            match result {
                Ok(metadata) => {
                    debug!(coordinate = %coordinate, repository = repository.name(), "Resolved");
                    return Ok(metadata);
                }
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(e @ ResolveError::Network { .. }) => {
                    debug!(
                        coordinate = %coordinate,
                        repository = repository.name(),
                        error = %e,
                        "Repository failed, trying next"
                    );
                    network_error = Some(e);
                }
                Err(e) => {
                    debug!(
                        coordinate = %coordinate,
                        repository = repository.name(),
                        error = %e,
                        "Repository had no usable answer"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(network_error
            .or(last_error)
            .unwrap_or_else(|| ResolveError::not_found(coordinate)))
    }

    async fn fetch_one(
        &self,
        repository: &dyn Repository,
        coordinate: &Coordinate,
    ) -> Result<PackageMetadata, ResolveError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ResolveError::Cancelled)?;
        repository.fetch(coordinate).await
    }
}
