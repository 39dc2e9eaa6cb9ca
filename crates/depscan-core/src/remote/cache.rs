//! Session-scoped resolution cache.

use super::error::ResolveError;
use super::metadata::PackageMetadata;
use crate::model::Coordinate;
use dashmap::DashMap;
use std::sync::Arc;

/// Coordinate-keyed cache of resolved metadata.
///
/// Population is first-writer-wins: when two tasks resolve the same
/// coordinate concurrently, both end up holding the `Arc` that was stored
/// first. Definitive failures (`NotFound`, `Malformed`) are remembered too;
/// transient ones are not.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<Coordinate, Arc<PackageMetadata>>,
    failures: DashMap<Coordinate, ResolveError>,
}

impl ResolutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, coordinate: &Coordinate) -> Option<Arc<PackageMetadata>> {
        self.entries.get(coordinate).map(|e| Arc::clone(e.value()))
    }

    /// Store `metadata` under `coordinate` unless something is already there.
    ///
    /// Returns whichever value the cache holds afterwards.
    pub fn insert(&self, coordinate: Coordinate, metadata: Arc<PackageMetadata>) -> Arc<PackageMetadata> {
        Arc::clone(self.entries.entry(coordinate).or_insert(metadata).value())
    }

    #[must_use]
    pub fn get_failure(&self, coordinate: &Coordinate) -> Option<ResolveError> {
        self.failures.get(coordinate).map(|e| e.value().clone())
    }

    /// Remember a failure. Transient failures are ignored.
    pub fn insert_failure(&self, coordinate: Coordinate, error: &ResolveError) {
        if error.is_transient() {
            return;
        }
        self.failures.entry(coordinate).or_insert_with(|| error.clone());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
