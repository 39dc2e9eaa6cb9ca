//! Composer project inspection.

use super::install::{materialize_lockfile, COMPOSER_PROGRAM};
use super::lock::{read_lock, LOCK_FILE_NAME};
use super::manifest::{read_manifest, MANIFEST_FILE_NAME};
use super::packagist::{is_installable_name, PackagistRepository};
use super::vendor::{scan_vendor, SubManifestSource, WalkdirSource};
use crate::error::Error;
use crate::inspect::{Inspector, ScanContext};
use crate::lockfile::{build_table, LockfileTree, PackageTable};
use crate::model::{Coordinate, DependencyNode, Language, Module, PackageManager, Requirement};
use crate::remote::http::build_client;
use crate::remote::{build_dep_tree, ResolveError, Resolver};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Directory holding installed packages.
pub const VENDOR_DIR: &str = "vendor";

/// Inspects projects with a `composer.json`.
#[derive(Debug, Clone)]
pub struct ComposerInspector {
    installed: Arc<dyn SubManifestSource>,
    program: String,
}

impl Default for ComposerInspector {
    fn default() -> Self {
        Self {
            installed: Arc::new(WalkdirSource),
            program: COMPOSER_PROGRAM.to_string(),
        }
    }
}

impl ComposerInspector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace how installed manifests are enumerated.
    #[must_use]
    pub fn with_installed_source(mut self, source: Arc<dyn SubManifestSource>) -> Self {
        self.installed = source;
        self
    }

    /// Replace the package manager executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn materialize_if_missing(&self, ctx: &ScanContext) -> Result<(), Error> {
        if ctx.dir.join(LOCK_FILE_NAME).exists() || !ctx.config.materialize_lockfile {
            return Ok(());
        }

        info!(dir = %ctx.dir.display(), "composer.lock missing, running composer install");
        match materialize_lockfile(
            &self.program,
            &ctx.dir,
            ctx.config.materialize_timeout(),
            &ctx.cancel,
        )
        .await
        {
            Ok(()) => info!(dir = %ctx.dir.display(), "composer install succeeded"),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => warn!(error = %e, "composer install failed"),
        }
        Ok(())
    }

    /// Resolve top-level requirements against Packagist. Trees come back in
    /// the order of `requires`.
    async fn remote_forest(
        &self,
        ctx: &ScanContext,
        requires: &[Requirement],
    ) -> Result<Vec<DependencyNode>, Error> {
        let repository = PackagistRepository::new(&ctx.config.packagist_url, build_client()?)?;
        let resolver = Resolver::new(ctx.cancel.clone())
            .with_max_concurrency(ctx.config.max_concurrent_fetches)
            .with_repository(Arc::new(repository));

        let roots: Vec<Coordinate> = requires
            .iter()
            .map(|r| Coordinate::new(r.name.clone(), r.constraint.clone()))
            .collect();

        let resolver = &resolver;
        stream::iter(roots)
            .map(|root| async move { build_dep_tree(resolver, &root).await })
            .buffered(resolver.max_concurrency())
            .try_collect()
            .await
            .map_err(|e| match e {
                ResolveError::Cancelled => Error::Cancelled,
                other => Error::other(other.to_string()),
            })
    }
}

/// An installable requirement the table holds no pinned version for.
fn needs_remote(table: &PackageTable, req: &Requirement) -> bool {
    is_installable_name(&req.name) && table.get(&req.name).map_or(true, |r| r.version.is_empty())
}

#[async_trait]
impl Inspector for ComposerInspector {
    fn name(&self) -> &'static str {
        "composer"
    }

    fn check_dir(&self, dir: &Path) -> bool {
        dir.join(MANIFEST_FILE_NAME).is_file()
    }

    async fn inspect(&self, ctx: &ScanContext) -> Result<Vec<Module>, Error> {
        let manifest_path = ctx.dir.join(MANIFEST_FILE_NAME);
        let manifest = read_manifest(&manifest_path)?;

        self.materialize_if_missing(ctx).await?;

        let lock_path = ctx.dir.join(LOCK_FILE_NAME);
        let locked = read_lock(&lock_path).unwrap_or_else(|e| {
            info!(error = %e, "No usable composer.lock");
            Vec::new()
        });
        let installed = scan_vendor(self.installed.as_ref(), &ctx.dir.join(VENDOR_DIR));
        let table = build_table(locked, installed);
        info!(dir = %ctx.dir.display(), packages = table.len(), "Built package table");

        let missing: Vec<Requirement> = if ctx.config.remote_fallback {
            manifest
                .requires
                .iter()
                .filter(|req| needs_remote(&table, req))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        let mut remote: HashMap<String, DependencyNode> = HashMap::new();
        if !missing.is_empty() {
            info!(count = missing.len(), "Requirements without lock data, resolving against Packagist");
            let trees = self.remote_forest(ctx, &missing).await?;
            remote.extend(missing.iter().map(|req| req.name.clone()).zip(trees));
        }

        let tree = LockfileTree::new(&table);
        let dependencies = manifest
            .requires
            .iter()
            .filter_map(|req| match remote.remove(&req.name) {
                Some(node) => Some(node),
                None => tree.build_dependency_node(&mut HashSet::new(), &req.name, &req.constraint),
            })
            .collect();

        Ok(vec![Module {
            package_manager: PackageManager::Composer,
            language: Language::Php,
            manifest_path,
            name: manifest.name,
            version: manifest.version,
            dependencies,
        }])
    }
}
