//! Maven project inspection.

use super::project::{read_local_project, POM_FILE_NAME};
use super::repositories_from_config;
use crate::error::Error;
use crate::inspect::{Inspector, ScanContext};
use crate::model::{Language, Module, PackageManager};
use crate::remote::{build_dep_tree, ResolveError, Resolver};
use crate::remote::http::build_client;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Inspects projects with a `pom.xml`, resolving every module remotely.
#[derive(Debug, Default, Clone, Copy)]
pub struct MavenInspector;

#[async_trait]
impl Inspector for MavenInspector {
    fn name(&self) -> &'static str {
        "maven"
    }

    fn check_dir(&self, dir: &Path) -> bool {
        dir.join(POM_FILE_NAME).is_file()
    }

    async fn inspect(&self, ctx: &ScanContext) -> Result<Vec<Module>, Error> {
        let modules = read_local_project(&ctx.dir)?;
        info!(dir = %ctx.dir.display(), modules = modules.len(), "Read Maven project");

        let mut resolver = Resolver::new(ctx.cancel.clone())
            .with_max_concurrency(ctx.config.max_concurrent_fetches);
        for repository in repositories_from_config(&ctx.config, build_client()?)? {
            resolver.add_repository(repository);
        }
        for module in &modules {
            resolver.preseed(module.metadata.clone());
        }

        let mut out = Vec::with_capacity(modules.len());
        for module in modules {
            let root = build_dep_tree(&resolver, &module.metadata.coordinate)
                .await
                .map_err(|e| match e {
                    ResolveError::Cancelled => Error::Cancelled,
                    other => Error::other(other.to_string()),
                })?;

            out.push(Module {
                package_manager: PackageManager::Maven,
                language: Language::Java,
                manifest_path: module.pom_path,
                name: module.metadata.coordinate.name.clone(),
                version: root.version,
                dependencies: root.dependencies,
            });
        }

        Ok(out)
    }
}
