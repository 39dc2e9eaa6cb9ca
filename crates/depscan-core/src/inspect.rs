//! Inspection driver: find the ecosystems present in a directory and build
//! their modules.

use crate::composer::ComposerInspector;
use crate::config::Config;
use crate::error::Error;
use crate::maven::MavenInspector;
use crate::model::Module;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything one inspection run needs.
#[derive(Debug, Clone)]
pub struct ScanContext {
    /// Absolute project directory.
    pub dir: PathBuf,
    pub config: Config,
    pub cancel: CancellationToken,
}

/// One ecosystem's project reader.
#[async_trait]
pub trait Inspector: Send + Sync + Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether `dir` holds a project of this ecosystem.
    fn check_dir(&self, dir: &Path) -> bool;

    /// Build the modules of the project in `ctx.dir`.
    ///
    /// Each call uses its own resolution session.
    async fn inspect(&self, ctx: &ScanContext) -> Result<Vec<Module>, Error>;
}

/// Every built-in inspector.
#[must_use]
pub fn default_inspectors() -> Vec<Box<dyn Inspector>> {
    vec![
        Box::new(ComposerInspector::default()),
        Box::new(MavenInspector),
    ]
}

/// Run every built-in inspector that recognizes `dir`.
///
/// # Errors
/// Returns the first fatal inspector error, or `Cancelled`.
pub async fn inspect_dir(
    dir: &Path,
    config: Config,
    cancel: CancellationToken,
) -> Result<Vec<Module>, Error> {
    inspect_dir_with(&default_inspectors(), dir, config, cancel).await
}

/// Run the given inspectors against `dir`.
///
/// # Errors
/// Returns the first fatal inspector error, or `Cancelled`.
pub async fn inspect_dir_with(
    inspectors: &[Box<dyn Inspector>],
    dir: &Path,
    config: Config,
    cancel: CancellationToken,
) -> Result<Vec<Module>, Error> {
    let dir = dir.canonicalize().map_err(|source| Error::ManifestRead {
        path: dir.to_path_buf(),
        source,
    })?;
    let ctx = ScanContext { dir, config, cancel };

    let mut modules = Vec::new();
    for inspector in inspectors {
        if !inspector.check_dir(&ctx.dir) {
            debug!(inspector = inspector.name(), "Not applicable");
            continue;
        }
        if ctx.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        info!(inspector = inspector.name(), dir = %ctx.dir.display(), "Inspecting");
        let found = inspector.inspect(&ctx).await?;
        info!(inspector = inspector.name(), modules = found.len(), "Inspection finished");
        modules.extend(found);
    }

    Ok(modules)
}
