//! Reading a local (possibly multi-module) Maven project.

use super::pom::parse_pom;
use crate::error::Error;
use crate::remote::metadata::PackageMetadata;
use depscan_util::fs::{read_to_string_limited, MANIFEST_SIZE_LIMIT};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Manifest file name of a Maven project.
pub const POM_FILE_NAME: &str = "pom.xml";

/// One module of a local project.
#[derive(Debug, Clone)]
pub struct LocalModule {
    pub pom_path: PathBuf,
    /// Raw metadata: parents not merged, properties not expanded.
    pub metadata: PackageMetadata,
    pub packaging: String,
}

/// Read `dir/pom.xml` and every module it aggregates, depth first.
///
/// The root comes first. A module POM that cannot be read or parsed is
/// logged and skipped; only the root POM is required.
///
/// # Errors
/// Returns an error if the root POM cannot be read or parsed.
pub fn read_local_project(dir: &Path) -> Result<Vec<LocalModule>, Error> {
    let root_path = dir.join(POM_FILE_NAME);
    let root = read_module(&root_path)?;

    let mut seen = HashSet::new();
    seen.insert(canonical(&root_path));

    let mut modules = Vec::new();
    collect(root, &root_path, &mut seen, &mut modules);
    Ok(modules)
}

fn collect(
    pom: (LocalModule, Vec<String>),
    pom_path: &Path,
    seen: &mut HashSet<PathBuf>,
    out: &mut Vec<LocalModule>,
) {
    let (module, children) = pom;
    out.push(module);

    let base = pom_path.parent().unwrap_or_else(|| Path::new("."));
    for child in children {
        let mut child_path = base.join(&child);
        if child_path.is_dir() || !child.ends_with(".xml") {
            child_path = child_path.join(POM_FILE_NAME);
        }
        if !seen.insert(canonical(&child_path)) {
            continue;
        }

        match read_module(&child_path) {
            Ok(child_pom) => collect(child_pom, &child_path, seen, out),
            Err(e) => warn!(path = %child_path.display(), error = %e, "Skipping module"),
        }
    }
}

fn read_module(path: &Path) -> Result<(LocalModule, Vec<String>), Error> {
    let xml = read_to_string_limited(path, MANIFEST_SIZE_LIMIT).map_err(|source| {
        Error::ManifestRead {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let pom = parse_pom(&xml).map_err(|message| Error::manifest_parse(path, message))?;

    Ok((
        LocalModule {
            pom_path: path.to_path_buf(),
            metadata: pom.metadata,
            packaging: pom.packaging,
        },
        pom.modules,
    ))
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
