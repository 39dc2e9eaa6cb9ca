use std::path::{Path, PathBuf};

/// Project-local config file name.
pub const PROJECT_CONFIG_NAME: &str = "depscan.json";

/// Get the default local Maven repository (`~/.m2/repository`).
///
/// Returns `None` when no home directory can be determined.
#[must_use]
pub fn default_local_maven_repository() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".m2").join("repository"))
}

/// Path of the optional project-local config file.
#[must_use]
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_NAME)
}
