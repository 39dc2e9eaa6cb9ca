use crate::error::Error;
use crate::paths::{default_local_maven_repository, project_config_path};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Maven repository URL.
pub const DEFAULT_MAVEN_REPOSITORY: &str = "https://repo.maven.apache.org/maven2/";

/// Default Packagist metadata URL.
pub const DEFAULT_PACKAGIST_URL: &str = "https://repo.packagist.org/";

/// Environment variable overriding the Maven repository list (comma separated).
pub const MAVEN_REPOS_ENV: &str = "DEPSCAN_MAVEN_REPOS";

/// Environment variable overriding the Packagist URL.
pub const PACKAGIST_URL_ENV: &str = "DEPSCAN_PACKAGIST_URL";

/// Runtime configuration for a depscan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Remote Maven repositories, consulted in order.
    pub maven_repositories: Vec<String>,

    /// Packagist metadata base URL.
    pub packagist_url: String,

    /// Local Maven repository consulted before any remote one.
    pub local_maven_repository: Option<PathBuf>,

    /// Run the package manager to generate a missing lockfile.
    pub materialize_lockfile: bool,

    /// Upper bound for the lockfile materialization step, in seconds.
    pub materialize_timeout_secs: u64,

    /// Resolve against remote repositories when no lock data exists.
    pub remote_fallback: bool,

    /// Maximum concurrent repository fetches per session.
    pub max_concurrent_fetches: usize,

    /// Whole-session deadline in seconds. `None` means no deadline.
    pub deadline_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            maven_repositories: vec![DEFAULT_MAVEN_REPOSITORY.to_string()],
            packagist_url: DEFAULT_PACKAGIST_URL.to_string(),
            local_maven_repository: default_local_maven_repository(),
            materialize_lockfile: true,
            materialize_timeout_secs: 120,
            remote_fallback: true,
            max_concurrent_fetches: 16,
            deadline_secs: None,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Load a config file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the effective config for a project directory.
    ///
    /// Precedence, lowest first: defaults, `depscan.json` in `cwd`, environment.
    ///
    /// # Errors
    /// Returns an error if a present `depscan.json` cannot be read or parsed.
    pub fn for_project(cwd: PathBuf) -> Result<Self, Error> {
        let config_path = project_config_path(&cwd);
        let config = if config_path.is_file() {
            Self::load(&config_path)?
        } else {
            Self::default()
        };

        Ok(config.with_cwd(cwd).apply_env())
    }

    /// Apply environment overrides.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(repos) = std::env::var(MAVEN_REPOS_ENV) {
            let repos: Vec<String> = repos
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !repos.is_empty() {
                self.maven_repositories = repos;
            }
        }
        if let Ok(url) = std::env::var(PACKAGIST_URL_ENV) {
            if !url.trim().is_empty() {
                self.packagist_url = url.trim().to_string();
            }
        }
        self
    }

    /// Materialization timeout as a `Duration`.
    #[must_use]
    pub fn materialize_timeout(&self) -> Duration {
        Duration::from_secs(self.materialize_timeout_secs)
    }

    /// Session deadline as a `Duration`.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = cwd;
        self
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Replace the remote Maven repository list.
    #[must_use]
    pub fn with_maven_repositories(mut self, repos: Vec<String>) -> Self {
        self.maven_repositories = repos;
        self
    }

    /// Set the local Maven repository.
    #[must_use]
    pub fn with_local_maven_repository(mut self, path: Option<PathBuf>) -> Self {
        self.local_maven_repository = path;
        self
    }

    /// Set the Packagist URL.
    #[must_use]
    pub fn with_packagist_url(mut self, url: impl Into<String>) -> Self {
        self.packagist_url = url.into();
        self
    }

    /// Enable or disable lockfile materialization.
    #[must_use]
    pub fn with_materialize_lockfile(mut self, enabled: bool) -> Self {
        self.materialize_lockfile = enabled;
        self
    }

    /// Enable or disable remote fallback for lockfile ecosystems.
    #[must_use]
    pub fn with_remote_fallback(mut self, enabled: bool) -> Self {
        self.remote_fallback = enabled;
        self
    }

    /// Set the session deadline.
    #[must_use]
    pub fn with_deadline_secs(mut self, secs: Option<u64>) -> Self {
        self.deadline_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.maven_repositories, vec![DEFAULT_MAVEN_REPOSITORY]);
        assert!(config.materialize_lockfile);
        assert!(config.remote_fallback);
        assert_eq!(config.materialize_timeout(), Duration::from_secs(120));
        assert!(config.deadline().is_none());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depscan.json");
        fs::write(
            &path,
            r#"{"maven_repositories": ["https://mirror.example/maven2/"], "materialize_lockfile": false}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.maven_repositories,
            vec!["https://mirror.example/maven2/"]
        );
        assert!(!config.materialize_lockfile);
        assert_eq!(config.packagist_url, DEFAULT_PACKAGIST_URL);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depscan.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Config::load(&dir.path().join("depscan.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("depscan.json"),
            r#"{"maven_repositories": ["https://file.example/"]}"#,
        )
        .unwrap();

        std::env::set_var(MAVEN_REPOS_ENV, "https://a.example/, https://b.example/");
        let config = Config::for_project(dir.path().to_path_buf()).unwrap();
        std::env::remove_var(MAVEN_REPOS_ENV);

        assert_eq!(
            config.maven_repositories,
            vec!["https://a.example/", "https://b.example/"]
        );
        assert_eq!(config.cwd, dir.path());
    }

    #[test]
    #[serial]
    fn test_blank_env_is_ignored() {
        std::env::set_var(PACKAGIST_URL_ENV, "  ");
        let config = Config::default().apply_env();
        std::env::remove_var(PACKAGIST_URL_ENV);

        assert_eq!(config.packagist_url, DEFAULT_PACKAGIST_URL);
    }

    #[test]
    fn test_builders() {
        let config = Config::new(PathBuf::from("/work"))
            .with_verbosity(2)
            .with_json_logs(true)
            .with_materialize_lockfile(false)
            .with_deadline_secs(Some(30));
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
        assert!(!config.materialize_lockfile);
        assert_eq!(config.deadline(), Some(Duration::from_secs(30)));
    }
}
