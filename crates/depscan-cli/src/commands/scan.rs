//! `depscan scan`: inspect a project directory and print its dependency trees.

use depscan_core::{inspect_dir, Config, DependencyNode, Error, Module};
use miette::{miette, IntoDiagnostic, Result};
use std::fmt::Write as _;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Flags of the scan subcommand, applied on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Never run the package manager to produce a missing lockfile.
    pub no_install: bool,
    /// Replace the remote Maven repositories.
    pub repos: Vec<String>,
    /// Whole-session deadline in seconds.
    pub timeout_secs: Option<u64>,
    /// Skip every remote repository.
    pub offline: bool,
}

impl ScanOptions {
    fn apply(&self, mut config: Config) -> Config {
        if self.no_install {
            config = config.with_materialize_lockfile(false);
        }
        if !self.repos.is_empty() {
            config = config.with_maven_repositories(self.repos.clone());
        }
        if self.timeout_secs.is_some() {
            config = config.with_deadline_secs(self.timeout_secs);
        }
        if self.offline {
            config = config
                .with_remote_fallback(false)
                .with_maven_repositories(Vec::new());
        }
        config
    }
}

/// Run the scan command.
///
/// When `json` is true, prints the modules as one JSON array to stdout.
/// Otherwise prints one indented tree per module.
pub fn run(config: Config, options: &ScanOptions, json: bool) -> Result<()> {
    let config = options.apply(config);
    let dir = config.cwd.clone();
    let deadline = config.deadline();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    let result = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let triggers = spawn_cancel_triggers(cancel.clone(), deadline);
        let result = inspect_dir(&dir, config, cancel).await;
        triggers.abort();
        result
    });

    let modules = match result {
        Ok(modules) => modules,
        Err(Error::Cancelled) => {
            return Err(match deadline {
                Some(d) => miette!("Scan of {} cancelled (deadline {}s)", dir.display(), d.as_secs()),
                None => miette!("Scan of {} cancelled", dir.display()),
            })
        }
        Err(e) => return Err(e).into_diagnostic(),
    };

    if json {
        let out = serde_json::to_string_pretty(&modules).into_diagnostic()?;
        println!("{out}");
    } else if modules.is_empty() {
        println!("No Composer or Maven project found in {}", dir.display());
    } else {
        print!("{}", render_modules(&modules));
    }

    Ok(())
}

/// Cancel the session on Ctrl-C or when the deadline passes.
fn spawn_cancel_triggers(cancel: CancellationToken, deadline: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let expired = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            Ok(()) = tokio::signal::ctrl_c() => warn!("Interrupted, cancelling scan"),
            () = expired => warn!("Deadline reached, cancelling scan"),
        }
        cancel.cancel();
    })
}

fn render_modules(modules: &[Module]) -> String {
    let mut out = String::new();
    for (i, module) in modules.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{} {}", module.package_manager.as_str(), module.name);
        if !module.version.is_empty() {
            let _ = write!(out, "@{}", module.version);
        }
        let _ = writeln!(out, " ({})", module.manifest_path.display());
        render_nodes(&mut out, &module.dependencies, "");
    }
    out
}

fn render_nodes(out: &mut String, nodes: &[DependencyNode], prefix: &str) {
    let len = nodes.len();
    for (i, node) in nodes.iter().enumerate() {
        let is_last = i == len - 1;
        let connector = if is_last { "└── " } else { "├── " };
        let next_prefix = if is_last { "    " } else { "│   " };

        let _ = writeln!(out, "{prefix}{connector}{}@{}", node.name, node.version);
        render_nodes(out, &node.dependencies, &format!("{prefix}{next_prefix}"));
    }
}
