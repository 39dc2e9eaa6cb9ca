#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod composer;
pub mod config;
pub mod error;
pub mod inspect;
pub mod lockfile;
pub mod maven;
pub mod model;
pub mod paths;
pub mod remote;
pub mod version;

pub use config::Config;
pub use error::Error;
pub use inspect::{default_inspectors, inspect_dir, inspect_dir_with, Inspector, ScanContext};
pub use lockfile::{build_table, LockfileTree, PackageRecord, PackageTable, PlatformPolicy};
pub use model::{Coordinate, DependencyNode, Language, Manifest, Module, PackageManager, Requirement};
pub use remote::{
    build_dep_tree, DeclaredDependency, ErrorKind, PackageMetadata, Repository, ResolutionCache,
    ResolveError, Resolver,
};
pub use version::VERSION;
