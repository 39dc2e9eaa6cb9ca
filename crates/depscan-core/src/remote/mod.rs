//! Remote strategy: resolve coordinates against an ordered repository chain
//! and build trees on demand.
//!
//! A [`Resolver`] owns one session's chain, cache and cancellation token.
//! [`build_dep_tree`] walks a root coordinate's requirements through it with
//! the same cycle and depth rules as the lockfile strategy.

pub mod cache;
pub mod error;
pub mod http;
pub mod metadata;
pub mod repository;
pub mod resolver;
pub mod select;
pub mod tree;

pub use cache::ResolutionCache;
pub use error::{ErrorKind, ResolveError};
pub use metadata::{DeclaredDependency, PackageMetadata};
pub use repository::Repository;
pub use resolver::Resolver;
pub use tree::build_dep_tree;
