//! Lockfile-grounded tree building.
//!
//! Provides:
//! - The resolved-package table (lockfile records first, installed-directory
//!   records filling gaps)
//! - Bounded, cycle-safe recursion from declared requirements into a
//!   dependency tree

pub mod table;
pub mod tree;

pub use table::{build_table, PackageRecord, PackageTable};
pub use tree::{LockfileTree, PlatformPolicy, MAX_ANCESTORS};
