//! Composer ecosystem: manifest, lockfile, installed packages and Packagist.
//!
//! Resolution data comes from `composer.lock` and the manifests under
//! `vendor/`; the lockfile strategy turns it into trees. Packagist is only
//! consulted when neither source yields anything.

pub mod inspector;
pub mod install;
pub mod lock;
pub mod manifest;
pub mod packagist;
pub mod vendor;

pub use inspector::ComposerInspector;
pub use packagist::PackagistRepository;
pub use vendor::{SubManifestSource, WalkdirSource};
