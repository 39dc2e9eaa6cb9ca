//! Directory walking helpers.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find every file named exactly `file_name` below `root`.
///
/// Unreadable entries are skipped. A missing `root` yields an empty list.
/// Symlinks are not followed, so cyclic vendor trees terminate. Results are
/// sorted for deterministic downstream ordering.
#[must_use]
pub fn find_files_named(root: &Path, file_name: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(walkdir::DirEntry::into_path)
        .collect();

    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_nested_manifests() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("acme").join("log");
        let b = dir.path().join("acme").join("http").join("nested");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("composer.json"), "{}").unwrap();
        fs::write(b.join("composer.json"), "{}").unwrap();
        fs::write(b.join("composer.lock"), "{}").unwrap();

        let found = find_files_named(dir.path(), "composer.json");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.ends_with("composer.json")));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let found = find_files_named(&dir.path().join("vendor"), "composer.json");
        assert!(found.is_empty());
    }

    #[test]
    fn test_directories_with_matching_name_are_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("composer.json")).unwrap();

        let found = find_files_named(dir.path(), "composer.json");
        assert!(found.is_empty());
    }
}
