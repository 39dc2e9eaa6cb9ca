use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

/// Default upper bound for manifest and lockfile reads (4 MiB).
pub const MANIFEST_SIZE_LIMIT: u64 = 4 * 1024 * 1024;

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read a file to string, refusing files larger than `limit` bytes.
///
/// Invalid UTF-8 is replaced rather than rejected: manifests found in
/// vendored directories are not always well-formed.
///
/// # Errors
/// Returns `InvalidData` if the file exceeds `limit`, or the underlying
/// error if the file cannot be opened or read.
pub fn read_to_string_limited(path: &Path, limit: u64) -> io::Result<String> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} is {len} bytes, larger than the {limit} byte limit",
                path.display()
            ),
        ));
    }

    // The file may grow between the metadata call and the read.
    let mut bytes = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
    file.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} grew past the {limit} byte limit", path.display()),
        ));
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_to_string_lossy_valid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_read_to_string_lossy_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x80, 0x81])
            .unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert!(content.starts_with("Hello"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_read_limited_within_limit() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"name": "acme/app"}"#).unwrap();
        file.flush().unwrap();

        let content = read_to_string_limited(file.path(), MANIFEST_SIZE_LIMIT).unwrap();
        assert_eq!(content, r#"{"name": "acme/app"}"#);
    }

    #[test]
    fn test_read_limited_rejects_large_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 64]).unwrap();
        file.flush().unwrap();

        let err = read_to_string_limited(file.path(), 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_limited_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_to_string_limited(&dir.path().join("nope.json"), 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
