// src/watch/hash.rs

//! Content hashing for change detection.
//!
//! A filesystem event alone never triggers a run: the watch loop re-hashes
//! the target and only dispatches when the digest differs from the last one
//! recorded in [`HashState`].

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Fixed-length content fingerprint (blake3, lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest of an in-memory byte slice.
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    Digest(blake3::hash(bytes).to_hex().to_string())
}

/// Compute the digest of a file's full current content.
///
/// Read failures (missing file, file mid-rewrite) are returned to the
/// caller, which decides whether to skip the cycle.
pub fn compute_file_digest(fs: &dyn FileSystem, path: &Path) -> Result<Digest> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let digest = Digest(hasher.finalize().to_hex().to_string());
    debug!(path = ?path, digest = %digest, "computed file digest");
    Ok(digest)
}

/// Last-seen digest per watched path.
///
/// Only one path is watched today; the map keeps the door open for more.
/// Callers wrap this in a mutex and hold it across each compare-and-swap.
#[derive(Debug, Default)]
pub struct HashState {
    digests: HashMap<PathBuf, Digest>,
}

impl HashState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Digest> {
        self.digests.get(path)
    }

    /// Record `digest` for `path` unconditionally.
    pub fn record(&mut self, path: &Path, digest: Digest) {
        self.digests.insert(path.to_path_buf(), digest);
    }

    /// Store `digest` if it differs from the recorded one.
    ///
    /// Returns `true` when the content changed (including the first
    /// digest ever seen for `path`).
    pub fn compare_and_swap(&mut self, path: &Path, digest: Digest) -> bool {
        match self.digests.get(path) {
            Some(old) if *old == digest => false,
            _ => {
                self.digests.insert(path.to_path_buf(), digest);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::RealFileSystem;

    #[test]
    fn digest_tracks_content_and_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        let fs = RealFileSystem;

        std::fs::write(&path, b"hello world").unwrap();
        let first = compute_file_digest(&fs, &path).unwrap();
        assert_eq!(first, compute_file_digest(&fs, &path).unwrap());

        std::fs::write(&path, b"hello world, modified").unwrap();
        let second = compute_file_digest(&fs, &path).unwrap();
        assert_ne!(first, second);

        std::fs::write(&path, b"hello world").unwrap();
        assert_eq!(first, compute_file_digest(&fs, &path).unwrap());
    }

    #[test]
    fn known_blake3_value() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/test.txt", b"hello world".to_vec());

        let digest = compute_file_digest(&fs, Path::new("/w/test.txt")).unwrap();
        assert_eq!(
            digest.as_str(),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
        assert_eq!(digest, digest_bytes(b"hello world"));
    }

    #[test]
    fn content_larger_than_one_chunk_matches_in_memory_digest() {
        let fs = MockFileSystem::new();
        let content: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        fs.add_file("/w/big.bin", content.clone());

        let digest = compute_file_digest(&fs, Path::new("/w/big.bin")).unwrap();
        assert_eq!(digest, digest_bytes(&content));
    }

    #[test]
    fn missing_file_surfaces_an_error() {
        let fs = MockFileSystem::new();
        let err = compute_file_digest(&fs, Path::new("/w/gone.go")).unwrap_err();
        assert!(format!("{err:#}").contains("opening file for hashing"));
    }

    #[test]
    fn compare_and_swap_reports_only_real_changes() {
        let mut state = HashState::new();
        let path = Path::new("/w/main.go");

        assert!(state.compare_and_swap(path, digest_bytes(b"a")));
        assert!(!state.compare_and_swap(path, digest_bytes(b"a")));
        assert!(state.compare_and_swap(path, digest_bytes(b"b")));
        assert_eq!(state.get(path), Some(&digest_bytes(b"b")));
    }
}
