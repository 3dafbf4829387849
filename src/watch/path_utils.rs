// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`: drop `.` components and fold `..` where a
/// parent is available. Does not touch the filesystem.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether an event path refers to the watched target.
///
/// - First compare the cleaned paths directly.
/// - If that fails (e.g. symlinked temp dirs such as `/var` vs
///   `/private/var` on macOS), compare file names and canonicalized parents.
///   The file itself may not exist any more, so only the parent is resolved.
pub fn is_same_path(event_path: &Path, target: &Path) -> bool {
    if clean(event_path) == clean(target) {
        return true;
    }

    if event_path.file_name() != target.file_name() {
        return false;
    }

    match (
        event_path.parent().map(Path::canonicalize),
        target.parent().map(Path::canonicalize),
    ) {
        (Some(Ok(a)), Some(Ok(b))) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_folds_dots() {
        assert_eq!(clean(Path::new("/a/./b/../c.go")), PathBuf::from("/a/c.go"));
        assert_eq!(clean(Path::new("./main.go")), PathBuf::from("main.go"));
        assert_eq!(clean(Path::new("../x.go")), PathBuf::from("../x.go"));
    }

    #[test]
    fn same_path_after_cleaning() {
        assert!(is_same_path(Path::new("/w/./main.go"), Path::new("/w/main.go")));
        assert!(!is_same_path(Path::new("/w/other.go"), Path::new("/w/main.go")));
    }

    #[test]
    fn same_path_through_canonical_parent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("main.go");
        let via_dotdot = dir.path().join("sub").join("..").join("main.go");
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(is_same_path(&via_dotdot, &target));
        assert!(!is_same_path(&dir.path().join("sub").join("main.go"), &target));
    }
}
