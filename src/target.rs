use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env_detect::HostPaths;

pub const DEFAULT_TARGET_NAME: &str = "setup.exe";

#[derive(Debug, Error)]
pub enum TargetError {
    #[error(
        "no target given and auto-detection failed: no {name} found in the default locations or under {root}"
    )]
    NotDetected { name: String, root: String },
    #[error("target does not exist or is not a regular file: {0}")]
    Missing(PathBuf),
}

/// Where to look for a target when none was given on the command line.
#[derive(Debug, Clone)]
pub struct TargetSearch {
    pub file_name: String,
    /// Checked in order before falling back to the recursive search.
    pub default_paths: Vec<PathBuf>,
    pub search_root: PathBuf,
}

impl TargetSearch {
    pub fn for_host(paths: &HostPaths) -> Self {
        let drive_c = paths.drive_c();
        Self {
            file_name: DEFAULT_TARGET_NAME.to_string(),
            default_paths: vec![
                paths.home.join("Downloads").join(DEFAULT_TARGET_NAME),
                paths.home.join("Desktop").join(DEFAULT_TARGET_NAME),
                drive_c.join(DEFAULT_TARGET_NAME),
            ],
            search_root: drive_c,
        }
    }

    fn detect(&self) -> Option<PathBuf> {
        if let Some(found) = self.default_paths.iter().find(|p| p.is_file()) {
            tracing::debug!("found target at default location {}", found.display());
            return Some(found.clone());
        }

        tracing::debug!(
            "searching {} for {}",
            self.search_root.display(),
            self.file_name
        );
        find_file_case_insensitive(&self.search_root, &self.file_name)
    }
}

/// An explicit target is returned as given; otherwise `search` is consulted.
pub fn resolve_target(
    explicit: Option<&Path>,
    search: &TargetSearch,
) -> Result<PathBuf, TargetError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    search.detect().ok_or_else(|| TargetError::NotDetected {
        name: search.file_name.clone(),
        root: search.search_root.display().to_string(),
    })
}

pub fn verify_target(path: &Path) -> Result<(), TargetError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TargetError::Missing(path.to_path_buf()))
    }
}

/// Pre-order walk in directory-listing order; the first match wins.
///
/// Listing order is whatever the filesystem yields, so with several
/// matches the winner is not stable across filesystems. Unreadable
/// directories are skipped and symlinked directories are not entered.
pub fn find_file_case_insensitive(root: &Path, name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(root).ok()?;
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();

        if file_type.is_dir() {
            if let Some(found) = find_file_case_insensitive(&path, name) {
                return Some(found);
            }
        } else if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) && path.is_file()
        {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{
        TargetError, TargetSearch, find_file_case_insensitive, resolve_target, verify_target,
    };

    fn search_in(root: &Path) -> TargetSearch {
        TargetSearch {
            file_name: "setup.exe".to_string(),
            default_paths: vec![root.join("Downloads/setup.exe")],
            search_root: root.join("drive_c"),
        }
    }

    #[test]
    fn explicit_target_is_used_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Downloads")).unwrap();
        fs::write(dir.path().join("Downloads/setup.exe"), b"MZ").unwrap();

        let explicit = PathBuf::from("/nowhere/app.exe");
        let resolved = resolve_target(Some(&explicit), &search_in(dir.path())).unwrap();
        assert_eq!(resolved, explicit);
        assert!(matches!(
            verify_target(&resolved),
            Err(TargetError::Missing(_))
        ));
    }

    #[test]
    fn default_location_wins_over_search() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Downloads")).unwrap();
        fs::create_dir_all(dir.path().join("drive_c/Games")).unwrap();
        fs::write(dir.path().join("Downloads/setup.exe"), b"MZ").unwrap();
        fs::write(dir.path().join("drive_c/Games/setup.exe"), b"MZ").unwrap();

        let resolved = resolve_target(None, &search_in(dir.path())).unwrap();
        assert_eq!(resolved, dir.path().join("Downloads/setup.exe"));
    }

    #[test]
    fn recursive_search_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("drive_c/Program Files/Vendor/App");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("SETUP.EXE"), b"MZ").unwrap();

        let resolved = resolve_target(None, &search_in(dir.path())).unwrap();
        assert_eq!(resolved, nested.join("SETUP.EXE"));
        verify_target(&resolved).unwrap();
    }

    #[test]
    fn directory_named_like_target_is_not_a_match() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("setup.exe/inner")).unwrap();
        assert_eq!(find_file_case_insensitive(dir.path(), "setup.exe"), None);
    }

    #[test]
    fn reports_auto_detection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_target(None, &search_in(dir.path())).unwrap_err();
        assert!(matches!(err, TargetError::NotDetected { .. }));
        assert!(err.to_string().contains("auto-detection failed"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_entered() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();
        assert_eq!(find_file_case_insensitive(dir.path(), "setup.exe"), None);

        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("setup.exe"), b"MZ").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
        assert_eq!(find_file_case_insensitive(dir.path(), "setup.exe"), None);
    }

    #[test]
    fn missing_search_root_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            find_file_case_insensitive(&dir.path().join("absent"), "setup.exe"),
            None
        );
    }
}
