//! Post-install verification.

use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Expected install artifacts, relative to the install prefix.
#[derive(Debug, Clone, Default)]
pub struct SanityPaths {
    /// Files that must exist.
    pub files: Vec<PathBuf>,
    /// Directories that must exist.
    pub dirs: Vec<PathBuf>,
}

/// Check that every expected file and directory exists under the
/// install prefix. Silent on success.
///
/// # Errors
///
/// Returns [`BuildError::MissingArtifact`] listing every absent path,
/// not just the first one found.
pub fn verify_installed(installdir: &Path, paths: &SanityPaths) -> Result<(), BuildError> {
    let mut missing = Vec::new();
    for file in &paths.files {
        if !installdir.join(file).is_file() {
            missing.push(file.display().to_string());
        }
    }
    for dir in &paths.dirs {
        if !installdir.join(dir).is_dir() {
            missing.push(format!("{}/", dir.display()));
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BuildError::MissingArtifact { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_listed() {
        let tmp = tempdir().unwrap();
        let paths = SanityPaths {
            files: vec![PathBuf::from("bin/x")],
            dirs: vec![],
        };
        match verify_installed(tmp.path(), &paths) {
            Err(BuildError::MissingArtifact { missing }) => {
                assert_eq!(missing, vec!["bin/x".to_string()]);
            }
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_present_paths_pass_silently() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("bin")).unwrap();
        std::fs::write(tmp.path().join("bin/x"), "").unwrap();
        std::fs::create_dir_all(tmp.path().join("include")).unwrap();
        let paths = SanityPaths {
            files: vec![PathBuf::from("bin/x")],
            dirs: vec![PathBuf::from("include")],
        };
        assert!(verify_installed(tmp.path(), &paths).is_ok());
    }

    #[test]
    fn test_every_absent_path_is_reported() {
        let tmp = tempdir().unwrap();
        let paths = SanityPaths {
            files: vec![PathBuf::from("lib/libpetsc.a")],
            dirs: vec![PathBuf::from("bin"), PathBuf::from("conf")],
        };
        match verify_installed(tmp.path(), &paths) {
            Err(BuildError::MissingArtifact { missing }) => {
                assert_eq!(missing.len(), 3);
            }
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn test_file_expected_but_directory_found() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("bin/x")).unwrap();
        let paths = SanityPaths {
            files: vec![PathBuf::from("bin/x")],
            dirs: vec![],
        };
        assert!(verify_installed(tmp.path(), &paths).is_err());
    }
}
