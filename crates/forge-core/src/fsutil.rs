//! Filesystem lookups shared by blocks.

use std::path::PathBuf;

use crate::error::BuildError;

/// Resolve a glob pattern that must match exactly one path.
///
/// Glob results are not assumed stable or sorted; zero and multiple
/// matches are both errors carrying the full candidate list verbatim.
///
/// # Errors
///
/// [`BuildError::Pattern`] for an invalid pattern,
/// [`BuildError::AmbiguousOrMissingPath`] when the match count is not
/// exactly one.
pub fn find_unique_match(pattern: &str) -> Result<PathBuf, BuildError> {
    let paths = glob::glob(pattern).map_err(|source| BuildError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let matches: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    if matches.len() != 1 {
        return Err(BuildError::AmbiguousOrMissingPath {
            pattern: pattern.to_string(),
            count: matches.len(),
            matches,
        });
    }
    Ok(matches.into_iter().next().unwrap_or_default())
}

/// Shared library filename extension for the build host.
pub fn shared_lib_ext() -> &'static str {
    if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_single_match_returns_path() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("libpython2.7.so"), "").unwrap();
        let pattern = format!("{}/libpython2.7*.so", tmp.path().display());
        let found = find_unique_match(&pattern).unwrap();
        assert_eq!(found, tmp.path().join("libpython2.7.so"));
    }

    #[test]
    fn test_zero_matches_reports_count() {
        let tmp = tempdir().unwrap();
        let pattern = format!("{}/numpy-*.egg", tmp.path().display());
        match find_unique_match(&pattern) {
            Err(BuildError::AmbiguousOrMissingPath { count, matches, .. }) => {
                assert_eq!(count, 0);
                assert!(matches.is_empty());
            }
            other => panic!("expected AmbiguousOrMissingPath, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_matches_report_all_candidates() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("requests-1.egg"), "").unwrap();
        std::fs::write(tmp.path().join("requests-2.egg"), "").unwrap();
        let pattern = format!("{}/requests-*.egg", tmp.path().display());
        match find_unique_match(&pattern) {
            Err(BuildError::AmbiguousOrMissingPath { count, matches, .. }) => {
                assert_eq!(count, 2);
                assert_eq!(matches.len(), 2);
            }
            other => panic!("expected AmbiguousOrMissingPath, got {other:?}"),
        }
    }
}
