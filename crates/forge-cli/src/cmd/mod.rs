//! Subcommand implementations.

pub mod build;
pub mod show;

use anyhow::{bail, Result};
use std::path::Path;

use forge_core::spec::SpecFile;
use forge_core::BuildSteps;

/// Load a spec file and resolve its block, failing with the list of
/// known packages when none is registered.
pub fn load_spec_and_block(spec_path: &Path) -> Result<(SpecFile, Box<dyn BuildSteps>)> {
    let spec = SpecFile::load(spec_path)?;
    let Some(block) = forge_blocks::block_for(&spec.package.name) else {
        bail!(
            "no build block registered for '{}' (known: {})",
            spec.package.name,
            forge_blocks::KNOWN_BLOCKS.join(", ")
        );
    };
    Ok((spec, block))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_spec(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join("spec.toml");
        std::fs::write(
            &path,
            format!("[package]\nname = \"{name}\"\nversion = \"1.0\"\n"),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_resolves_registered_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(&dir, "PETSc");
        let (spec, _block) = load_spec_and_block(&path).unwrap();
        assert_eq!(spec.package.name, "PETSc");
    }

    #[test]
    fn test_unknown_package_names_the_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_spec(&dir, "OpenFOAM");
        let err = load_spec_and_block(&path).unwrap_err();
        assert!(err.to_string().contains("MVAPICH2"));
    }
}
