//! Package-specific build blocks.
//!
//! Each block encodes one package's build knowledge behind the
//! [`forge_core::BuildSteps`] lifecycle: Blender (CMake), MVAPICH2
//! (Autotools) and PETSc (its own configure script). Blocks are
//! independent; nothing is shared between them beyond the engine
//! seams in `forge-core`.

pub mod blender;
pub mod mvapich2;
pub mod petsc;

use forge_core::BuildSteps;

/// Names of the packages with a registered block.
pub const KNOWN_BLOCKS: &[&str] = &["Blender", "MVAPICH2", "PETSc"];

/// Look up the block for a package name (case-insensitive).
pub fn block_for(name: &str) -> Option<Box<dyn BuildSteps>> {
    match name.to_lowercase().as_str() {
        "blender" => Some(Box::new(blender::BlenderBlock::new())),
        "mvapich2" => Some(Box::new(mvapich2::Mvapich2Block::new())),
        "petsc" => Some(Box::new(petsc::PetscBlock::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_case_insensitive() {
        assert!(block_for("PETSc").is_some());
        assert!(block_for("petsc").is_some());
        assert!(block_for("MVAPICH2").is_some());
        assert!(block_for("blender").is_some());
        assert!(block_for("OpenFOAM").is_none());
    }
}
