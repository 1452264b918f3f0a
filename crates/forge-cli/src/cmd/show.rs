//! Show command: print the commands a build would run.

use anyhow::Result;
use std::path::Path;

use forge_core::context::BuildContext;
use forge_core::env::EnvMap;
use forge_core::lifecycle::run_lifecycle;
use forge_core::run::{CommandOutput, ScriptedRunner};

/// Dry-run the lifecycle against a scripted runner and print every
/// command the block composed. Sanity checks run against the real
/// filesystem, so a missing-artifact failure at the end is expected
/// and reported as such, after the commands.
pub fn show(spec_path: &Path, sourcedir: &Path, installdir: &Path) -> Result<()> {
    let (spec, mut block) = super::load_spec_and_block(spec_path)?;
    let version = spec.version()?;

    let runner = ScriptedRunner::new();
    // PETSc-style blocks scan configure output for settings; feed a
    // plausible line so the dry run can proceed.
    runner.push_output(CommandOutput::ok("  PETSC_ARCH: arch-linux2-c-opt\n"));
    let log = runner.command_log();

    let mut ctx = BuildContext::new(
        &spec.package.name,
        version,
        spec.config(),
        spec.dependency_index(),
        EnvMap::from_process(),
        sourcedir.to_path_buf(),
        installdir.to_path_buf(),
        Box::new(runner),
    );

    let outcome = run_lifecycle(block.as_mut(), &mut ctx);

    for cmd in log.borrow().iter() {
        println!("{cmd}");
    }
    if let Err(err) = outcome {
        println!("# stopped: {err}");
    }
    Ok(())
}
