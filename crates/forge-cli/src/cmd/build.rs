//! Build command: run the full lifecycle for one package.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use forge_core::context::BuildContext;
use forge_core::env::EnvMap;
use forge_core::lifecycle::run_lifecycle;
use forge_core::run::ShellRunner;

/// Build the package described by the spec file into `installdir`.
pub fn build(spec_path: &Path, sourcedir: &Path, installdir: &Path) -> Result<()> {
    let (spec, mut block) = super::load_spec_and_block(spec_path)?;
    let version = spec.version()?;

    let mut ctx = BuildContext::new(
        &spec.package.name,
        version,
        spec.config(),
        spec.dependency_index(),
        EnvMap::from_process(),
        sourcedir.to_path_buf(),
        installdir.to_path_buf(),
        Box::new(ShellRunner),
    );

    run_lifecycle(block.as_mut(), &mut ctx)
        .with_context(|| format!("build of {} {} failed", spec.package.name, spec.package.version))?;

    info!(
        package = %ctx.name,
        installdir = %ctx.installdir.display(),
        "build complete"
    );

    // Module environment for the module-file generator, on stdout.
    for (name, value) in ctx.module_env.entries() {
        println!("setenv {name} {value}");
    }
    for (var, rel_dirs) in ctx.module_env.search_paths() {
        for dir in rel_dirs {
            println!("prepend-path {var} $root/{dir}");
        }
    }
    Ok(())
}
