//! The four-phase build lifecycle and the generic step kits.
//!
//! Blocks implement [`BuildSteps`]; the orchestrator drives the phases
//! in order, synchronously, aborting on the first error. Packages with
//! an ordinary Autotools or CMake build compose [`ConfigureMake`] /
//! [`CMakeMake`] rather than inheriting from them - a block owns its
//! whole lifecycle and delegates the steps that are generic.

use tracing::info;

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::run::CommandOutput;

/// One package's build lifecycle.
pub trait BuildSteps {
    /// Assemble flags and run the package's configure tool.
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError>;

    /// Compile. Defaults to `make` with the context's parallel level.
    fn build(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        ConfigureMake::build(ctx).map(|_| ())
    }

    /// Install into the prefix. Defaults to `make install`.
    fn install(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        ConfigureMake::install(ctx).map(|_| ())
    }

    /// Verify expected artifacts exist under the install prefix.
    fn sanity_check(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError>;

    /// Emit module environment entries. Most packages need nothing
    /// beyond the generic search-path guesses.
    fn module_env(&mut self, _ctx: &mut BuildContext) -> Result<(), BuildError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn BuildSteps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn BuildSteps")
    }
}

/// Drive configure, build, install, sanity check and module emission
/// for one package, in that order.
///
/// # Errors
///
/// The first failing phase aborts the build; the error propagates to
/// the caller untouched.
pub fn run_lifecycle(
    block: &mut dyn BuildSteps,
    ctx: &mut BuildContext,
) -> Result<(), BuildError> {
    info!(package = %ctx.name, version = %ctx.version, "configuring");
    block.configure(ctx)?;
    info!(package = %ctx.name, "building");
    block.build(ctx)?;
    info!(package = %ctx.name, "installing");
    block.install(ctx)?;
    info!(package = %ctx.name, "verifying installation");
    block.sanity_check(ctx)?;
    block.module_env(ctx)?;
    Ok(())
}

/// Generic Autotools-style steps: `./configure --prefix=…`, `make`,
/// `make install`.
#[derive(Debug)]
pub struct ConfigureMake;

impl ConfigureMake {
    /// Run `./configure` with the assembled `configopts`, adding
    /// `--prefix` unless the block already set one.
    ///
    /// # Errors
    ///
    /// [`BuildError::ExternalTool`] on non-zero exit.
    pub fn configure(ctx: &mut BuildContext) -> Result<CommandOutput, BuildError> {
        let prefix = ctx.installdir_str();
        ctx.cfg.configopts.insert("--prefix", Some(&prefix));
        let cmd = format!("./configure {}", ctx.cfg.configopts.render());
        ctx.run_checked(&cmd)
    }

    /// Run `make`, parallel when the context allows it, with the
    /// assembled `buildopts`.
    ///
    /// # Errors
    ///
    /// [`BuildError::ExternalTool`] on non-zero exit.
    pub fn build(ctx: &BuildContext) -> Result<CommandOutput, BuildError> {
        let mut cmd = String::from("make");
        if let Some(n) = ctx.parallel {
            cmd.push_str(&format!(" -j {n}"));
        }
        let buildopts = ctx.cfg.buildopts.render();
        if !buildopts.is_empty() {
            cmd.push(' ');
            cmd.push_str(&buildopts);
        }
        ctx.run_checked(&cmd)
    }

    /// Run `make install` with the assembled `buildopts`.
    ///
    /// # Errors
    ///
    /// [`BuildError::ExternalTool`] on non-zero exit.
    pub fn install(ctx: &BuildContext) -> Result<CommandOutput, BuildError> {
        let mut cmd = String::from("make install");
        let buildopts = ctx.cfg.buildopts.render();
        if !buildopts.is_empty() {
            cmd.push(' ');
            cmd.push_str(&buildopts);
        }
        ctx.run_checked(&cmd)
    }
}

/// Generic CMake steps; build and install fall through to `make`.
#[derive(Debug)]
pub struct CMakeMake;

impl CMakeMake {
    /// Run `cmake` against the source tree with the assembled `-D`
    /// flags, optionally in a separate build directory.
    ///
    /// # Errors
    ///
    /// [`BuildError::Io`] when the build directory cannot be created,
    /// [`BuildError::ExternalTool`] on non-zero exit.
    pub fn configure(
        ctx: &mut BuildContext,
        separate_build_dir: bool,
    ) -> Result<CommandOutput, BuildError> {
        if separate_build_dir {
            let build_dir = ctx.sourcedir.join("build");
            std::fs::create_dir_all(&build_dir)?;
            ctx.build_dir = build_dir;
        }
        let prefix = ctx.installdir_str();
        ctx.cfg
            .configopts
            .insert("-DCMAKE_INSTALL_PREFIX", Some(&prefix));
        let cmd = format!(
            "cmake {} {}",
            ctx.cfg.configopts.render(),
            ctx.sourcedir.display()
        );
        ctx.run_checked(&cmd)
    }
}
