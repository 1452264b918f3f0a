//! Per-build state handed through the lifecycle.

use std::path::PathBuf;

use crate::deps::DependencyIndex;
use crate::env::{EnvMap, EnvOverlay};
use crate::error::BuildError;
use crate::module_env::ModuleEnv;
use crate::options::PackageConfig;
use crate::run::{output_tail, CommandOutput, CommandRunner};
use crate::version::Release;

/// Number of output lines quoted when an external command fails.
const FAILURE_TAIL_LINES: usize = 20;

/// Everything one package build carries between lifecycle phases.
///
/// Held and mutated by exactly one block at a time; the orchestrator
/// runs packages sequentially, so there is no shared state here.
#[derive(Debug)]
pub struct BuildContext {
    /// Package name.
    pub name: String,
    /// Pinned package version.
    pub version: Release,
    /// Options and flag sets being assembled.
    pub cfg: PackageConfig,
    /// Resolved dependency roots.
    pub deps: DependencyIndex,
    /// Inbound environment (toolchain, dependency lib triples).
    pub env: EnvMap,
    /// Outbound environment for spawned commands.
    pub overlay: EnvOverlay,
    /// Module environment collected for the module-file generator.
    pub module_env: ModuleEnv,
    /// Unpacked source tree.
    pub sourcedir: PathBuf,
    /// Install prefix.
    pub installdir: PathBuf,
    /// Working directory for build commands; normally the source tree,
    /// redirected by blocks that build out-of-tree.
    pub build_dir: PathBuf,
    /// `make -j` level; `None` disables parallel make entirely.
    pub parallel: Option<usize>,
    runner: Box<dyn CommandRunner>,
}

impl BuildContext {
    /// Assemble a context for one package build.
    ///
    /// The parallel level comes from the `parallel` option when set,
    /// otherwise from the logical CPU count.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        version: Release,
        cfg: PackageConfig,
        deps: DependencyIndex,
        env: EnvMap,
        sourcedir: PathBuf,
        installdir: PathBuf,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        let parallel = cfg
            .int_opt("parallel")
            .map_or_else(num_cpus::get, |n| n.max(1) as usize);
        Self {
            name: name.to_string(),
            version,
            cfg,
            deps,
            env,
            overlay: EnvOverlay::new(),
            module_env: ModuleEnv::new(),
            build_dir: sourcedir.clone(),
            sourcedir,
            installdir,
            parallel: Some(parallel),
            runner,
        }
    }

    /// Run a command in the build directory with the overlay applied,
    /// returning its output regardless of exit code.
    ///
    /// # Errors
    ///
    /// Only when the command cannot be spawned.
    pub fn run(&self, cmd: &str) -> Result<CommandOutput, BuildError> {
        self.runner.run(cmd, &self.build_dir, &self.overlay)
    }

    /// Run a command and fail on a non-zero exit, quoting the tail of
    /// its output.
    ///
    /// # Errors
    ///
    /// [`BuildError::ExternalTool`] on spawn failure or non-zero exit.
    pub fn run_checked(&self, cmd: &str) -> Result<CommandOutput, BuildError> {
        let out = self.run(cmd)?;
        if !out.success() {
            return Err(BuildError::ExternalTool(format!(
                "`{cmd}` exited with code {}:\n{}",
                out.code,
                output_tail(&out.stdout, FAILURE_TAIL_LINES)
            )));
        }
        Ok(out)
    }

    /// Install prefix as a string, for flag values.
    pub fn installdir_str(&self) -> String {
        self.installdir.display().to_string()
    }
}
