//! Build block for PETSc.
//!
//! PETSc ships its own Python configure script whose flag vocabulary
//! changed across release eras, so the whole configure/install plan is
//! picked once from a closed strategy set:
//!
//! - [`PetscStrategy::Legacy`] - versions before 3: short configure via
//!   `./config/configure.py`, install by symlinking the generated
//!   bmake headers.
//! - [`PetscStrategy::Prefix`] - 3.x with a normal `--prefix` install.
//! - [`PetscStrategy::SourceInstall`] - 3.x built inside the install
//!   prefix; configure runs without `--prefix` and the `PETSC_ARCH`
//!   it prints becomes part of every later path.
//!
//! The configure script is not trusted to fail loudly: its output is
//! scanned for the `ERROR` marker and the build aborts on a hit even
//! when the exit code was zero.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use forge_core::context::BuildContext;
use forge_core::deps::lib_info;
use forge_core::error::BuildError;
use forge_core::fsutil::shared_lib_ext;
use forge_core::lifecycle::{BuildSteps, ConfigureMake};
use forge_core::module_env::ROOT_TOKEN;
use forge_core::options::MissingPathPolicy;
use forge_core::sanity::{verify_installed, SanityPaths};
use forge_core::version::Release;

/// Marker substring in configure output that means failure regardless
/// of the exit code.
const ERROR_MARKER: &str = "ERROR";

/// Dependencies wired up explicitly; the generic dependency loop must
/// skip them.
const HANDLED_SEPARATELY: &[&str] = &[
    "BLACS",
    "BLAS",
    "FFTW",
    "LAPACK",
    "numpy",
    "CMake",
    "mpi4py",
    "papi",
    "ScaLAPACK",
    "SuiteSparse",
];

/// SuiteSparse member libraries for PETSc >= 3.5; the order matters to
/// the linker.
const SUITESPARSE_LIBS: &[&str] = &[
    "UMFPACK", "KLU", "CHOLMOD", "BTF", "CCOLAMD", "COLAMD", "CAMD", "AMD",
];

/// UMFPACK-era SuiteSparse members for PETSc < 3.5, again in link
/// order.
const UMFPACK_LIBS: &[&str] = &["UMFPACK", "CHOLMOD", "COLAMD", "AMD"];

/// Headers the legacy install symlinks out of the bmake tree.
const LEGACY_HEADERS: &[&str] = &[
    "petscconf.h",
    "petscconfiginfo.h",
    "petscfix.h",
    "petscmachineinfo.h",
];

/// The mutually exclusive configure/install plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetscStrategy {
    /// Versions before 3.
    Legacy,
    /// 3.x, regular `--prefix` install.
    Prefix,
    /// 3.x, built and used inside the install prefix.
    SourceInstall,
}

impl PetscStrategy {
    /// Pick the strategy for a version/config pair. Called once at
    /// configure time; the choice holds for the rest of the lifecycle.
    fn select(version: &Release, sourceinstall: bool) -> Self {
        if !version.at_least("3") {
            PetscStrategy::Legacy
        } else if sourceinstall {
            PetscStrategy::SourceInstall
        } else {
            PetscStrategy::Prefix
        }
    }
}

/// PETSc's configure-script build.
#[derive(Debug, Default)]
pub struct PetscBlock {
    strategy: Option<PetscStrategy>,
    petsc_arch: String,
    petsc_subdir: String,
}

impl PetscBlock {
    /// New PETSc block.
    pub fn new() -> Self {
        Self::default()
    }

    fn strategy(&self, ctx: &BuildContext) -> PetscStrategy {
        self.strategy.unwrap_or_else(|| {
            PetscStrategy::select(&ctx.version, ctx.cfg.bool_opt("sourceinstall"))
        })
    }

    /// Install-relative prefixes `(subdir, subdir/arch)` for sanity
    /// checks and module paths; both empty unless source-installed.
    fn prefixes(&self, ctx: &BuildContext) -> (String, String) {
        match self.strategy(ctx) {
            PetscStrategy::SourceInstall => (
                self.petsc_subdir.clone(),
                format!("{}/{}", self.petsc_subdir, self.petsc_arch),
            ),
            _ => (String::new(), String::new()),
        }
    }

    fn wire_compilers(&self, ctx: &mut BuildContext, at35: bool) -> Result<(), BuildError> {
        let cc = ctx.env.require("CC")?.to_string();
        let cxx = ctx.env.require("CXX")?.to_string();
        let fc = ctx.env.require("F90")?.to_string();

        let opts = &mut ctx.cfg.configopts;
        opts.insert("--with-cc", Some(&format!("\"{cc}\"")));
        opts.insert("--with-cxx", Some(&format!("\"{cxx}\"")));
        opts.insert("--with-c++-support", None);
        opts.insert("--with-fc", Some(&format!("\"{fc}\"")));

        // Flag spellings changed at 3.5.
        let flag_vars = [
            ("CFLAGS", "--CFLAGS", "--with-cflags"),
            ("CXXFLAGS", "--CXXFLAGS", "--with-cxxflags"),
            ("F90FLAGS", "--FFLAGS", "--with-fcflags"),
        ];
        for (var, new_key, old_key) in flag_vars {
            let key = if at35 { new_key } else { old_key };
            match ctx.env.get(var).map(str::to_string) {
                Some(value) => {
                    ctx.cfg.configopts.insert(key, Some(&format!("\"{value}\"")));
                }
                None => debug!(var, "flag variable unset, not passing it through"),
            }
        }
        Ok(())
    }

    fn wire_papi(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        if !ctx.cfg.bool_opt("with_papi") {
            return Ok(());
        }
        let papi_inc = ctx
            .cfg
            .str_opt("papi_inc")
            .unwrap_or("/usr/include")
            .to_string();
        let papi_lib = ctx
            .cfg
            .str_opt("papi_lib")
            .unwrap_or("/usr/lib64/libpapi.so")
            .to_string();
        let papi_inc_file = Path::new(&papi_inc).join("papi.h");

        if papi_inc_file.is_file() && Path::new(&papi_lib).is_file() {
            let opts = &mut ctx.cfg.configopts;
            opts.insert("--with-papi", Some("1"));
            opts.insert("--with-papi-include", Some(&papi_inc));
            opts.insert("--with-papi-lib", Some(&papi_lib));
            return Ok(());
        }

        let policy = MissingPathPolicy::from_option(ctx.cfg.str_opt("on_bad_papi"));
        match policy {
            MissingPathPolicy::Fail => Err(BuildError::MissingRequiredDependency(format!(
                "PAPI header ({}) and/or library ({papi_lib})",
                papi_inc_file.display()
            ))),
            MissingPathPolicy::Warn => {
                warn!(
                    header = %papi_inc_file.display(),
                    library = %papi_lib,
                    "PAPI paths not found, disabling PAPI support"
                );
                Ok(())
            }
        }
    }

    /// Numerical libraries located through the `<NAME>_INC_DIR` /
    /// `_LIB_DIR` / `_STATIC_LIBS` environment triple.
    fn wire_lib_triple(&self, ctx: &mut BuildContext, name: &str) {
        match lib_info(&ctx.env, name) {
            Some(info) => {
                let with_arg = format!("--with-{}", name.to_lowercase());
                let opts = &mut ctx.cfg.configopts;
                opts.insert(&with_arg, Some("1"));
                opts.insert(&format!("{with_arg}-include"), Some(&info.inc_dir));
                opts.insert(&format!("{with_arg}-lib"), Some(&info.lib_spec()));
            }
            None => {
                info!(dependency = name, "missing inc/lib info, not enabling support");
            }
        }
    }

    fn wire_suitesparse(&self, ctx: &mut BuildContext, at35: bool) {
        let Some(root) = ctx.deps.root("SuiteSparse").map(PathBuf::from) else {
            return;
        };
        if at35 {
            let mut libs: Vec<String> = SUITESPARSE_LIBS
                .iter()
                .map(|l| {
                    root.join(l)
                        .join("Lib")
                        .join(format!("lib{}.a", l.to_lowercase()))
                        .display()
                        .to_string()
                })
                .collect();
            let mut incs: Vec<String> = SUITESPARSE_LIBS
                .iter()
                .map(|l| root.join(l).join("Include").display().to_string())
                .collect();
            libs.push(
                root.join("SuiteSparse_config")
                    .join("libsuitesparseconfig.a")
                    .display()
                    .to_string(),
            );
            incs.push(root.join("SuiteSparse_config").display().to_string());

            let opts = &mut ctx.cfg.configopts;
            opts.insert("--with-suitesparse", Some("1"));
            opts.insert(
                "--with-suitesparse-include",
                Some(&format!("[{}]", incs.join(","))),
            );
            opts.insert(
                "--with-suitesparse-lib",
                Some(&format!("[{}]", libs.join(","))),
            );
        } else {
            // CHOLMOD and UMFPACK are part of SuiteSparse here.
            let libs: Vec<String> = UMFPACK_LIBS
                .iter()
                .map(|l| {
                    root.join(l)
                        .join("Lib")
                        .join(format!("lib{}.a", l.to_lowercase()))
                        .display()
                        .to_string()
                })
                .collect();
            let include = root.join("UMFPACK").join("Include").display().to_string();

            let opts = &mut ctx.cfg.configopts;
            opts.insert("--with-umfpack", Some("1"));
            opts.insert("--with-umfpack-include", Some(&include));
            opts.insert("--with-umfpack-lib", Some(&format!("[{}]", libs.join(","))));
        }
    }

    /// The generic dependency loop: every runtime dependency not
    /// handled separately gets `--with-<name>=1 --with-<name>-dir=…`.
    /// SCOTCH's flag prefix became `ptscotch` at 3.5.
    fn wire_generic_deps(&self, ctx: &mut BuildContext, at35: bool) {
        let deps: Vec<(String, PathBuf)> = ctx
            .deps
            .runtime_names()
            .filter(|name| !HANDLED_SEPARATELY.contains(name))
            .filter_map(|name| {
                ctx.deps
                    .root(name)
                    .map(|root| (name.to_string(), root.to_path_buf()))
            })
            .collect();

        for (name, root) in deps {
            let withdep = if at35 && name.to_uppercase() == "SCOTCH" {
                "--with-ptscotch".to_string()
            } else {
                format!("--with-{}", name.to_lowercase())
            };
            let opts = &mut ctx.cfg.configopts;
            opts.insert(&withdep, Some("1"));
            opts.insert(&format!("{withdep}-dir"), Some(&root.display().to_string()));
        }
    }

    fn configure_modern(
        &mut self,
        ctx: &mut BuildContext,
        strategy: PetscStrategy,
    ) -> Result<(), BuildError> {
        let at35 = ctx.version.at_least("3.5");
        let shared = ctx.cfg.bool_opt("shared_libs");

        self.wire_compilers(ctx, at35)?;

        if ctx
            .cfg
            .str_opt("toolchain_family")
            .is_some_and(|family| family != "GCC")
        {
            ctx.cfg.configopts.insert("--with-gnu-compilers", Some("0"));
        }

        if ctx.cfg.bool_opt("usempi") {
            ctx.cfg.configopts.insert("--with-mpi", Some("1"));
        }

        // build options
        let np = ctx.parallel.unwrap_or(1).to_string();
        let debugging = u8::from(ctx.cfg.bool_opt("debug")).to_string();
        let pic = u8::from(ctx.cfg.bool_opt("pic")).to_string();
        let opts = &mut ctx.cfg.configopts;
        opts.insert("--with-build-step-np", Some(&np));
        opts.insert("--with-shared-libraries", Some(&u8::from(shared).to_string()));
        opts.insert("--with-debugging", Some(&debugging));
        opts.insert("--with-pic", Some(&pic));
        opts.insert("--with-x", Some("0"));
        opts.insert("--with-windows-graphics", Some("0"));

        self.wire_papi(ctx)?;

        if ctx.deps.root("Python").is_some() {
            ctx.cfg.configopts.insert("--with-numpy", Some("1"));
            if shared {
                ctx.cfg.configopts.insert("--with-mpi4py", Some("1"));
            }
        }

        if at35 {
            // BLACS folded into ScaLAPACK for these releases.
            self.wire_lib_triple(ctx, "FFTW");
            self.wire_lib_triple(ctx, "ScaLAPACK");
        } else {
            for dep in ["BLACS", "FFTW", "ScaLAPACK"] {
                self.wire_lib_triple(ctx, dep);
            }
        }

        // BLAS/LAPACK is required, not optional.
        let bl_libdir = ctx.env.require("BLAS_LAPACK_LIB_DIR")?.to_string();
        let bl_libs = ctx.env.require("BLAS_LAPACK_STATIC_LIBS")?.to_string();
        ctx.cfg.configopts.insert(
            "--with-blas-lapack-lib",
            Some(&format!("[{bl_libdir}/{bl_libs}]")),
        );

        self.wire_generic_deps(ctx, at35);
        self.wire_suitesparse(ctx, at35);

        // PETSC_DIR for configure (env) and the make invocations.
        let start_dir = ctx.sourcedir.display().to_string();
        ctx.overlay.set("PETSC_DIR", &start_dir);
        ctx.cfg.buildopts.insert("PETSC_DIR", Some(&start_dir));

        let out = match strategy {
            PetscStrategy::SourceInstall => {
                // configure must run without --prefix here
                let cmd = format!("./configure {}", ctx.cfg.configopts.render());
                ctx.run_checked(&cmd)?
            }
            _ => ConfigureMake::configure(ctx)?,
        };

        if out.stdout.contains(ERROR_MARKER) {
            return Err(BuildError::ExternalTool(
                "error(s) detected in configure output".to_string(),
            ));
        }

        if strategy == PetscStrategy::SourceInstall {
            let arch_re = Regex::new(r"(?m)^\s*PETSC_ARCH:\s*(\S+)$").unwrap();
            match arch_re.captures(&out.stdout) {
                Some(caps) => {
                    self.petsc_arch = caps[1].to_string();
                    ctx.cfg
                        .buildopts
                        .insert("PETSC_ARCH", Some(&self.petsc_arch));
                }
                None => {
                    return Err(BuildError::ExternalTool(
                        "failed to determine PETSC_ARCH setting from configure output"
                            .to_string(),
                    ));
                }
            }
        }

        self.petsc_subdir = format!("{}-{}", ctx.name.to_lowercase(), ctx.version);

        // make for these releases no longer accepts -j
        if at35 {
            ctx.parallel = None;
        }
        Ok(())
    }

    fn configure_legacy(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let prefix = ctx.installdir_str();
        ctx.cfg.configopts.insert("--prefix", Some(&prefix));
        ctx.cfg.configopts.insert("--with-shared", Some("1"));

        if let Some(root) = ctx.deps.root("SCOTCH").map(PathBuf::from) {
            let opts = &mut ctx.cfg.configopts;
            opts.insert("--with-scotch", Some("1"));
            opts.insert("--with-scotch-dir", Some(&root.display().to_string()));
        }

        let cmd = format!("./config/configure.py {}", ctx.cfg.configopts.render());
        ctx.run_checked(&cmd)?;
        Ok(())
    }
}

impl BuildSteps for PetscBlock {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let strategy =
            PetscStrategy::select(&ctx.version, ctx.cfg.bool_opt("sourceinstall"));
        self.strategy = Some(strategy);
        match strategy {
            PetscStrategy::Legacy => self.configure_legacy(ctx),
            _ => self.configure_modern(ctx, strategy),
        }
    }

    fn install(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        match self.strategy(ctx) {
            PetscStrategy::Prefix => ConfigureMake::install(ctx).map(|_| ()),
            // Already living in the install prefix.
            PetscStrategy::SourceInstall => Ok(()),
            PetscStrategy::Legacy => {
                let includedir = ctx.installdir.join("include");
                let bmakedir = ctx.installdir.join("bmake").join("linux-gnu-c-opt");
                std::fs::create_dir_all(&includedir)?;
                for header in LEGACY_HEADERS {
                    #[cfg(unix)]
                    std::os::unix::fs::symlink(bmakedir.join(header), includedir.join(header))?;
                    #[cfg(not(unix))]
                    std::fs::copy(bmakedir.join(header), includedir.join(header))?;
                }
                Ok(())
            }
        }
    }

    fn sanity_check(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let (prefix1, prefix2) = self.prefixes(ctx);
        let libext = if ctx.cfg.bool_opt("shared_libs") {
            shared_lib_ext()
        } else {
            "a"
        };

        let paths = SanityPaths {
            files: vec![PathBuf::from(join_rel(&prefix2, &format!("lib/libpetsc.{libext}")))],
            dirs: vec![
                PathBuf::from(join_rel(&prefix1, "bin")),
                PathBuf::from(join_rel(&prefix2, "conf")),
                PathBuf::from(join_rel(&prefix1, "include")),
                PathBuf::from(join_rel(&prefix2, "include")),
            ],
        };
        verify_installed(&ctx.installdir, &paths)
    }

    fn module_env(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let (prefix1, prefix2) = self.prefixes(ctx);

        ctx.module_env
            .set_search_paths("PATH", vec![join_rel(&prefix1, "bin")]);
        ctx.module_env.set_search_paths(
            "CPATH",
            vec![join_rel(&prefix2, "include"), join_rel(&prefix1, "include")],
        );
        ctx.module_env
            .set_search_paths("LD_LIBRARY_PATH", vec![join_rel(&prefix2, "lib")]);

        if self.strategy(ctx) == PetscStrategy::SourceInstall {
            ctx.module_env.set_environment(
                "PETSC_DIR",
                &format!("{ROOT_TOKEN}/{}", self.petsc_subdir),
            );
            ctx.module_env
                .set_environment("PETSC_ARCH", &self.petsc_arch);
        } else {
            ctx.module_env.set_environment("PETSC_DIR", ROOT_TOKEN);
        }
        Ok(())
    }
}

/// Join an install-relative prefix with a subpath, dropping the
/// separator when the prefix is empty.
fn join_rel(prefix: &str, rel: &str) -> String {
    if prefix.is_empty() {
        rel.to_string()
    } else {
        format!("{prefix}/{rel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::deps::{DepEntry, DependencyIndex};
    use forge_core::env::EnvMap;
    use forge_core::options::{OptionValue, PackageConfig};
    use forge_core::run::{CommandOutput, ScriptedRunner};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::tempdir;

    fn toolchain_env() -> EnvMap {
        let mut env = EnvMap::new();
        env.set("CC", "mpicc");
        env.set("CXX", "mpicxx");
        env.set("F90", "mpif90");
        env.set("CFLAGS", "-O2");
        env.set("CXXFLAGS", "-O2");
        env.set("F90FLAGS", "-O2");
        env.set("BLAS_LAPACK_LIB_DIR", "/opt/lapack/lib");
        env.set("BLAS_LAPACK_STATIC_LIBS", "liblapack.a,libblas.a");
        env
    }

    fn petsc_ctx(
        version: &str,
        cfg: PackageConfig,
        deps: DependencyIndex,
        env: EnvMap,
        runner: ScriptedRunner,
    ) -> (BuildContext, Rc<RefCell<Vec<String>>>) {
        let log = runner.command_log();
        let mut ctx = BuildContext::new(
            "PETSc",
            Release::parse(version).unwrap(),
            cfg,
            deps,
            env,
            PathBuf::from("/build/petsc"),
            PathBuf::from("/software/PETSc"),
            Box::new(runner),
        );
        ctx.parallel = Some(8);
        (ctx, log)
    }

    #[test]
    fn test_legacy_baseline_flag_set() {
        // Version 2.0 with no optional deps: exactly the fixed flags.
        let (mut ctx, log) = petsc_ctx(
            "2.0",
            PackageConfig::default(),
            DependencyIndex::new(),
            EnvMap::new(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["./config/configure.py --prefix=/software/PETSc --with-shared=1".to_string()]
        );
    }

    #[test]
    fn test_legacy_scotch_uses_plain_prefix() {
        let mut deps = DependencyIndex::new();
        deps.add(
            "SCOTCH",
            DepEntry {
                root: PathBuf::from("/opt/scotch/5.1"),
                version: None,
                build_only: false,
            },
        );
        let (mut ctx, log) = petsc_ctx(
            "2.3.3",
            PackageConfig::default(),
            deps,
            EnvMap::new(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-scotch=1"));
        assert!(cmd.contains("--with-scotch-dir=/opt/scotch/5.1"));
    }

    #[test]
    fn test_flag_spelling_switches_at_3_5() {
        let (mut ctx, log) = petsc_ctx(
            "3.4",
            PackageConfig::default(),
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let old_cmd = log.borrow()[0].clone();
        assert!(old_cmd.contains("--with-cflags=\"-O2\""));
        assert!(!old_cmd.contains("--CFLAGS"));

        let (mut ctx, log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let new_cmd = log.borrow()[0].clone();
        assert!(new_cmd.contains("--CFLAGS=\"-O2\""));
        assert!(!new_cmd.contains("--with-cflags"));
    }

    #[test]
    fn test_scotch_becomes_ptscotch_at_3_5() {
        let mut deps = DependencyIndex::new();
        deps.add(
            "SCOTCH",
            DepEntry {
                root: PathBuf::from("/opt/scotch/6.0"),
                version: None,
                build_only: false,
            },
        );

        let (mut ctx, log) = petsc_ctx(
            "3.4",
            PackageConfig::default(),
            deps.clone(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-scotch=1"));
        assert!(cmd.contains("--with-scotch-dir=/opt/scotch/6.0"));

        let (mut ctx, log) = petsc_ctx(
            "3.5.1",
            PackageConfig::default(),
            deps,
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-ptscotch=1"));
        assert!(cmd.contains("--with-ptscotch-dir=/opt/scotch/6.0"));
        assert!(!cmd.contains("--with-scotch=1"));
    }

    #[test]
    fn test_missing_blas_lapack_is_fatal() {
        let mut env = toolchain_env();
        env.set("BLAS_LAPACK_LIB_DIR", "");
        let (mut ctx, _log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            DependencyIndex::new(),
            env,
            ScriptedRunner::new(),
        );
        let err = PetscBlock::new().configure(&mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::MissingRequiredDependency(_)));
        assert!(err.to_string().contains("BLAS_LAPACK_LIB_DIR"));
    }

    #[test]
    fn test_lib_triple_absent_emits_no_flags() {
        let (mut ctx, log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(!cmd.contains("--with-fftw"));
        assert!(!cmd.contains("--with-scalapack"));
    }

    #[test]
    fn test_lib_triple_present_emits_include_and_lib() {
        let mut env = toolchain_env();
        env.set("FFTW_INC_DIR", "/opt/fftw/include");
        env.set("FFTW_LIB_DIR", "/opt/fftw/lib");
        env.set("FFTW_STATIC_LIBS", "libfftw3.a");
        let (mut ctx, log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            DependencyIndex::new(),
            env,
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-fftw=1"));
        assert!(cmd.contains("--with-fftw-include=/opt/fftw/include"));
        assert!(cmd.contains("--with-fftw-lib=[/opt/fftw/lib/libfftw3.a]"));
    }

    #[test]
    fn test_blacs_loop_only_before_3_5() {
        let mut env = toolchain_env();
        env.set("BLACS_INC_DIR", "/opt/blacs/include");
        env.set("BLACS_LIB_DIR", "/opt/blacs/lib");
        env.set("BLACS_STATIC_LIBS", "libblacs.a");

        let (mut ctx, log) = petsc_ctx(
            "3.4",
            PackageConfig::default(),
            DependencyIndex::new(),
            env.clone(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        assert!(log.borrow()[0].contains("--with-blacs=1"));

        let (mut ctx, log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            DependencyIndex::new(),
            env,
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        assert!(!log.borrow()[0].contains("--with-blacs"));
    }

    #[test]
    fn test_suitesparse_era_switch() {
        let mut deps = DependencyIndex::new();
        deps.add(
            "SuiteSparse",
            DepEntry {
                root: PathBuf::from("/opt/ss"),
                version: None,
                build_only: false,
            },
        );

        let (mut ctx, log) = petsc_ctx(
            "3.4",
            PackageConfig::default(),
            deps.clone(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-umfpack=1"));
        assert!(cmd.contains("--with-umfpack-include=/opt/ss/UMFPACK/Include"));
        // Link order preserved.
        assert!(cmd.contains(
            "--with-umfpack-lib=[/opt/ss/UMFPACK/Lib/libumfpack.a,\
             /opt/ss/CHOLMOD/Lib/libcholmod.a,\
             /opt/ss/COLAMD/Lib/libcolamd.a,\
             /opt/ss/AMD/Lib/libamd.a]"
        ));

        let (mut ctx, log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            deps,
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-suitesparse=1"));
        assert!(cmd.contains("libsuitesparseconfig.a"));
        assert!(!cmd.contains("--with-umfpack"));
        // UMFPACK still leads the ordered member list.
        let umf = cmd.find("libumfpack.a").unwrap();
        let amd = cmd.find("/opt/ss/AMD/Lib/libamd.a").unwrap();
        assert!(umf < amd);
    }

    #[test]
    fn test_error_marker_fails_despite_exit_zero() {
        let runner = ScriptedRunner::new();
        runner.push_output(CommandOutput::ok(
            "Compilers:\n  C Compiler: mpicc\nERROR: could not locate MPI\n",
        ));
        let (mut ctx, _log) = petsc_ctx(
            "3.4",
            PackageConfig::default(),
            DependencyIndex::new(),
            toolchain_env(),
            runner,
        );
        let err = PetscBlock::new().configure(&mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::ExternalTool(_)));
    }

    #[test]
    fn test_source_install_extracts_petsc_arch() {
        let runner = ScriptedRunner::new();
        runner.push_output(CommandOutput::ok(
            "Configure complete\n  PETSC_ARCH: arch-linux2-c-opt\n",
        ));
        let mut cfg = PackageConfig::default();
        cfg.set_option("sourceinstall", OptionValue::Bool(true));
        let (mut ctx, log) = petsc_ctx(
            "3.5.1",
            cfg,
            DependencyIndex::new(),
            toolchain_env(),
            runner,
        );
        let mut block = PetscBlock::new();
        block.configure(&mut ctx).unwrap();

        // No --prefix for a source install.
        assert!(!log.borrow()[0].contains("--prefix"));
        assert_eq!(block.petsc_arch, "arch-linux2-c-opt");
        assert_eq!(ctx.cfg.buildopts.value_of("PETSC_ARCH"), Some("arch-linux2-c-opt"));
        assert_eq!(ctx.cfg.buildopts.value_of("PETSC_DIR"), Some("/build/petsc"));

        block.module_env(&mut ctx).unwrap();
        assert_eq!(
            ctx.module_env.entries(),
            &[
                ("PETSC_DIR".to_string(), "$root/petsc-3.5.1".to_string()),
                ("PETSC_ARCH".to_string(), "arch-linux2-c-opt".to_string()),
            ]
        );
    }

    #[test]
    fn test_source_install_without_arch_in_output_fails() {
        let runner = ScriptedRunner::new();
        runner.push_output(CommandOutput::ok("Configure complete\n"));
        let mut cfg = PackageConfig::default();
        cfg.set_option("sourceinstall", OptionValue::Bool(true));
        let (mut ctx, _log) = petsc_ctx(
            "3.5.1",
            cfg,
            DependencyIndex::new(),
            toolchain_env(),
            runner,
        );
        let err = PetscBlock::new().configure(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("PETSC_ARCH"));
    }

    #[test]
    fn test_parallel_make_disabled_at_3_5() {
        let (mut ctx, _log) = petsc_ctx(
            "3.5",
            PackageConfig::default(),
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        assert_eq!(ctx.parallel, None);

        let (mut ctx, _log) = petsc_ctx(
            "3.4",
            PackageConfig::default(),
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        assert_eq!(ctx.parallel, Some(8));
    }

    #[test]
    fn test_papi_policy_warn_continues_without_flags() {
        let mut cfg = PackageConfig::default();
        cfg.set_option("with_papi", OptionValue::Bool(true));
        cfg.set_option("papi_inc", OptionValue::Str("/nonexistent/include".into()));
        cfg.set_option("papi_lib", OptionValue::Str("/nonexistent/libpapi.so".into()));
        cfg.set_option("on_bad_papi", OptionValue::Str("warn".into()));
        let (mut ctx, log) = petsc_ctx(
            "3.4",
            cfg,
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        assert!(!log.borrow()[0].contains("--with-papi"));
    }

    #[test]
    fn test_papi_policy_fail_aborts() {
        let mut cfg = PackageConfig::default();
        cfg.set_option("with_papi", OptionValue::Bool(true));
        cfg.set_option("papi_inc", OptionValue::Str("/nonexistent/include".into()));
        cfg.set_option("papi_lib", OptionValue::Str("/nonexistent/libpapi.so".into()));
        let (mut ctx, _log) = petsc_ctx(
            "3.4",
            cfg,
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        let err = PetscBlock::new().configure(&mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::MissingRequiredDependency(_)));
    }

    #[test]
    fn test_papi_present_emits_triple() {
        let tmp = tempdir().unwrap();
        let inc = tmp.path().join("include");
        std::fs::create_dir_all(&inc).unwrap();
        std::fs::write(inc.join("papi.h"), "").unwrap();
        let lib = tmp.path().join("libpapi.so");
        std::fs::write(&lib, "").unwrap();

        let mut cfg = PackageConfig::default();
        cfg.set_option("with_papi", OptionValue::Bool(true));
        cfg.set_option(
            "papi_inc",
            OptionValue::Str(inc.display().to_string()),
        );
        cfg.set_option("papi_lib", OptionValue::Str(lib.display().to_string()));
        let (mut ctx, log) = petsc_ctx(
            "3.4",
            cfg,
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        PetscBlock::new().configure(&mut ctx).unwrap();
        let cmd = log.borrow()[0].clone();
        assert!(cmd.contains("--with-papi=1"));
        assert!(cmd.contains(&format!("--with-papi-include={}", inc.display())));
    }

    #[test]
    fn test_sanity_paths_follow_source_install_layout() {
        let tmp = tempdir().unwrap();
        let subdir = tmp.path().join("petsc-3.5.1");
        let archdir = subdir.join("arch-linux2-c-opt");
        for dir in ["bin", "include"] {
            std::fs::create_dir_all(subdir.join(dir)).unwrap();
        }
        for dir in ["conf", "include", "lib"] {
            std::fs::create_dir_all(archdir.join(dir)).unwrap();
        }
        std::fs::write(archdir.join("lib/libpetsc.a"), "").unwrap();

        let mut cfg = PackageConfig::default();
        cfg.set_option("sourceinstall", OptionValue::Bool(true));
        let (mut ctx, _log) = petsc_ctx(
            "3.5.1",
            cfg,
            DependencyIndex::new(),
            toolchain_env(),
            ScriptedRunner::new(),
        );
        ctx.installdir = tmp.path().to_path_buf();

        let mut block = PetscBlock::new();
        block.strategy = Some(PetscStrategy::SourceInstall);
        block.petsc_arch = "arch-linux2-c-opt".to_string();
        block.petsc_subdir = "petsc-3.5.1".to_string();
        assert!(block.sanity_check(&mut ctx).is_ok());

        std::fs::remove_file(archdir.join("lib/libpetsc.a")).unwrap();
        let err = block.sanity_check(&mut ctx).unwrap_err();
        assert!(err
            .to_string()
            .contains("petsc-3.5.1/arch-linux2-c-opt/lib/libpetsc.a"));
    }

    #[test]
    fn test_legacy_install_symlinks_bmake_headers() {
        let tmp = tempdir().unwrap();
        let bmake = tmp.path().join("bmake/linux-gnu-c-opt");
        std::fs::create_dir_all(&bmake).unwrap();
        for header in LEGACY_HEADERS {
            std::fs::write(bmake.join(header), "").unwrap();
        }

        let (mut ctx, _log) = petsc_ctx(
            "2.3.3",
            PackageConfig::default(),
            DependencyIndex::new(),
            EnvMap::new(),
            ScriptedRunner::new(),
        );
        ctx.installdir = tmp.path().to_path_buf();

        let mut block = PetscBlock::new();
        block.strategy = Some(PetscStrategy::Legacy);
        block.install(&mut ctx).unwrap();

        for header in LEGACY_HEADERS {
            let linked = tmp.path().join("include").join(header);
            assert!(linked.exists(), "missing {header}");
        }
    }
}
