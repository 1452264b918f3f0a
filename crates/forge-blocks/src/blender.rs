//! Build block for Blender.
//!
//! Blender builds with CMake out-of-tree. The block pins a set of
//! default `-D` options (SSE detection off so the toolchain keeps
//! control of optimization flags, no portable install, no build info)
//! and wires in the optional Python, OpenEXR, OpenColorIO and CUDA
//! dependencies when the framework resolved them.

use std::path::PathBuf;

use forge_core::context::BuildContext;
use forge_core::error::BuildError;
use forge_core::fsutil::{find_unique_match, shared_lib_ext};
use forge_core::lifecycle::{BuildSteps, CMakeMake};
use forge_core::sanity::{verify_installed, SanityPaths};
use forge_core::version::Release;

/// CMake options applied unless the spec file already set the key.
/// These are needed unless extra dependencies are added for them to
/// work.
const DEFAULT_CMAKE_OPTS: &[(&str, &str)] = &[
    ("-DWITH_INSTALL_PORTABLE", "OFF"),
    ("-DWITH_BUILDINFO", "OFF"),
    ("-DWITH_CPU_SSE", "OFF"),
    ("-DCMAKE_C_FLAGS_RELEASE", "-DNDEBUG"),
    ("-DCMAKE_CXX_FLAGS_RELEASE", "-DNDEBUG"),
    ("-DWITH_GAMEENGINE", "OFF"),
    ("-DWITH_SYSTEM_GLEW", "OFF"),
];

/// Blender's CMake build.
#[derive(Debug, Default)]
pub struct BlenderBlock;

impl BlenderBlock {
    /// New Blender block.
    pub fn new() -> Self {
        Self
    }

    fn wire_python(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let Some(python_root) = ctx.deps.root("Python").map(PathBuf::from) else {
            return Ok(());
        };
        let pyver = ctx
            .deps
            .version("Python")
            .ok_or_else(|| {
                BuildError::MissingRequiredDependency("Python version".to_string())
            })?
            .to_string();
        let pyshortver = Release::parse(&pyver)?.short(2);
        let shlib_ext = shared_lib_ext();

        let site_packages = python_root
            .join("lib")
            .join(format!("python{pyshortver}"))
            .join("site-packages");

        let numpy_root = find_unique_match(&format!(
            "{}/numpy-*-py{pyshortver}-linux-x86_64.egg",
            site_packages.display()
        ))?;
        let requests_root = find_unique_match(&format!(
            "{}/requests-*-py{pyshortver}.egg",
            site_packages.display()
        ))?;
        let python_lib = find_unique_match(&format!(
            "{}/lib/libpython{pyshortver}*.{shlib_ext}",
            python_root.display()
        ))?;
        let python_include_dir = find_unique_match(&format!(
            "{}/include/python{pyshortver}*",
            python_root.display()
        ))?;

        let opts = &mut ctx.cfg.configopts;
        opts.insert("-DPYTHON_VERSION", Some(&pyshortver));
        opts.insert("-DPYTHON_LIBRARY", Some(&python_lib.display().to_string()));
        opts.insert(
            "-DPYTHON_INCLUDE_DIR",
            Some(&python_include_dir.display().to_string()),
        );
        opts.insert("-DPYTHON_NUMPY_PATH", Some(&numpy_root.display().to_string()));
        opts.insert(
            "-DPYTHON_REQUESTS_PATH",
            Some(&requests_root.display().to_string()),
        );
        Ok(())
    }
}

impl BuildSteps for BlenderBlock {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        ctx.cfg.configopts.apply_defaults(DEFAULT_CMAKE_OPTS);

        self.wire_python(ctx)?;

        if let Some(openexr_root) = ctx.deps.root("OpenEXR").map(PathBuf::from) {
            let include = openexr_root.join("include").display().to_string();
            ctx.cfg
                .configopts
                .insert("-DOPENEXR_INCLUDE_DIR", Some(&include));
        }

        if ctx.deps.root("OpenColorIO").is_some() {
            ctx.cfg.configopts.insert("-DWITH_OPENCOLORIO", Some("ON"));
        }

        if ctx.deps.root("CUDA").is_some() {
            ctx.cfg
                .configopts
                .insert("-DWITH_CYCLES_CUDA_BINARIES", Some("ON"));
        }

        CMakeMake::configure(ctx, true).map(|_| ())
    }

    fn sanity_check(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let paths = SanityPaths {
            files: vec![PathBuf::from("bin/blender")],
            dirs: vec![],
        };
        verify_installed(&ctx.installdir, &paths)
    }
}
