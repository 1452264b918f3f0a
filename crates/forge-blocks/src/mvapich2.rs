//! Build block for the MVAPICH2 MPI library.
//!
//! A plain Autotools build with compiler-dependent configure options:
//! RDMA transport selection, POSIX threads, optional MPE, LiMIC2,
//! BLCR checkpointing and hwloc support. MVAPICH2 2.1 picks up
//! MPICH 3.1.1's renamed libraries, which changes what the sanity
//! check must look for.

use std::path::PathBuf;

use forge_core::context::BuildContext;
use forge_core::error::BuildError;
use forge_core::fsutil::shared_lib_ext;
use forge_core::lifecycle::{BuildSteps, ConfigureMake};
use forge_core::sanity::{verify_installed, SanityPaths};

/// MVAPICH2's Autotools build.
#[derive(Debug, Default)]
pub struct Mvapich2Block;

impl Mvapich2Block {
    /// New MVAPICH2 block.
    pub fn new() -> Self {
        Self
    }
}

impl BuildSteps for Mvapich2Block {
    fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let rdma_type = ctx
            .cfg
            .str_opt("rdma_type")
            .unwrap_or("gen2")
            .to_string();
        let debug = ctx.cfg.bool_opt("debug");
        let withmpe = ctx.cfg.bool_opt("withmpe");
        let withlimic2 = ctx.cfg.bool_opt("withlimic2");
        let withchkpt = ctx.cfg.bool_opt("withchkpt");
        let withhwloc = ctx.cfg.bool_opt("withhwloc");
        let blcr_path = ctx.cfg.str_opt("blcr_path").map(str::to_string);
        let blcr_inc_path = ctx.cfg.str_opt("blcr_inc_path").map(str::to_string);
        let blcr_lib_path = ctx.cfg.str_opt("blcr_lib_path").map(str::to_string);

        let opts = &mut ctx.cfg.configopts;
        opts.insert("--with-rdma", Some(&rdma_type));

        // POSIX threads
        opts.insert("--with-thread-package", Some("pthreads"));

        if debug {
            // error checking, timing and debug info; affects performance
            opts.insert("--enable-fast", Some("none"));
        } else {
            opts.insert("--enable-fast", None);
        }

        // shared libraries, using GCC and GNU ld options
        opts.insert("--enable-shared", None);
        opts.insert("--enable-sharedlibs", Some("gcc"));

        // Fortran 77/90 and C++ bindings
        opts.insert("--enable-f77", None);
        opts.insert("--enable-fc", None);
        opts.insert("--enable-cxx", None);

        if withmpe {
            opts.insert("--enable-mpe", None);
        }
        if withlimic2 {
            opts.insert("--enable-limic2", None);
        }
        if withchkpt {
            opts.insert("--enable-checkpointing", None);
            opts.insert("--with-hydra-ckpointlib", Some("blcr"));
        }
        if withhwloc {
            opts.insert("--with-hwloc", None);
        }

        if let Some(path) = blcr_path {
            opts.insert("--with-blcr", Some(&path));
        }
        if let Some(path) = blcr_inc_path {
            opts.insert("--with-blcr-include", Some(&path));
        }
        if let Some(path) = blcr_lib_path {
            opts.insert("--with-blcr-libpath", Some(&path));
        }

        ConfigureMake::configure(ctx).map(|_| ())
    }

    fn sanity_check(&mut self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        // MVAPICH2 >= 2.1 depends on MPICH >= 3.1.1, which renamed the
        // libraries from libmpich/libopa/libmpl to libmpi.
        let use_new_libnames = ctx.version.at_least("2.1");
        let libnames: &[&str] = if use_new_libnames {
            &["mpi"]
        } else {
            &["mpich", "opa", "mpl"]
        };
        let ext = shared_lib_ext();

        let mut files = vec![PathBuf::from("bin/mpiexec.mpirun_rsh")];
        for lib in libnames {
            files.push(PathBuf::from(format!("lib/lib{lib}.{ext}")));
        }
        files.push(PathBuf::from("include/mpi.h"));

        let paths = SanityPaths {
            files,
            dirs: vec![PathBuf::from("bin"), PathBuf::from("include")],
        };
        verify_installed(&ctx.installdir, &paths)
    }
}
