//! forge - drive package build blocks from spec files.
//!
//! The binary is a thin shell over `forge-core` and `forge-blocks`:
//! it parses a spec file, looks up the block for the named package,
//! and either runs the full lifecycle (`build`) or shows the commands
//! the block would compose (`show`).

pub mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "forge")]
#[command(author, version, about = "forge - drive package build blocks from spec files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a package from a spec file
    Build {
        /// Path to the spec file (TOML)
        spec: PathBuf,
        /// Unpacked source tree to build in
        #[arg(long)]
        sourcedir: PathBuf,
        /// Install prefix
        #[arg(long)]
        installdir: PathBuf,
    },
    /// Show the commands a build would run, without running them
    Show {
        /// Path to the spec file (TOML)
        spec: PathBuf,
        /// Pretend source tree for composed paths
        #[arg(long, default_value = "/build/src")]
        sourcedir: PathBuf,
        /// Pretend install prefix for composed paths
        #[arg(long, default_value = "/build/install")]
        installdir: PathBuf,
    },
    /// List the packages with a registered block
    Blocks,
}
