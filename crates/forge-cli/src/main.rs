//! forge - drive package build blocks from spec files.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use forge_cli::cmd;
use forge_cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            spec,
            sourcedir,
            installdir,
        } => cmd::build::build(&spec, &sourcedir, &installdir),
        Commands::Show {
            spec,
            sourcedir,
            installdir,
        } => cmd::show::show(&spec, &sourcedir, &installdir),
        Commands::Blocks => {
            for name in forge_blocks::KNOWN_BLOCKS {
                println!("{name}");
            }
            Ok(())
        }
    }
}
