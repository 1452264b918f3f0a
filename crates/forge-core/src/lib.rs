//! Adapter engine for package build blocks.
//!
//! A "block" encodes package-specific build knowledge: which configure
//! or CMake flags to pass, which dependency roots to wire in, and which
//! files must exist after `make install`. The hard work (dependency
//! resolution, module files, scheduling) belongs to the surrounding
//! framework; this crate provides the seams blocks plug into:
//!
//! - [`options::FlagSet`] - ordered, idempotent flag assembly
//! - [`deps::DependencyIndex`] - installed-software lookup
//! - [`env::EnvOverlay`] - recorded environment for spawned commands
//! - [`run::CommandRunner`] - external build tool invocation
//! - [`lifecycle::BuildSteps`] - the configure/build/install/verify
//!   lifecycle and the generic `ConfigureMake` / `CMakeMake` step kits
//! - [`sanity::verify_installed`] - post-install artifact checks

pub mod context;
pub mod deps;
pub mod env;
pub mod error;
pub mod fsutil;
pub mod lifecycle;
pub mod module_env;
pub mod options;
pub mod run;
pub mod sanity;
pub mod spec;
pub mod version;

pub use context::BuildContext;
pub use error::BuildError;
pub use lifecycle::{run_lifecycle, BuildSteps};
pub use options::{FlagSet, PackageConfig};
pub use version::Release;
