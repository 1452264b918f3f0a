//! Declarative package spec files.
//!
//! A spec file names the package, pins its version, sets block
//! options, and lists the resolved roots of its dependencies:
//!
//! ```toml
//! [package]
//! name = "PETSc"
//! version = "3.5.1"
//!
//! [options]
//! shared_libs = true
//! configopts = "--download-hypre=1"
//!
//! [dependencies.SCOTCH]
//! root = "/opt/scotch/6.0.4"
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::deps::{DepEntry, DependencyIndex};
use crate::error::BuildError;
use crate::options::{OptionValue, PackageConfig};
use crate::version::Release;

/// Parsed spec file.
#[derive(Debug, Deserialize)]
pub struct SpecFile {
    /// Package identity.
    pub package: PackageSection,
    /// Block options.
    #[serde(default)]
    pub options: IndexMap<String, OptionValue>,
    /// Resolved dependency roots, keyed by dependency name.
    #[serde(default)]
    pub dependencies: IndexMap<String, DependencySection>,
}

/// The `[package]` section.
#[derive(Debug, Deserialize)]
pub struct PackageSection {
    /// Package name; selects the block.
    pub name: String,
    /// Dotted version string.
    pub version: String,
}

/// One `[dependencies.<name>]` section.
#[derive(Debug, Deserialize)]
pub struct DependencySection {
    /// Installed root of the dependency.
    pub root: PathBuf,
    /// Installed version, when a block needs it.
    pub version: Option<String>,
    /// Build-time only dependency.
    #[serde(default)]
    pub build_only: bool,
}

impl SpecFile {
    /// Load and parse a spec file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spec`] when the file cannot be read or is
    /// not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuildError::Spec(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| BuildError::Spec(format!("failed to parse {}: {e}", path.display())))
    }

    /// The pinned version, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spec`] for an empty version string.
    pub fn version(&self) -> Result<Release, BuildError> {
        Release::parse(&self.package.version)
    }

    /// Block options as a [`PackageConfig`].
    pub fn config(&self) -> PackageConfig {
        PackageConfig::from_options(self.options.clone())
    }

    /// Dependency roots as a [`DependencyIndex`].
    pub fn dependency_index(&self) -> DependencyIndex {
        let mut index = DependencyIndex::new();
        for (name, dep) in &self.dependencies {
            index.add(
                name,
                DepEntry {
                    root: dep.root.clone(),
                    version: dep.version.clone(),
                    build_only: dep.build_only,
                },
            );
        }
        index
    }
}
