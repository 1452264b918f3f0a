//! Installed-software lookup.
//!
//! The framework resolves dependencies before the adapter runs; this
//! module exposes the resolved roots. A missing entry is a valid
//! non-error state meaning "optional dependency not present" - the
//! caller simply emits no flags for it.
//!
//! Library/include locations for numerical dependencies follow the
//! `<NAME>_INC_DIR` / `<NAME>_LIB_DIR` / `<NAME>_STATIC_LIBS`
//! environment convention. That naming is load-bearing: it must match
//! the dependency-declaration data the framework already ships.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::env::EnvMap;

/// One resolved dependency root.
#[derive(Debug, Clone)]
pub struct DepEntry {
    /// Filesystem root of the installed dependency.
    pub root: PathBuf,
    /// Installed version, when the block needs it (e.g. Python).
    pub version: Option<String>,
    /// Build-time only; excluded from runtime dependency loops.
    pub build_only: bool,
}

/// Name-keyed index of resolved dependency roots.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    deps: IndexMap<String, DepEntry>,
}

impl DependencyIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolved dependency.
    pub fn add(&mut self, name: &str, entry: DepEntry) {
        self.deps.insert(name.to_string(), entry);
    }

    /// Root of an installed dependency, or `None` when absent.
    pub fn root(&self, name: &str) -> Option<&Path> {
        self.deps.get(name).map(|d| d.root.as_path())
    }

    /// Installed version string of a dependency, when recorded.
    pub fn version(&self, name: &str) -> Option<&str> {
        self.deps.get(name).and_then(|d| d.version.as_deref())
    }

    /// Names of runtime dependencies, in declaration order.
    pub fn runtime_names(&self) -> impl Iterator<Item = &str> {
        self.deps
            .iter()
            .filter(|(_, d)| !d.build_only)
            .map(|(name, _)| name.as_str())
    }
}

/// Include dir, library dir and static library list for one
/// numerical dependency, read from the env triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibInfo {
    /// Value of `<NAME>_INC_DIR`.
    pub inc_dir: String,
    /// Value of `<NAME>_LIB_DIR`.
    pub lib_dir: String,
    /// Value of `<NAME>_STATIC_LIBS`.
    pub static_libs: String,
}

impl LibInfo {
    /// Bracketed `[libdir/libs]` spelling some configure scripts take
    /// for library arguments.
    pub fn lib_spec(&self) -> String {
        format!("[{}/{}]", self.lib_dir, self.static_libs)
    }
}

/// Read the `<NAME>_INC_DIR` / `_LIB_DIR` / `_STATIC_LIBS` triple for
/// a dependency. All three must be present; otherwise the dependency
/// is treated as absent.
pub fn lib_info(env: &EnvMap, name: &str) -> Option<LibInfo> {
    let upper = name.to_uppercase();
    let inc_dir = env.get(&format!("{upper}_INC_DIR"))?;
    let lib_dir = env.get(&format!("{upper}_LIB_DIR"))?;
    let static_libs = env.get(&format!("{upper}_STATIC_LIBS"))?;
    Some(LibInfo {
        inc_dir: inc_dir.to_string(),
        lib_dir: lib_dir.to_string(),
        static_libs: static_libs.to_string(),
    })
}
