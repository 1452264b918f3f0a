//! Module environment output.
//!
//! Blocks emit environment assignments and search-path hints that a
//! separate module-file generator turns into the user-facing module.
//! Values may reference the install prefix through the [`ROOT_TOKEN`]
//! placeholder, resolved by the generator, not here.

use indexmap::IndexMap;

/// Placeholder for the install prefix in module values.
pub const ROOT_TOKEN: &str = "$root";

/// Collected module environment for one package.
#[derive(Debug, Clone)]
pub struct ModuleEnv {
    entries: Vec<(String, String)>,
    search_paths: IndexMap<String, Vec<String>>,
}

impl Default for ModuleEnv {
    /// Starts with the generic search-path guesses every installed
    /// package gets; blocks override per variable when the install
    /// layout differs.
    fn default() -> Self {
        let mut search_paths = IndexMap::new();
        search_paths.insert("PATH".to_string(), vec!["bin".to_string()]);
        search_paths.insert("CPATH".to_string(), vec!["include".to_string()]);
        search_paths.insert("LD_LIBRARY_PATH".to_string(), vec!["lib".to_string()]);
        Self {
            entries: Vec::new(),
            search_paths,
        }
    }
}

impl ModuleEnv {
    /// Fresh module environment with default search paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an environment assignment for the generated module.
    pub fn set_environment(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// Replace the install-relative guesses for one search-path
    /// variable.
    pub fn set_search_paths(&mut self, var: &str, rel_dirs: Vec<String>) {
        self.search_paths.insert(var.to_string(), rel_dirs);
    }

    /// Assignments in emission order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Search-path guesses, variable name to install-relative dirs.
    pub fn search_paths(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.search_paths
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
