//! Environment reads and writes as explicit data.
//!
//! [`EnvMap`] is the inbound side: a snapshot of the variables the
//! framework exposes to the adapter (toolchain compilers, dependency
//! lib/include triples). [`EnvOverlay`] is the outbound side: instead
//! of mutating ambient process state, adapters record assignments that
//! are applied to each spawned command.

use indexmap::IndexMap;
use std::process::Command;

use crate::error::BuildError;

/// Read-only snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvMap {
    vars: IndexMap<String, String>,
}

impl EnvMap {
    /// Empty map, for tests and dry runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Insert or replace a variable.
    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Look up a variable. Empty values count as absent, matching the
    /// truthiness the upstream configure wiring relied on.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Look up a variable that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingRequiredDependency`] naming the
    /// variable when it is absent or empty.
    pub fn require(&self, name: &str) -> Result<&str, BuildError> {
        self.get(name)
            .ok_or_else(|| BuildError::MissingRequiredDependency(name.to_string()))
    }
}

/// Recorded environment assignments for spawned build commands.
#[derive(Debug, Clone, Default)]
pub struct EnvOverlay {
    vars: IndexMap<String, String>,
}

impl EnvOverlay {
    /// Empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an assignment, replacing any previous value for the name.
    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Value recorded for a name, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Iterate assignments in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Apply every recorded assignment to a command about to spawn.
    pub fn apply(&self, cmd: &mut Command) {
        for (name, value) in &self.vars {
            cmd.env(name, value);
        }
    }
}
