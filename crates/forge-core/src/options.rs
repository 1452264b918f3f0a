//! Package options and structured flag assembly.
//!
//! [`FlagSet`] replaces the upstream habit of checking for a flag by
//! substring search on one big option string: flags are keyed entries
//! in an ordered map, so presence checks are by key membership and
//! re-running a configure step can never duplicate a flag.

use indexmap::IndexMap;
use serde::Deserialize;

/// A single option value from the declarative package spec.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean toggle, e.g. `shared_libs = true`.
    Bool(bool),
    /// Integer, e.g. `parallel = 8`.
    Int(i64),
    /// Free-form string, e.g. `rdma_type = "gen2"`.
    Str(String),
    /// List of strings.
    List(Vec<String>),
}

/// Policy for a failed optional-path check (currently PAPI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPathPolicy {
    /// Abort the build with a descriptive error.
    #[default]
    Fail,
    /// Log a warning, disable the feature, keep going.
    Warn,
}

impl MissingPathPolicy {
    /// Parse the policy from an option value; anything but `"warn"`
    /// means fail-fast.
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some("warn") => MissingPathPolicy::Warn,
            _ => MissingPathPolicy::Fail,
        }
    }
}

/// Ordered set of command-line flags with idempotent insertion.
///
/// Keys are the full flag spelling up to the `=` (`--with-fftw`,
/// `-DWITH_OPENCOLORIO`). The first write for a key wins, so
/// user-supplied flags seeded from the spec file take precedence over
/// adapter defaults appended later.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: IndexMap<String, Option<String>>,
}

impl FlagSet {
    /// Empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a flag set from a space-separated option string, e.g. a
    /// `configopts` value in the spec file. Tokens split on the first
    /// `=` into key and value; tokens without `=` are bare flags.
    pub fn parse(s: &str) -> Self {
        let mut set = Self::new();
        for token in s.split_whitespace() {
            match token.split_once('=') {
                Some((key, value)) => set.insert(key, Some(value)),
                None => set.insert(token, None),
            };
        }
        set
    }

    /// Insert a flag unless its key is already present. Returns whether
    /// the flag was inserted.
    pub fn insert(&mut self, key: &str, value: Option<&str>) -> bool {
        if self.flags.contains_key(key) {
            return false;
        }
        self.flags
            .insert(key.to_string(), value.map(str::to_string));
        true
    }

    /// Append `key=value` for every default whose key is not already
    /// present. Presence is checked by key membership, never substring.
    pub fn apply_defaults(&mut self, defaults: &[(&str, &str)]) {
        for (key, value) in defaults {
            self.insert(key, Some(value));
        }
    }

    /// Whether a flag with this key has been set.
    pub fn contains(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    /// Value of a flag, if the flag is present and carries one.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.flags.get(key).and_then(|v| v.as_deref())
    }

    /// Number of flags in the set.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the set holds no flags.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Space-join all flags in insertion order, rendering `key=value`
    /// or the bare key.
    pub fn render(&self) -> String {
        self.flags
            .iter()
            .map(|(key, value)| match value {
                Some(v) => format!("{key}={v}"),
                None => key.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Declarative options for one package build, plus the two flag sets
/// the adapter assembles into (`configopts` for the configure command,
/// `buildopts` for make).
#[derive(Debug, Clone, Default)]
pub struct PackageConfig {
    options: IndexMap<String, OptionValue>,
    /// Flags for the configure invocation.
    pub configopts: FlagSet,
    /// Flags appended to build/install commands.
    pub buildopts: FlagSet,
}

impl PackageConfig {
    /// Build a config from the spec file's options table. String
    /// options named `configopts` / `buildopts` seed the respective
    /// flag sets instead of landing in the option map.
    pub fn from_options(options: IndexMap<String, OptionValue>) -> Self {
        let mut cfg = Self::default();
        for (key, value) in options {
            match (key.as_str(), &value) {
                ("configopts", OptionValue::Str(s)) => cfg.configopts = FlagSet::parse(s),
                ("buildopts", OptionValue::Str(s)) => cfg.buildopts = FlagSet::parse(s),
                _ => {
                    cfg.options.insert(key, value);
                }
            }
        }
        cfg
    }

    /// Set a single option, replacing any previous value.
    pub fn set_option(&mut self, key: &str, value: OptionValue) {
        self.options.insert(key.to_string(), value);
    }

    /// Boolean option; absent or non-boolean means `false`.
    pub fn bool_opt(&self, key: &str) -> bool {
        matches!(self.options.get(key), Some(OptionValue::Bool(true)))
    }

    /// String option, if present and a string.
    pub fn str_opt(&self, key: &str) -> Option<&str> {
        match self.options.get(key) {
            Some(OptionValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer option, if present and an integer.
    pub fn int_opt(&self, key: &str) -> Option<i64> {
        match self.options.get(key) {
            Some(OptionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// List option, if present and a list.
    pub fn list_opt(&self, key: &str) -> Option<&[String]> {
        match self.options.get(key) {
            Some(OptionValue::List(v)) => Some(v),
            _ => None,
        }
    }
}
