//! `virtual:env`: exports a snapshot of whitelisted build-time variables.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Which variables may appear in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvConfig {
    /// Exact variable names.
    pub whitelist: Vec<String>,
    /// Name prefixes, e.g. `VITE_`.
    pub prefixes: Vec<String>,
    /// Values that take precedence over the process environment.
    pub values: BTreeMap<String, String>,
}

impl EnvConfig {
    pub fn allows(&self, name: &str) -> bool {
        self.whitelist.iter().any(|w| w == name)
            || self
                .prefixes
                .iter()
                .any(|p| !p.is_empty() && name.starts_with(p.as_str()))
    }
}

/// Build-time resolved variables, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Keeps the allowed entries of `vars`; configured `values` win over them.
    /// Variables that are absent stay absent.
    pub fn capture<I>(config: &EnvConfig, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut all: HashMap<String, String> = vars.into_iter().collect();
        all.extend(
            config
                .values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let vars = all
            .into_iter()
            .filter(|(name, _)| config.allows(name))
            .collect();
        Self { vars }
    }

    pub fn from_process(config: &EnvConfig) -> Self {
        Self::capture(config, std::env::vars())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

/// Source of the `virtual:env` module.
pub fn env_module(snapshot: &EnvSnapshot) -> String {
    // A map of strings always serializes
    let record = serde_json::to_string_pretty(&snapshot.vars).unwrap_or_else(|_| "{}".into());
    format!("export default {};\n", record)
}
