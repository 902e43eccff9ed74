//! Specifier registry: maps `virtual:<name>` names to synthesis kinds.

use crate::error::VirtModError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Reserved prefix of every virtual import specifier.
pub const VIRTUAL_PREFIX: &str = "virtual:";

/// The synthesis rules the content synthesizer knows how to run.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VirtualModuleKind {
    Fib,
    Env,
    SvgIconsRegister,
}

impl VirtualModuleKind {
    pub const ALL: &'static [VirtualModuleKind] = &[
        VirtualModuleKind::Fib,
        VirtualModuleKind::Env,
        VirtualModuleKind::SvgIconsRegister,
    ];

    /// Name this kind is registered under by default.
    pub fn default_name(self) -> &'static str {
        match self {
            VirtualModuleKind::Fib => "fib",
            VirtualModuleKind::Env => "env",
            VirtualModuleKind::SvgIconsRegister => "svg-icons-register",
        }
    }
}

impl fmt::Display for VirtualModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

impl FromStr for VirtualModuleKind {
    type Err = VirtModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "fib" => Self::Fib,
            "env" => Self::Env,
            "svg-icons-register" => Self::SvgIconsRegister,
            _ => {
                return Err(VirtModError::Config(format!(
                    "Unsupported virtual module kind {}",
                    s
                )))
            }
        })
    }
}

/// Name to kind table consulted by the resolver and the synthesizer.
#[derive(Debug, Clone, Default)]
pub struct SpecifierRegistry {
    entries: HashMap<String, VirtualModuleKind>,
}

impl SpecifierRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every built-in kind under its default name.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in VirtualModuleKind::ALL {
            registry.register(kind.default_name(), *kind);
        }
        registry
    }

    /// Registers `name`, returning the kind it previously mapped to.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: VirtualModuleKind,
    ) -> Option<VirtualModuleKind> {
        self.entries.insert(name.into(), kind)
    }

    pub fn get(&self, name: &str) -> Option<VirtualModuleKind> {
        self.entries.get(name).copied()
    }

    pub fn contains_kind(&self, kind: VirtualModuleKind) -> bool {
        self.entries.values().any(|k| *k == kind)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
