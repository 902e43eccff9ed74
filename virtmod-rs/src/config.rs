//! Host build configuration.
//!
//! Loaded from a JSON file with camelCase keys; every field has a default so
//! an empty object is a valid configuration.

use crate::error::{VirtModError, VirtModResult};
use crate::patch::PatchConfig;
use crate::registry::VirtualModuleKind;
use crate::sprite::SpriteOptions;
use crate::synth::EnvConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Project root; relative paths below are resolved against it.
    pub root: PathBuf,
    pub env: EnvConfig,
    pub icons: SpriteOptions,
    pub patches: Vec<PatchConfig>,
    /// Extra registry names, e.g. `{"icons": "svg-icons-register"}`.
    pub modules: BTreeMap<String, VirtualModuleKind>,
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> VirtModResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| VirtModError::io(path, err))?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().map_err(|err| VirtModError::io(".", err))?,
        };
        Self::from_json_str(&text, &base)
    }

    /// Parses `text` and resolves relative paths against `base`.
    pub fn from_json_str(text: &str, base: &Path) -> VirtModResult<Self> {
        let mut config: PipelineConfig = serde_json::from_str(text)?;
        config.resolve_paths(base)?;
        Ok(config)
    }

    /// Expands `~` and makes `root` and icon directories absolute.
    pub fn resolve_paths(&mut self, base: &Path) -> VirtModResult<()> {
        self.root = absolutize(&self.root, base)?;
        let root = self.root.clone();
        for dir in self.icons.dirs.iter_mut() {
            *dir = absolutize(dir, &root)?;
        }
        Ok(())
    }
}

fn absolutize(path: &Path, base: &Path) -> VirtModResult<PathBuf> {
    let raw = path.to_str().ok_or_else(|| {
        VirtModError::Config(format!("path is not valid UTF-8: {}", path.display()))
    })?;
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    Ok(if expanded.is_absolute() {
        expanded
    } else if expanded.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(expanded)
    })
}
