//! File-system layer of the loader chain.
//!
//! Resolves relative, absolute and bare (`node_modules`) specifiers and reads
//! file text through the session's patch rules. Each file is read and patched
//! at most once per session.

use super::{ModuleId, ModuleLoader};
use crate::error::{VirtModError, VirtModResult};
use crate::patch::PatchSet;
use crate::registry::VIRTUAL_PREFIX;
use crate::text::strip_bom;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "tsx", "jsx", "json"];
const INDEX_FILES: &[&str] = &["index.js", "index.mjs", "index.ts", "index.tsx"];

pub struct FsModuleLoader {
    root: PathBuf,
    patches: Arc<PatchSet>,
    cache: Mutex<HashMap<PathBuf, Arc<str>>>,
}

impl FsModuleLoader {
    pub fn new(root: impl Into<PathBuf>, patches: Arc<PatchSet>) -> Self {
        Self {
            root: root.into(),
            patches,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drops the cached text for `path` so the next load re-reads it.
    pub fn invalidate(&self, path: &Path) {
        self.cache.lock().remove(path);
    }

    fn resolve_path(&self, specifier: &str, referrer: Option<&Path>) -> Option<PathBuf> {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = referrer
                .and_then(Path::parent)
                .unwrap_or(self.root.as_path());
            return resolve_file(&base.join(specifier));
        }
        let path = Path::new(specifier);
        if path.is_absolute() {
            return resolve_file(path);
        }
        self.resolve_bare(specifier)
    }

    fn resolve_bare(&self, specifier: &str) -> Option<PathBuf> {
        let node_modules = self.root.join("node_modules");
        let package_dir = node_modules.join(specifier);
        if package_dir.is_dir() {
            if let Some(entry) = package_entry(&package_dir) {
                return Some(entry);
            }
        }
        resolve_file(&package_dir)
    }
}

/// Tries `path` as a file, with each known extension, then as a directory index.
fn resolve_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        for ext in EXTENSIONS {
            let candidate = path.with_file_name(format!("{}.{}", name, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    if path.is_dir() {
        for index in INDEX_FILES {
            let candidate = path.join(index);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Entry file named by `package.json` (`module`, then `main`).
fn package_entry(package_dir: &Path) -> Option<PathBuf> {
    let manifest = fs::read_to_string(package_dir.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&manifest).ok()?;
    ["module", "main"]
        .iter()
        .filter_map(|field| manifest.get(field).and_then(|v| v.as_str()))
        .find_map(|entry| resolve_file(&package_dir.join(entry)))
}

impl ModuleLoader for FsModuleLoader {
    fn resolve(
        &self,
        specifier: &str,
        referrer: Option<&Path>,
    ) -> VirtModResult<Option<ModuleId>> {
        if specifier.starts_with(VIRTUAL_PREFIX) || specifier.starts_with('\0') {
            return Ok(None);
        }
        Ok(self.resolve_path(specifier, referrer).map(ModuleId::File))
    }

    fn load(&self, id: &ModuleId) -> VirtModResult<Option<Arc<str>>> {
        let ModuleId::File(path) = id else {
            return Ok(None);
        };
        if let Some(code) = self.cache.lock().get(path) {
            return Ok(Some(code.clone()));
        }

        let text = fs::read_to_string(path).map_err(|err| VirtModError::io(path, err))?;
        let code: Arc<str> = self.patches.maybe_transform(path, strip_bom(&text)).into();
        debug!("Loaded {} ({} bytes)", path.display(), code.len());

        // A concurrent load of the same file may have won; keep its result
        let mut cache = self.cache.lock();
        let code = cache.entry(path.clone()).or_insert(code).clone();
        Ok(Some(code))
    }
}
