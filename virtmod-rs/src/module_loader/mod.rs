//! Module resolution chain.
//!
//! A [`LoaderChain`] asks each [`ModuleLoader`] in turn to claim an import.
//! The virtual loader comes first so `virtual:*` specifiers never reach the
//! file system; everything it declines falls through to [`FsModuleLoader`].

mod fs_loader;
mod virtual_loader;

pub use fs_loader::FsModuleLoader;
pub use virtual_loader::{resolve_virtual, VirtualModuleLoader};

use crate::error::{VirtModError, VirtModResult};
use crate::registry::VIRTUAL_PREFIX;
use crate::session::BuildSession;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of canonical virtual module ids. The NUL byte keeps other plugins
/// and the file system from treating the id as a path.
pub const RESOLVED_PREFIX: &str = "\0virtual:";

/// Canonical id of a virtual module, `\0virtual:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualModuleId(String);

impl VirtualModuleId {
    pub(crate) fn for_name(name: &str) -> Self {
        Self(format!("{}{}", RESOLVED_PREFIX, name))
    }

    pub fn parse(id: &str) -> Option<Self> {
        id.strip_prefix(RESOLVED_PREFIX)
            .filter(|name| !name.is_empty())
            .map(Self::for_name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn name(&self) -> &str {
        &self.0[RESOLVED_PREFIX.len()..]
    }

    /// The user-facing specifier this id was resolved from.
    pub fn specifier(&self) -> String {
        format!("{}{}", VIRTUAL_PREFIX, self.name())
    }
}

impl fmt::Display for VirtualModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of asking the virtual resolver about a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Virtual(VirtualModuleId),
    /// Not a registered virtual module; normal resolution proceeds.
    NotHandled,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleId {
    Virtual(VirtualModuleId),
    File(PathBuf),
}

impl ModuleId {
    /// Interprets an id string handed back by a host bundler.
    pub fn parse(raw: &str) -> Self {
        match VirtualModuleId::parse(raw) {
            Some(id) => ModuleId::Virtual(id),
            None => ModuleId::File(PathBuf::from(raw)),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleId::Virtual(id) => write!(f, "{}", id),
            ModuleId::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One layer of the resolution chain.
pub trait ModuleLoader: Send + Sync {
    /// Returns `None` when this loader does not handle `specifier`.
    fn resolve(&self, specifier: &str, referrer: Option<&Path>)
        -> VirtModResult<Option<ModuleId>>;

    /// Returns `None` when `id` belongs to another loader.
    fn load(&self, id: &ModuleId) -> VirtModResult<Option<Arc<str>>>;
}

#[derive(Default)]
pub struct LoaderChain {
    loaders: Vec<Box<dyn ModuleLoader>>,
}

impl LoaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual modules first, then the file system rooted at the config root.
    pub fn for_session(session: Arc<BuildSession>) -> Self {
        let root = session.config().root.clone();
        let patches = session.patches().clone();
        Self::new()
            .with_loader(Box::new(VirtualModuleLoader::new(session)))
            .with_loader(Box::new(FsModuleLoader::new(root, patches)))
    }

    pub fn with_loader(mut self, loader: Box<dyn ModuleLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    pub fn resolve(&self, specifier: &str, referrer: Option<&Path>) -> VirtModResult<ModuleId> {
        for loader in &self.loaders {
            if let Some(id) = loader.resolve(specifier, referrer)? {
                return Ok(id);
            }
        }
        Err(VirtModError::UnresolvedImport {
            specifier: specifier.to_string(),
            referrer: referrer.map(Path::to_path_buf),
        })
    }

    pub fn load(&self, id: &ModuleId) -> VirtModResult<Arc<str>> {
        for loader in &self.loaders {
            if let Some(code) = loader.load(id)? {
                return Ok(code);
            }
        }
        Err(match id {
            ModuleId::Virtual(id) => VirtModError::UnknownModule {
                id: id.as_str().to_string(),
                specifier: id.specifier(),
            },
            ModuleId::File(path) => VirtModError::UnresolvedImport {
                specifier: path.display().to_string(),
                referrer: None,
            },
        })
    }
}
