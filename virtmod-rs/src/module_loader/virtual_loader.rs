use super::{ModuleId, ModuleLoader, Resolution, VirtualModuleId};
use crate::error::VirtModResult;
use crate::registry::{SpecifierRegistry, VIRTUAL_PREFIX};
use crate::session::BuildSession;
use std::path::Path;
use std::sync::Arc;

/// Maps `virtual:<name>` to its canonical id when `name` is registered.
///
/// Unknown names under the prefix are not errors here; they fall through to
/// the rest of the chain.
pub fn resolve_virtual(registry: &SpecifierRegistry, specifier: &str) -> Resolution {
    match specifier.strip_prefix(VIRTUAL_PREFIX) {
        Some(name) if registry.get(name).is_some() => {
            Resolution::Virtual(VirtualModuleId::for_name(name))
        }
        _ => Resolution::NotHandled,
    }
}

/// Resolver and synthesizer for virtual modules, backed by a build session.
pub struct VirtualModuleLoader {
    session: Arc<BuildSession>,
}

impl VirtualModuleLoader {
    pub fn new(session: Arc<BuildSession>) -> Self {
        Self { session }
    }
}

impl ModuleLoader for VirtualModuleLoader {
    fn resolve(
        &self,
        specifier: &str,
        _referrer: Option<&Path>,
    ) -> VirtModResult<Option<ModuleId>> {
        Ok(match self.session.resolve(specifier) {
            Resolution::Virtual(id) => Some(ModuleId::Virtual(id)),
            Resolution::NotHandled => None,
        })
    }

    fn load(&self, id: &ModuleId) -> VirtModResult<Option<Arc<str>>> {
        match id {
            ModuleId::Virtual(id) => Ok(Some(self.session.load(id)?.into())),
            ModuleId::File(_) => Ok(None),
        }
    }
}
