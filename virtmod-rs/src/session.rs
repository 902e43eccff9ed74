//! Build session context.
//!
//! One `BuildSession` exists per build or dev-server run. It owns every piece
//! of state the pipeline reads (registry, environment snapshot, sprite,
//! patches) and is shared across resolution threads behind an `Arc`.

use crate::config::PipelineConfig;
use crate::error::{VirtModError, VirtModResult};
use crate::module_loader::{resolve_virtual, Resolution, VirtualModuleId};
use crate::patch::PatchSet;
use crate::registry::{SpecifierRegistry, VirtualModuleKind};
use crate::sprite::{build_sprite, RebuildReport, SpriteDocument, SpriteStore};
use crate::synth::{synthesize, EnvSnapshot, SynthesisContext};
use log::{debug, info};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

pub struct BuildSession {
    config: PipelineConfig,
    registry: SpecifierRegistry,
    env: EnvSnapshot,
    sprites: SpriteStore,
    patches: Arc<PatchSet>,
}

impl BuildSession {
    /// Starts a session reading whitelisted variables from the process environment.
    pub fn new(config: PipelineConfig) -> VirtModResult<Self> {
        let env = EnvSnapshot::from_process(&config.env);
        Self::with_env(config, env)
    }

    pub fn with_env(config: PipelineConfig, env: EnvSnapshot) -> VirtModResult<Self> {
        let mut registry = SpecifierRegistry::with_defaults();
        for (name, kind) in &config.modules {
            registry.register(name.clone(), *kind);
        }

        let patches = Arc::new(PatchSet::from_config(&config.patches)?);

        // The sprite is built eagerly when the registration module is available
        let sprite = if registry.contains_kind(VirtualModuleKind::SvgIconsRegister)
            && !config.icons.dirs.is_empty()
        {
            build_sprite(&config.icons)?
        } else {
            SpriteDocument::empty(config.icons.container_id.clone())
        };

        info!(
            "Build session started: modules [{}], {} icons, {} env vars, {} patches",
            registry.names().join(", "),
            sprite.len(),
            env.vars().len(),
            patches.rules().len()
        );

        Ok(Self {
            config,
            registry,
            env,
            sprites: SpriteStore::new(sprite),
            patches,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SpecifierRegistry {
        &self.registry
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    pub fn patches(&self) -> &Arc<PatchSet> {
        &self.patches
    }

    /// Decides whether `specifier` names a registered virtual module.
    pub fn resolve(&self, specifier: &str) -> Resolution {
        resolve_virtual(&self.registry, specifier)
    }

    /// Synthesizes the source of a virtual module previously returned by
    /// [`BuildSession::resolve`].
    pub fn load(&self, id: &VirtualModuleId) -> VirtModResult<String> {
        let kind = self
            .registry
            .get(id.name())
            .ok_or_else(|| VirtModError::UnknownModule {
                id: id.as_str().to_string(),
                specifier: id.specifier(),
            })?;
        debug!("Synthesizing {} ({})", id.specifier(), kind);

        let sprite = self.sprites.current();
        let ctx = SynthesisContext {
            env: &self.env,
            sprite: &sprite,
            inject: self.config.icons.inject,
        };
        Ok(synthesize(kind, &ctx))
    }

    /// Same as [`BuildSession::load`] for a raw canonical id string.
    pub fn load_id(&self, id: &str) -> VirtModResult<String> {
        let id = VirtualModuleId::parse(id).ok_or_else(|| VirtModError::UnknownModule {
            id: id.to_string(),
            specifier: id.trim_start_matches('\0').to_string(),
        })?;
        self.load(&id)
    }

    /// Runs the configured patch rules over a file about to enter the graph.
    pub fn transform<'a>(&self, path: &Path, text: &'a str) -> Cow<'a, str> {
        self.patches.maybe_transform(path, text)
    }

    pub fn sprite(&self) -> Arc<SpriteDocument> {
        self.sprites.current()
    }

    /// Rescans the icon directories and atomically swaps in the new sprite.
    pub fn rebuild_sprites(&self) -> VirtModResult<RebuildReport> {
        self.sprites.rebuild(&self.config.icons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{fib_module, EnvConfig};

    fn session() -> BuildSession {
        BuildSession::with_env(PipelineConfig::default(), EnvSnapshot::default()).unwrap()
    }

    #[test]
    fn test_resolve_then_load() {
        let session = session();
        let Resolution::Virtual(id) = session.resolve("virtual:fib") else {
            panic!("virtual:fib should resolve");
        };
        assert_eq!(session.load(&id).unwrap(), fib_module());
    }

    #[test]
    fn test_load_unknown_id_names_specifier() {
        let err = session().load_id("\0virtual:missing").unwrap_err();
        match err {
            VirtModError::UnknownModule { specifier, .. } => {
                assert_eq!(specifier, "virtual:missing")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_load_id_rejects_non_virtual_ids() {
        assert!(matches!(
            session().load_id("/src/main.ts"),
            Err(VirtModError::UnknownModule { .. })
        ));
    }

    #[test]
    fn test_configured_alias_resolves() {
        let mut config = PipelineConfig::default();
        config
            .modules
            .insert("icons".to_string(), VirtualModuleKind::SvgIconsRegister);
        let session = BuildSession::with_env(config, EnvSnapshot::default()).unwrap();
        let Resolution::Virtual(id) = session.resolve("virtual:icons") else {
            panic!("alias should resolve");
        };
        assert!(session.load(&id).unwrap().contains("__svg__icons__dom__"));
    }

    #[test]
    fn test_env_snapshot_flows_into_module() {
        let env = EnvSnapshot::capture(
            &EnvConfig {
                whitelist: vec!["API_URL".to_string()],
                ..Default::default()
            },
            vec![("API_URL".to_string(), "https://x".to_string())],
        );
        let session = BuildSession::with_env(PipelineConfig::default(), env).unwrap();
        assert!(session
            .load_id("\0virtual:env")
            .unwrap()
            .contains("\"API_URL\": \"https://x\""));
    }
}
