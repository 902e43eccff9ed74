//! Content synthesizer: turns a virtual module kind into module source text.
//!
//! Every rule is a pure function of its [`SynthesisContext`]; session state is
//! read by the caller and passed in.

mod env;
mod fib;
mod register;

pub use env::{env_module, EnvConfig, EnvSnapshot};
pub use fib::{fib, fib_module};
pub use register::RegistrationScript;

use crate::registry::VirtualModuleKind;
use crate::sprite::{InjectPosition, SpriteDocument};

/// Build-time inputs available to the synthesis rules.
pub struct SynthesisContext<'a> {
    pub env: &'a EnvSnapshot,
    pub sprite: &'a SpriteDocument,
    pub inject: InjectPosition,
}

pub fn synthesize(kind: VirtualModuleKind, ctx: &SynthesisContext<'_>) -> String {
    match kind {
        VirtualModuleKind::Fib => fib_module(),
        VirtualModuleKind::Env => env_module(ctx.env),
        VirtualModuleKind::SvgIconsRegister => {
            RegistrationScript::new(ctx.sprite, ctx.inject).to_module_source()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_dispatches_by_kind() {
        let env = EnvSnapshot::capture(
            &EnvConfig {
                whitelist: vec!["A".to_string()],
                ..Default::default()
            },
            vec![("A".to_string(), "1".to_string())],
        );
        let sprite = SpriteDocument::empty("sprite-root");
        let ctx = SynthesisContext {
            env: &env,
            sprite: &sprite,
            inject: InjectPosition::BodyFirst,
        };

        assert_eq!(synthesize(VirtualModuleKind::Fib, &ctx), fib_module());
        assert!(synthesize(VirtualModuleKind::Env, &ctx).contains("\"A\": \"1\""));
        assert!(synthesize(VirtualModuleKind::SvgIconsRegister, &ctx).contains("sprite-root"));
    }
}
