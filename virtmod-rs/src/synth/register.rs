//! `virtual:svg-icons-register`: mounts the sprite when the module executes.

use crate::sink::SpriteSink;
use crate::sprite::{InjectPosition, SpriteDocument};
use crate::text::js_string_literal;

/// The registration module's single effect: put the sprite container into the
/// page, replacing an existing one with the same id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationScript {
    container_id: String,
    markup: String,
    inject: InjectPosition,
}

impl RegistrationScript {
    pub fn new(sprite: &SpriteDocument, inject: InjectPosition) -> Self {
        Self {
            container_id: sprite.container_id().to_string(),
            markup: sprite.markup().to_string(),
            inject,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Runs the module's effect against `sink`.
    pub fn mount(&self, sink: &mut dyn SpriteSink) {
        sink.ensure_sprite(&self.container_id, &self.markup, self.inject);
    }

    pub fn to_module_source(&self) -> String {
        let insert = match self.inject {
            InjectPosition::BodyFirst => "body.insertBefore(sprite, body.firstChild);",
            InjectPosition::BodyLast => "body.appendChild(sprite);",
        };
        format!(
            r#"const CONTAINER_ID = {container_id};
const SPRITE = {markup};

function mountSprite() {{
  const template = document.createElement("template");
  template.innerHTML = SPRITE;
  const sprite = template.content.firstElementChild;
  const existing = document.getElementById(CONTAINER_ID);
  if (existing) {{
    existing.replaceWith(sprite);
    return;
  }}
  const body = document.body;
  {insert}
}}

if (typeof document !== "undefined") {{
  if (document.readyState === "loading") {{
    document.addEventListener("DOMContentLoaded", mountSprite, {{ once: true }});
  }} else {{
    mountSprite();
  }}
}}
"#,
            container_id = js_string_literal(&self.container_id),
            markup = js_string_literal(&self.markup),
            insert = insert,
        )
    }
}
