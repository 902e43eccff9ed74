//! Icon references consumed by UI components.
//!
//! A component names an icon by `name` and `prefix`; the reference resolves to
//! the sprite fragment `#<prefix>-<name>`, which only renders once the
//! registration module has mounted the sprite.

use crate::sprite::{SpriteDocument, SpriteOptions, DEFAULT_COLOR, DEFAULT_PREFIX};
use crate::text::escape_xml_attr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRef {
    pub name: String,
    pub prefix: String,
    pub color: String,
}

impl IconRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            color: DEFAULT_COLOR.to_string(),
        }
    }

    /// Reference using the configured prefix and default color.
    pub fn with_options(name: impl Into<String>, options: &SpriteOptions) -> Self {
        Self {
            name: name.into(),
            prefix: options.prefix.clone(),
            color: options.color.clone(),
        }
    }

    pub fn symbol_id(&self) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}-{}", self.prefix, self.name)
        }
    }

    pub fn href(&self) -> String {
        format!("#{}", self.symbol_id())
    }

    pub fn is_available_in(&self, sprite: &SpriteDocument) -> bool {
        sprite.contains(&self.symbol_id())
    }

    /// `<svg>` element referencing the symbol.
    pub fn to_markup(&self) -> String {
        format!(
            r#"<svg aria-hidden="true"><use href="{}" fill="{}"/></svg>"#,
            escape_xml_attr(&self.href()),
            escape_xml_attr(&self.color)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteSymbol;
    use std::path::PathBuf;

    #[test]
    fn test_default_reference() {
        let icon = IconRef::new("home");
        assert_eq!(icon.href(), "#icon-home");
        assert_eq!(
            icon.to_markup(),
            r##"<svg aria-hidden="true"><use href="#icon-home" fill="#333"/></svg>"##
        );
    }

    #[test]
    fn test_reference_from_options() {
        let options = SpriteOptions {
            prefix: "ui".to_string(),
            color: "red".to_string(),
            ..SpriteOptions::default()
        };
        let icon = IconRef::with_options("close", &options);
        assert_eq!(icon.href(), "#ui-close");
        assert_eq!(icon.color, "red");
    }

    #[test]
    fn test_availability_in_sprite() {
        let sprite = SpriteDocument::new(
            "sprite",
            vec![SpriteSymbol {
                symbol_id: "icon-home".to_string(),
                markup: r#"<symbol id="icon-home"></symbol>"#.to_string(),
                source: PathBuf::from("home.svg"),
            }],
            Vec::new(),
        );
        assert!(IconRef::new("home").is_available_in(&sprite));
        assert!(!IconRef::new("gear").is_available_in(&sprite));
    }
}
