//! Capability boundary for mounting the sprite into a page.
//!
//! The generated registration module performs the same steps against the real
//! DOM; [`InMemoryDocument`] lets the exactly-once contract be exercised
//! without a browser.

use crate::sprite::InjectPosition;

/// Accepts sprite markup and ensures it is present exactly once.
pub trait SpriteSink {
    /// Inserts `markup` as the element with `container_id`, replacing any
    /// element already carrying that id in place.
    fn ensure_sprite(&mut self, container_id: &str, markup: &str, position: InjectPosition);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    pub id: Option<String>,
    pub markup: String,
}

/// Flat model of a page `<body>`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    body: Vec<DomElement>,
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, id: Option<&str>, markup: impl Into<String>) {
        self.body.push(DomElement {
            id: id.map(str::to_string),
            markup: markup.into(),
        });
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&DomElement> {
        self.body.iter().find(|e| e.id.as_deref() == Some(id))
    }

    pub fn count_with_id(&self, id: &str) -> usize {
        self.body
            .iter()
            .filter(|e| e.id.as_deref() == Some(id))
            .count()
    }

    pub fn body(&self) -> &[DomElement] {
        &self.body
    }
}

impl SpriteSink for InMemoryDocument {
    fn ensure_sprite(&mut self, container_id: &str, markup: &str, position: InjectPosition) {
        let element = DomElement {
            id: Some(container_id.to_string()),
            markup: markup.to_string(),
        };
        if let Some(existing) = self
            .body
            .iter_mut()
            .find(|e| e.id.as_deref() == Some(container_id))
        {
            *existing = element;
            return;
        }
        match position {
            InjectPosition::BodyFirst => self.body.insert(0, element),
            InjectPosition::BodyLast => self.body.push(element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_sprite_inserts_at_body_start() {
        let mut doc = InMemoryDocument::new();
        doc.append(Some("root"), "<div id=\"root\"></div>");
        doc.ensure_sprite("sprite", "<svg/>", InjectPosition::BodyFirst);
        assert_eq!(doc.body()[0].id.as_deref(), Some("sprite"));
        assert_eq!(doc.body().len(), 2);
    }

    #[test]
    fn test_ensure_sprite_inserts_at_body_end() {
        let mut doc = InMemoryDocument::new();
        doc.append(Some("root"), "<div id=\"root\"></div>");
        doc.ensure_sprite("sprite", "<svg/>", InjectPosition::BodyLast);
        assert_eq!(doc.body()[1].id.as_deref(), Some("sprite"));
    }

    #[test]
    fn test_ensure_sprite_replaces_in_place() {
        let mut doc = InMemoryDocument::new();
        doc.append(Some("root"), "<div id=\"root\"></div>");
        doc.ensure_sprite("sprite", "<svg>old</svg>", InjectPosition::BodyLast);
        doc.append(None, "<p></p>");
        doc.ensure_sprite("sprite", "<svg>new</svg>", InjectPosition::BodyFirst);

        assert_eq!(doc.count_with_id("sprite"), 1);
        assert_eq!(doc.body()[1].markup, "<svg>new</svg>");
        assert_eq!(doc.body().len(), 3);
    }
}
