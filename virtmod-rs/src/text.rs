//! Text utilities shared by the synthesizer, sprite builder and loaders.

/// Strips the UTF-8 BOM (byte order mark) from the beginning of text if present.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}

/// Normalizes a file path to forward slashes so patterns match on every platform.
pub fn normalize_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Encodes a string as a JavaScript string literal.
///
/// JSON string syntax is a subset of JavaScript string syntax, so the
/// serde_json encoder is reused.
pub fn js_string_literal(s: &str) -> String {
    // Serializing a &str to JSON cannot fail
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// Escapes text for use inside a double-quoted XML attribute value.
pub fn escape_xml_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_strip_bom_with_bom() {
        assert_eq!(strip_bom("\u{FEFF}<svg/>"), "<svg/>");
    }

    #[test]
    fn test_strip_bom_without_bom() {
        assert_eq!(strip_bom("<svg/>"), "<svg/>");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new(r"C:\app\node_modules\pkg\index.js")),
            "C:/app/node_modules/pkg/index.js"
        );
    }

    #[test]
    fn test_js_string_literal() {
        assert_eq!(js_string_literal("a\"b"), r#""a\"b""#);
        assert_eq!(js_string_literal("line\nbreak"), r#""line\nbreak""#);
    }

    #[test]
    fn test_escape_xml_attr() {
        assert_eq!(escape_xml_attr("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
