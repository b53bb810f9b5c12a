//! Plain-text extraction from HTML.

use scraper::{node::Node, Html, Selector};
use std::collections::HashMap;

/// Extract visible text and lightweight metadata from an HTML document.
///
/// Script, style, and noscript subtrees are skipped; remaining text
/// nodes are whitespace-joined in document order. Metadata currently
/// carries the `<title>` when present.
pub fn extract_text(html: &str) -> (String, HashMap<String, String>) {
    let document = Html::parse_document(html);

    let mut chunks: Vec<String> = Vec::new();
    for node in document.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            let in_skipped_subtree = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(el) => matches!(el.name(), "script" | "style" | "noscript" | "title"),
                _ => false,
            });
            if in_skipped_subtree {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
        }
    }

    let mut metadata = HashMap::new();
    if let Ok(selector) = Selector::parse("title") {
        if let Some(title_el) = document.select(&selector).next() {
            let title = title_el.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                metadata.insert("title".to_string(), title);
            }
        }
    }

    (chunks.join(" "), metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_script_and_style() {
        let html = r#"<html><head><title>Doc</title><style>body{}</style></head>
            <body><p>Visible text.</p><script>var x = 1;</script></body></html>"#;

        let (text, metadata) = extract_text(html);
        assert_eq!(text, "Visible text.");
        assert_eq!(metadata.get("title").map(String::as_str), Some("Doc"));
    }

    #[test]
    fn test_joins_text_in_document_order() {
        let html = "<body><h1>First</h1><p>second <b>third</b></p></body>";
        let (text, _) = extract_text(html);
        assert_eq!(text, "First second third");
    }

    #[test]
    fn test_missing_title_leaves_metadata_empty() {
        let (text, metadata) = extract_text("<body><p>No head here</p></body>");
        assert_eq!(text, "No head here");
        assert!(metadata.is_empty());
    }
}
