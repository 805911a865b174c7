//! HTML link and text extraction.
//!
//! Uses scraper (pure Rust) to parse pages. Link extraction walks the
//! `a[href]` elements in document order, resolves each href against the
//! page URL, and keeps only HTTP(S) results with fragments stripped;
//! malformed hrefs are silently excluded. Text extraction walks the DOM
//! recursively, skipping non-content block elements (script, style,
//! noscript, iframe, svg, head) so only visible prose reaches the
//! tokenizer.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose entire subtree is non-content.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "iframe", "svg", "head"];

/// Extracts the anchor links of `html` as absolute, normalized HTTP(S)
/// URLs in document order, deduplicated with order preserved.
///
/// Anchors inside [`SKIPPED_ELEMENTS`] subtrees are ignored, so link
/// discovery sees the same content as text extraction.
pub fn find_links(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("anchor selector is valid");

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchors) {
        if in_skipped_subtree(element) {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        let Ok(mut absolute) = base.join(href) else {
            continue;
        };
        if absolute.scheme() != "http" && absolute.scheme() != "https" {
            continue;
        }
        absolute.set_fragment(None);
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }
    links
}

/// Strips all markup from `html`, returning the visible text.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    let root = Selector::parse("body").expect("body selector is valid");
    if let Some(body) = document.select(&root).next() {
        collect_text(body, &mut parts);
    } else if let Ok(html_selector) = Selector::parse("html") {
        // No <body>; fall back to the whole document (head is skipped).
        if let Some(root) = document.select(&html_selector).next() {
            collect_text(root, &mut parts);
        }
    }

    parts.join("\n")
}

/// Whether any ancestor of `element` is a non-content element.
fn in_skipped_subtree(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| SKIPPED_ELEMENTS.contains(&ancestor.value().name()))
}

fn collect_text(element: ElementRef, parts: &mut Vec<String>) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    #[test]
    fn finds_absolute_and_relative_links_in_order() {
        let html = r#"
            <a href="https://other.com/one">one</a>
            <a href="/two">two</a>
            <a href="three.html">three</a>
        "#;
        let links = find_links(&base(), html);
        let strings: Vec<_> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            strings,
            vec![
                "https://other.com/one",
                "https://example.com/two",
                "https://example.com/docs/three.html",
            ]
        );
    }

    #[test]
    fn skips_anchors_javascript_and_malformed_hrefs() {
        let html = r##"
            <a href="#section">anchor</a>
            <a href="javascript:void(0)">script</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="/ok">ok</a>
        "##;
        let links = find_links(&base(), html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/ok");
    }

    #[test]
    fn strips_fragments_and_dedupes_preserving_order() {
        let html = r##"
            <a href="/page#top">top</a>
            <a href="/page#bottom">bottom</a>
            <a href="/other">other</a>
        "##;
        let links = find_links(&base(), html);
        let strings: Vec<_> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            strings,
            vec!["https://example.com/page", "https://example.com/other"]
        );
    }

    #[test]
    fn skips_links_inside_non_content_elements() {
        let html = r#"
            <svg><a href="/svg-link">icon</a></svg>
            <noscript><a href="/noscript-link">fallback</a></noscript>
            <p><a href="/visible">visible</a></p>
        "#;
        let links = find_links(&base(), html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/visible");
    }

    #[test]
    fn extract_text_keeps_visible_prose() {
        let html = r#"<html><body><h1>Hello</h1><p>World</p></body></html>"#;
        let text = extract_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
    }

    #[test]
    fn extract_text_skips_script_and_style() {
        let html = r#"
            <html>
                <head><title>Skipped</title><script>alert('no');</script></head>
                <body>
                    <style>p { color: red; }</style>
                    <p>Visible content</p>
                    <script>var hidden = true;</script>
                </body>
            </html>
        "#;
        let text = extract_text(html);
        assert!(text.contains("Visible content"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("Skipped"));
    }

    #[test]
    fn extract_text_without_body_falls_back_to_document() {
        let text = extract_text("<p>Loose fragment</p>");
        assert!(text.contains("Loose fragment"));
    }
}
