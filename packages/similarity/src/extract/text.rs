//! Visible-text shingling.
//!
//! Visible text is collected in document order with script/style and
//! other non-rendered subtrees stripped, tokenized on
//! whitespace/punctuation, lower-cased, and windowed into fixed-size
//! shingles. Formatting-only differences between two pages therefore
//! never affect matching.

use scraper::{ElementRef, Html, Node};

use crate::types::artefact::TextArtefact;
use crate::types::config::ExtractConfig;

/// Subtrees that never render visible text.
const HIDDEN_TAGS: &[&str] = &[
    "script", "style", "template", "noscript", "svg", "head", "iframe",
];

/// Build the text artefact for a page, if it has enough visible text to
/// produce at least one shingle.
pub fn text_artefact(html: &str, page_url: &str, config: &ExtractConfig) -> Option<TextArtefact> {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_visible_text(document.root_element(), &mut raw);

    let tokens = tokenize(&raw);
    let shingles: std::collections::BTreeSet<String> = tokens
        .windows(config.shingle_window)
        .map(|window| window.join(" "))
        .filter(|shingle| shingle.len() >= config.min_shingle_len)
        .collect();

    if shingles.is_empty() {
        return None;
    }

    Some(TextArtefact {
        page_url: page_url.to_string(),
        shingles,
        token_count: tokens.len(),
    })
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    if HIDDEN_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// Lowercased word tokens: alphanumeric runs, apostrophes kept inside
/// words so contractions survive as single tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
        .into_iter()
        .map(|t| t.trim_matches('\'').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExtractConfig {
        ExtractConfig::default()
    }

    #[test]
    fn tokenizes_on_whitespace_and_punctuation() {
        assert_eq!(
            tokenize("Hello, Clone Auditor!"),
            vec!["hello", "clone", "auditor"]
        );
        assert_eq!(tokenize("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn formatting_differences_do_not_change_shingles() {
        let flat = "<p>Welcome to our secure customer portal today</p>";
        let spread = "<div><b>Welcome</b>\n  to <i>our</i>   SECURE\tcustomer portal today</div>";

        let a = text_artefact(flat, "https://a.test/", &config()).unwrap();
        let b = text_artefact(spread, "https://b.test/", &config()).unwrap();
        assert_eq!(a.shingles, b.shingles);
    }

    #[test]
    fn script_and_style_content_is_invisible() {
        let html = r#"<html><head><style>body { color: red }</style></head>
            <body><script>var secret = "alert tracking beacon payload";</script>
            <p>Visible words appear here for the shingle window</p></body></html>"#;

        let artefact = text_artefact(html, "https://a.test/", &config()).unwrap();
        for shingle in &artefact.shingles {
            assert!(!shingle.contains("beacon"));
            assert!(!shingle.contains("color"));
        }
    }

    #[test]
    fn short_shingles_are_dropped() {
        // Five one-letter tokens join to a 9-char shingle, under the floor.
        let html = "<p>a b c d e</p>";
        assert!(text_artefact(html, "https://a.test/", &config()).is_none());
    }

    #[test]
    fn pages_without_text_yield_no_artefact() {
        assert!(text_artefact("<html><body></body></html>", "https://a.test/", &config()).is_none());
    }

    #[test]
    fn shingle_window_slides_with_stride_one() {
        let html = "<p>alpha bravo charlie delta echo foxtrot</p>";
        let artefact = text_artefact(html, "https://a.test/", &config()).unwrap();
        assert!(artefact
            .shingles
            .contains("alpha bravo charlie delta echo"));
        assert!(artefact
            .shingles
            .contains("bravo charlie delta echo foxtrot"));
        assert_eq!(artefact.token_count, 6);
    }
}
