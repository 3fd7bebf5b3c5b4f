//! Structural fingerprinting: tag n-grams over the DOM tag stream.
//!
//! Only tag identity and nesting order contribute; attribute values and
//! text content are excluded, so a restyled clone with identical layout
//! still fingerprints the same.

use scraper::{ElementRef, Html};

use crate::types::artefact::StructureArtefact;
use crate::types::config::ExtractConfig;

/// Subtrees excluded from the tag stream.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "template", "noscript", "svg"];

/// Build the structure artefact for a page, if it has any tags.
pub fn structure_artefact(
    html: &str,
    page_url: &str,
    config: &ExtractConfig,
) -> Option<StructureArtefact> {
    let document = Html::parse_document(html);
    let mut stream = Vec::new();
    collect_tag_stream(document.root_element(), &mut stream);

    if stream.is_empty() {
        return None;
    }

    // Pages with fewer tags than the window still get one n-gram of the
    // whole stream, so tiny pages remain comparable.
    let tag_ngrams: std::collections::BTreeSet<String> = if stream.len() < config.tag_window {
        std::iter::once(stream.join(">")).collect()
    } else {
        stream
            .windows(config.tag_window)
            .map(|window| window.join(">"))
            .collect()
    };

    Some(StructureArtefact {
        page_url: page_url.to_string(),
        tag_ngrams,
    })
}

/// Document-order tag names, skipping excluded subtrees entirely.
fn collect_tag_stream(element: ElementRef<'_>, stream: &mut Vec<String>) {
    let name = element.value().name();
    if EXCLUDED_TAGS.contains(&name) {
        return;
    }
    stream.push(name.to_string());
    for child in element.child_elements() {
        collect_tag_stream(child, stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExtractConfig {
        ExtractConfig::default()
    }

    #[test]
    fn attributes_and_text_do_not_contribute() {
        let plain = "<html><body><div><p>one</p><p>two</p></div></body></html>";
        let styled = r#"<html><body><div class="hero" id="x"><p style="color:red">uno</p><p>dos</p></div></body></html>"#;

        let a = structure_artefact(plain, "https://a.test/", &config()).unwrap();
        let b = structure_artefact(styled, "https://b.test/", &config()).unwrap();
        assert_eq!(a.tag_ngrams, b.tag_ngrams);
    }

    #[test]
    fn script_subtrees_are_excluded_from_the_stream() {
        let with_script =
            "<html><body><div><script><span>x</span></script><p>t</p></div></body></html>";
        let without = "<html><body><div><p>t</p></div></body></html>";

        let a = structure_artefact(with_script, "https://a.test/", &config()).unwrap();
        let b = structure_artefact(without, "https://b.test/", &config()).unwrap();
        assert_eq!(a.tag_ngrams, b.tag_ngrams);
    }

    #[test]
    fn window_captures_nesting_order() {
        let html = "<html><body><main><article><h1>t</h1></article></main></body></html>";
        let artefact = structure_artefact(html, "https://a.test/", &config()).unwrap();
        assert!(artefact.tag_ngrams.contains("body>main>article>h1"));
    }

    #[test]
    fn tiny_pages_get_a_single_ngram() {
        let html = "<html></html>";
        let artefact = structure_artefact(html, "https://a.test/", &config()).unwrap();
        // html5ever supplies html/head/body even for minimal input.
        assert_eq!(artefact.tag_ngrams.len(), 1);
    }
}
