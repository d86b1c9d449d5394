//! Visible paragraph text extraction.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));

/// Elements whose text is never visible.
const HIDDEN_TAGS: &[&str] = &["script", "style"];

/// Join the trimmed text of every `<p>` in `html` with single spaces.
///
/// Text inside `<script>`/`<style>` is dropped and whitespace-only paragraphs
/// are skipped.
pub fn extract_paragraph_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    doc.select(&PARAGRAPH)
        .map(visible_text)
        .filter_map(|text| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenate the text nodes under `el`, skipping hidden subtrees.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != el.id())
            .any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
            });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paragraphs_with_single_spaces() {
        let html = r#"<html><body>
            <h1>Title is not a paragraph</h1>
            <p>  First paragraph.  </p>
            <div><p>Second <b>bold</b> paragraph.</p></div>
        </body></html>"#;
        assert_eq!(
            extract_paragraph_text(html),
            "First paragraph. Second bold paragraph."
        );
    }

    #[test]
    fn skips_whitespace_only_paragraphs() {
        let html = "<p>One</p><p>   </p><p>\n\t</p><p>Two</p>";
        assert_eq!(extract_paragraph_text(html), "One Two");
    }

    #[test]
    fn drops_script_and_style_content() {
        let html = r#"<html><head><style>p { color: red; }</style></head><body>
            <p>Visible<script>var tracking = 1;</script> text</p>
            <script>document.write("<p>injected</p>")</script>
            <p><style>.x{}</style></p>
        </body></html>"#;
        assert_eq!(extract_paragraph_text(html), "Visible text");
    }

    #[test]
    fn page_without_paragraphs_is_empty() {
        let html = "<html><body><div>No paragraphs here</div></body></html>";
        assert_eq!(extract_paragraph_text(html), "");
    }
}
