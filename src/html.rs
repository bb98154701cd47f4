use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::session::SessionError;

static H2: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").unwrap());

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

pub fn selector(css: &str) -> Result<Selector, SessionError> {
    Selector::parse(css).map_err(|e| SessionError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

pub fn has_match(html: &str, css: &str) -> Result<bool, SessionError> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).next().is_some();
    Ok(found)
}

/// Non-empty text nodes under `el`, trimmed, skipping script/style content.
pub fn text_lines<'a>(el: ElementRef<'a>) -> Vec<&'a str> {
    el.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
            });
            if hidden {
                return None;
            }
            let t = text.trim();
            (!t.is_empty()).then_some(t)
        })
        .collect()
}

/// Text of an element with one line per text node.
pub fn text_with_breaks(el: ElementRef) -> String {
    text_lines(el).join("\n")
}

/// What a reader sees in the page body, one line per text node.
pub fn visible_text(doc: &Html) -> String {
    let root = doc.select(&BODY).next().unwrap_or_else(|| doc.root_element());
    text_with_breaks(root)
}

/// Page heading: first `h2`, then `h1`, then `title`, with whitespace collapsed.
pub fn heading(doc: &Html) -> Option<String> {
    [&*H2, &*H1, &*TITLE].into_iter().find_map(|sel| {
        let el = doc.select(sel).next()?;
        let joined: String = el.text().map(str::trim).collect();
        let normalized = joined.split_whitespace().collect::<Vec<_>>().join(" ");
        (!normalized.is_empty()).then_some(normalized)
    })
}

/// First `div` in document order whose text contains `needle`.
pub fn first_div_containing<'a>(doc: &'a Html, needle: &str) -> Option<ElementRef<'a>> {
    doc.select(&DIV).find(|div| div.text().any(|t| t.contains(needle)))
}

/// Raw text of the first `pre` block, line breaks preserved.
pub fn pre_text(doc: &Html) -> Option<String> {
    doc.select(&PRE).next().map(|pre| pre.text().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_prefers_h2_then_h1_then_title() {
        let doc = Html::parse_document(
            "<html><head><title>T</title></head><body><h1>One</h1><h2> शिव   स्तोत्रम् </h2></body></html>",
        );
        assert_eq!(heading(&doc).as_deref(), Some("शिव स्तोत्रम्"));

        let doc = Html::parse_document("<html><head><title>Only title</title></head><body></body></html>");
        assert_eq!(heading(&doc).as_deref(), Some("Only title"));

        let doc = Html::parse_document("<html><body><p>none</p></body></html>");
        assert_eq!(heading(&doc), None);
    }

    #[test]
    fn visible_text_skips_scripts() {
        let doc = Html::parse_document(
            "<html><body><p>नमः</p><script>var x = 1;</script><p>  शिवाय  </p></body></html>",
        );
        assert_eq!(visible_text(&doc), "नमः\nशिवाय");
    }

    #[test]
    fn finds_outermost_div_with_marker() {
        let doc = Html::parse_document(
            r#"<div id="nav">Home</div><div id="outer"><div id="inner">ॐ ॥ १ ॥</div></div>"#,
        );
        let div = first_div_containing(&doc, "॥").unwrap();
        assert_eq!(div.value().attr("id"), Some("outer"));
    }

    #[test]
    fn pre_text_keeps_lines() {
        let doc = Html::parse_document("<body><pre>प्रथमोऽध्यायः\nक ॥ १ ॥\n</pre></body>");
        assert_eq!(pre_text(&doc).as_deref(), Some("प्रथमोऽध्यायः\nक ॥ १ ॥\n"));
        assert_eq!(pre_text(&Html::parse_document("<p>x</p>")), None);
    }

    #[test]
    fn bad_selector_is_an_error() {
        assert!(matches!(has_match("<p></p>", "li[["), Err(SessionError::Selector { .. })));
    }
}
