use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{Segmenter, Span};
use crate::numerals;

static NUMBER_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>\d+)\s+(?P<text>.*)").unwrap());
static DOTTED_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>\d+\.\d+)\s*:\s*(?P<text>.*)").unwrap());

/// Lines that open with a verse number. A number seen again extends the
/// earlier verse rather than starting a new one.
#[derive(Debug, Clone)]
pub struct LeadingNumberSegmenter {
    /// Must define `num` and `text` groups.
    pub pattern: Regex,
    /// Unnumbered lines continue the open verse; otherwise they are ignored.
    pub continuation: bool,
    /// Order verses by numeric value instead of first appearance.
    pub sort_numeric: bool,
}

impl LeadingNumberSegmenter {
    /// `12 text…`, continuation lines allowed, sorted by number.
    pub fn number_first() -> Self {
        Self {
            pattern: NUMBER_FIRST_RE.clone(),
            continuation: true,
            sort_numeric: true,
        }
    }

    /// `1.01: text…`, one line per entry, in document order.
    pub fn dotted_colon() -> Self {
        Self {
            pattern: DOTTED_COLON_RE.clone(),
            continuation: false,
            sort_numeric: false,
        }
    }
}

fn sort_key(label: &str) -> Vec<u32> {
    label
        .split('.')
        .map(|part| numerals::parse_number(part).unwrap_or(u32::MAX))
        .collect()
}

impl Segmenter for LeadingNumberSegmenter {
    fn segment(&self, text: &str) -> Vec<Span> {
        let mut order: Vec<String> = Vec::new();
        let mut verses: HashMap<String, Vec<String>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(caps) = self.pattern.captures(line) {
                let num = caps.name("num").map_or("", |m| m.as_str()).to_string();
                let body = caps.name("text").map_or("", |m| m.as_str().trim()).to_string();
                let entry = verses.entry(num.clone()).or_insert_with(|| {
                    order.push(num.clone());
                    Vec::new()
                });
                entry.push(body);
                current = Some(num);
            } else if self.continuation {
                if let Some(lines) = current.as_ref().and_then(|n| verses.get_mut(n)) {
                    lines.push(line.to_string());
                }
            }
        }

        if self.sort_numeric {
            order.sort_by_key(|n| sort_key(n));
        }

        order
            .into_iter()
            .filter_map(|num| {
                let lines = verses.remove(&num)?;
                let body = lines
                    .iter()
                    .map(String::as_str)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(Span::new(vec![num], body))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_numbers_merge_and_sort() {
        let text = "2 द्वितीयः पादः\nअनुवृत्तिः\n1 प्रथमः\n10 दशमः\n2 पुनः द्वितीयः";
        let spans = LeadingNumberSegmenter::number_first().segment(text);
        let labels: Vec<&str> = spans.iter().map(|s| s.path[0].as_str()).collect();
        assert_eq!(labels, vec!["1", "2", "10"]);
        assert_eq!(spans[1].text, "द्वितीयः पादः\nअनुवृत्तिः\nपुनः द्वितीयः");
    }

    #[test]
    fn text_before_first_number_is_ignored() {
        let spans = LeadingNumberSegmenter::number_first().segment("विवाहपटलः\n1 अथ");
        assert_eq!(spans, vec![Span::new(vec!["1".into()], "अथ")]);
    }

    #[test]
    fn dotted_entries_keep_document_order() {
        let text = "१.०२ : द्वितीयम्\nटिप्पणी\n१.०१: प्रथमम्\n१.०२: पाठान्तरम्";
        let spans = LeadingNumberSegmenter::dotted_colon().segment(text);
        let labels: Vec<&str> = spans.iter().map(|s| s.path[0].as_str()).collect();
        assert_eq!(labels, vec!["१.०२", "१.०१"]);
        assert_eq!(spans[0].text, "द्वितीयम्\nपाठान्तरम्");
    }
}
