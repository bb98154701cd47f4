use std::sync::LazyLock;

use regex::Regex;

use super::{Segmenter, Span};

static TRAILING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^(.*)\s(\d+)$").unwrap());
static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").unwrap());

/// One verse per blank-line paragraph, numbered by the paragraph's last token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphSegmenter;

impl Segmenter for ParagraphSegmenter {
    fn segment(&self, text: &str) -> Vec<Span> {
        PARAGRAPH_BREAK_RE
            .split(text.trim())
            .filter_map(|para| {
                let joined = para
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                let caps = TRAILING_NUMBER_RE.captures(&joined)?;
                let verse = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
                Some(Span::new(vec![caps[2].to_string()], verse))
            })
            .collect()
    }
}
