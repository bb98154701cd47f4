use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use super::{Segmenter, Span};
use crate::numerals;

static ADHYAYA_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(.*?ऽध्यायः)\s*$").unwrap());
static VERSE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(.*)(॥\s*([०-९]+)\s*॥)\s*$").unwrap());

pub const UNKNOWN_ADHYAYA: &str = "Unknown Adhyaya";

/// Line-oriented texts where `…ऽध्यायः` lines open chapters and every verse
/// closes with `॥ N ॥`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerseMarkerSegmenter;

impl Segmenter for VerseMarkerSegmenter {
    fn segment(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut chapter: u32 = 1;
        let mut chapter_name = UNKNOWN_ADHYAYA.to_string();
        let mut buffer: Vec<&str> = Vec::new();

        for line in text.lines() {
            let stripped = line.trim();

            if let Some(caps) = ADHYAYA_HEADING_RE.captures(stripped) {
                let name = caps[1].trim().to_string();
                let ordinal = name.split('ऽ').next().unwrap_or_default();
                match numerals::ordinal_value(ordinal) {
                    Some(n) => chapter = n,
                    None => warn!("No chapter number in heading {:?}; keeping {}", name, chapter),
                }
                if !buffer.is_empty() {
                    warn!("Discarding unterminated text before {:?}: {}", name, buffer.join(" "));
                    buffer.clear();
                }
                chapter_name = name;
                continue;
            }

            if stripped.is_empty() {
                continue;
            }
            buffer.push(line);

            let Some(end) = VERSE_END_RE.captures(stripped) else {
                continue;
            };
            let number = numerals::parse_number(&end[3]);
            let joined = buffer.join("\n");
            buffer.clear();

            let Some(number) = number else {
                warn!("Verse number {} out of range in {}; verse skipped", &end[3], chapter_name);
                continue;
            };
            let verse = VERSE_END_RE
                .captures(&joined)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default();
            if verse.is_empty() {
                continue;
            }

            let mut metadata = Map::new();
            metadata.insert("adhyaya_name".to_string(), Value::from(chapter_name.clone()));
            spans.push(Span {
                path: vec![chapter.to_string(), number.to_string()],
                text: verse,
                metadata: Some(metadata),
            });
        }

        if !buffer.is_empty() {
            warn!("Trailing text without a verse marker: {}", buffer.join(" "));
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapters_from_ordinal_headings() {
        let text = "\
प्रथमोऽध्यायः
मूर्तित्वे परिकल्पितः शशभृतो
वर्त्मापुनर्जन्मनाम् ॥ १॥

होरेत्यहोरात्रविकल्पमेके ॥ २ ॥
द्वितीयोऽध्यायः
कालात्मा दिनकृन्मनस्तुहिनगुः ॥ १ ॥";
        let spans = VerseMarkerSegmenter.segment(text);
        let paths: Vec<String> = spans.iter().map(|s| s.path.join(".")).collect();
        assert_eq!(paths, vec!["1.1", "1.2", "2.1"]);
        assert_eq!(spans[0].text, "मूर्तित्वे परिकल्पितः शशभृतो\nवर्त्मापुनर्जन्मनाम्");
        assert_eq!(
            spans[2].metadata.as_ref().unwrap()["adhyaya_name"],
            Value::from("द्वितीयोऽध्यायः")
        );
    }

    #[test]
    fn unknown_ordinal_keeps_number_but_renames() {
        let text = "तृतीयोऽध्यायः\nक ॥ १ ॥\nअज्ञातोऽध्यायः\nख ॥ २ ॥";
        let spans = VerseMarkerSegmenter.segment(text);
        assert_eq!(spans[1].path, vec!["3", "2"]);
        assert_eq!(
            spans[1].metadata.as_ref().unwrap()["adhyaya_name"],
            Value::from("अज्ञातोऽध्यायः")
        );
    }

    #[test]
    fn oversized_verse_number_skips_only_that_verse() {
        let text = "प्रथमोऽध्यायः\nक ॥ ९९९९९९९९९९९ ॥\nख ॥ २ ॥";
        let spans = VerseMarkerSegmenter.segment(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].path, vec!["1", "2"]);
        assert_eq!(spans[0].text, "ख");
    }

    #[test]
    fn heading_discards_open_buffer_and_default_chapter() {
        let text = "भूमिका ॥ ३ ॥\nअसमाप्तम्\nचतुर्थोऽध्यायः\nग ॥ १ ॥\nशेषः";
        let spans = VerseMarkerSegmenter.segment(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].path, vec!["1", "3"]);
        assert_eq!(spans[0].metadata.as_ref().unwrap()["adhyaya_name"], Value::from(UNKNOWN_ADHYAYA));
        assert_eq!(spans[1].path, vec!["4", "1"]);
        assert_eq!(spans[1].text, "ग");
    }
}
