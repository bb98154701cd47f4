use super::{Segmenter, Span, VerseRule};
use crate::numerals;

/// Verses numbered from 1 within each chapter, with no chapter headings:
/// every verse numbered 1 opens the next chapter.
#[derive(Debug, Clone)]
pub struct RunningCounterSegmenter {
    pub verse: VerseRule,
}

impl Default for RunningCounterSegmenter {
    fn default() -> Self {
        Self {
            verse: VerseRule::numbered(),
        }
    }
}

impl Segmenter for RunningCounterSegmenter {
    fn segment(&self, text: &str) -> Vec<Span> {
        let mut chapter = 0u32;
        self.verse
            .verses(text)
            .map(|(verse, number)| {
                if numerals::parse_number(number) == Some(1) {
                    chapter += 1;
                }
                Span::new(vec![chapter.to_string(), number.to_string()], verse)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(spans: &[Span]) -> Vec<String> {
        spans.iter().map(|s| s.path.join(".")).collect()
    }

    #[test]
    fn chapter_advances_on_verse_one() {
        let text = "अथ वाधूलगृह्यम् १ द्वितीयम् २ तृतीयम् ३\nपुनः प्रथमम् १ ततः २";
        let spans = RunningCounterSegmenter::default().segment(text);
        assert_eq!(paths(&spans), vec!["1.१", "1.२", "1.३", "2.१", "2.२"]);
        assert_eq!(spans[3].text, "पुनः प्रथमम्");
    }

    #[test]
    fn text_before_first_verse_one_is_chapter_zero() {
        let spans = RunningCounterSegmenter::default().segment("भूमिका ५ अथ १");
        assert_eq!(paths(&spans), vec!["0.५", "1.१"]);
    }

    #[test]
    fn fixture_vadhula() {
        let md = std::fs::read_to_string("tests/fixtures/vadhula_grihya_sutra.md").unwrap();
        let spans = RunningCounterSegmenter::default().segment(&md);
        assert_eq!(spans.len(), 5);
        assert_eq!(spans.last().unwrap().path, vec!["2", "२"]);
    }
}
