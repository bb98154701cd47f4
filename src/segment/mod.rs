//! Turning transcribed documents (Markdown or page text) into cited verses.
//!
//! A [`Segmenter`] cuts text into [`Span`]s, each carrying the positional
//! labels (chapter, section, verse) that locate it. [`build_records`] then
//! renders those labels into `name->a.b.c` refs.

pub mod chapter;
pub mod leading;
pub mod marker;
pub mod paragraph;
pub mod running;

use serde_json::{Map, Value};

use crate::numerals::NumeralStyle;
use crate::records::VerseRecord;

pub use chapter::{ChapterSegmenter, Divider, VerseRule};
pub use leading::LeadingNumberSegmenter;
pub use marker::VerseMarkerSegmenter;
pub use paragraph::ParagraphSegmenter;
pub use running::RunningCounterSegmenter;

pub const REF_SEPARATOR: &str = "->";

/// A verse and the labels that locate it, outermost first, verse number last.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub path: Vec<String>,
    pub text: String,
    pub metadata: Option<Map<String, Value>>,
}

impl Span {
    pub fn new(path: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            path,
            text: text.into(),
            metadata: None,
        }
    }
}

pub trait Segmenter {
    /// Ordered spans found in `text`. Never fails: text that matches no rule
    /// yields no spans.
    fn segment(&self, text: &str) -> Vec<Span>;
}

/// The segmenter families, chosen explicitly per document.
pub enum SegmenterKind {
    Paragraph(ParagraphSegmenter),
    RunningCounter(RunningCounterSegmenter),
    Chapter(ChapterSegmenter),
    VerseMarker(VerseMarkerSegmenter),
    LeadingNumber(LeadingNumberSegmenter),
}

impl Segmenter for SegmenterKind {
    fn segment(&self, text: &str) -> Vec<Span> {
        match self {
            SegmenterKind::Paragraph(s) => s.segment(text),
            SegmenterKind::RunningCounter(s) => s.segment(text),
            SegmenterKind::Chapter(s) => s.segment(text),
            SegmenterKind::VerseMarker(s) => s.segment(text),
            SegmenterKind::LeadingNumber(s) => s.segment(text),
        }
    }
}

pub fn format_ref(name: &str, path: &[String], style: NumeralStyle) -> String {
    let labels: Vec<String> = path.iter().map(|p| style.apply(p)).collect();
    format!("{}{}{}", name, REF_SEPARATOR, labels.join("."))
}

/// Render spans as records named after `name`. Spans whose text is blank are
/// dropped.
pub fn build_records(spans: Vec<Span>, name: &str, style: NumeralStyle) -> Vec<VerseRecord> {
    spans
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| {
            let record = VerseRecord::new(format_ref(name, &s.path, style), s.text.trim());
            match s.metadata {
                Some(m) => record.with_metadata(m),
                None => record,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_paragraph_document_gets_sequential_refs() {
        let text = "यः प्रजाः। १\n\nवेदयिष्ये। २\n\nस गुरुः। ३";
        let spans = RunningCounterSegmenter::default().segment(text);
        let records = build_records(spans, "doc", NumeralStyle::Arabic);

        let refs: Vec<&str> = records.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(refs, vec!["doc->1.1", "doc->1.2", "doc->1.3"]);
        let verses: Vec<&str> = records.iter().map(|r| r.verse.as_str()).collect();
        assert_eq!(verses, vec!["यः प्रजाः।", "वेदयिष्ये।", "स गुरुः।"]);
    }

    #[test]
    fn m_numbered_segments_give_m_records() {
        let m = 12;
        let text: String = (1..=m)
            .map(|i| format!("श्लोकः {} अत्र {}\n\n", "क".repeat(i), i))
            .collect();
        let records = build_records(ParagraphSegmenter.segment(&text), "देवल", NumeralStyle::Devanagari);
        assert_eq!(records.len(), m);
        for (i, r) in records.iter().enumerate() {
            assert!(!r.verse.is_empty());
            assert!(r.reference.ends_with(&crate::numerals::to_devanagari(&(i + 1).to_string())));
        }
    }

    #[test]
    fn blank_spans_dropped_and_metadata_kept() {
        let mut meta = Map::new();
        meta.insert("adhyaya_name".into(), Value::from("प्रथमोऽध्यायः"));
        let spans = vec![
            Span::new(vec!["1".into(), "1".into()], "  "),
            Span {
                path: vec!["1".into(), "2".into()],
                text: "राशिः".into(),
                metadata: Some(meta.clone()),
            },
        ];
        let records = build_records(spans, "बृहज्जातक", NumeralStyle::Source);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reference, "बृहज्जातक->1.2");
        assert_eq!(records[0].metadata, Some(meta));
    }
}
