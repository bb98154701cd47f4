use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::Html;
use tracing::debug;

use crate::html;
use crate::numerals::NumeralStyle;
use crate::records::{Envelope, VerseRecord};
use crate::segment::{
    self, ChapterSegmenter, Divider, LeadingNumberSegmenter, ParagraphSegmenter,
    RunningCounterSegmenter, Segmenter, SegmenterKind, VerseMarkerSegmenter, VerseRule,
};

const NOMINATIVE_ORDINALS: &str = "प्रथमः|द्वितीयः|तृतीयः|चतुर्थः|पञ्चमः|षष्ठः|सप्तमः|अष्टमः|नवमः|दशमः";

/// Documents with a known layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    Devala,
    Vadhula,
    VashishthaSmriti,
    Kaushitaka,
    Gobhila,
    Hiranyakeshi,
    VasishthaDharma,
    Brihajjataka,
    Vivahapatala,
    Suryasiddhanta,
}

/// Segmenter families usable on any document given a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Family {
    /// Blank-line paragraphs ending in a number
    Paragraph,
    /// Verse numbers restart at 1 for each chapter
    RunningCounter,
    /// `…ऽध्यायः` headings and `॥ N ॥` verse ends
    VerseMarker,
    /// Lines opening with `N text`
    NumberFirst,
    /// Lines opening with `N.M:`
    DottedColon,
}

/// Everything needed to turn one document's text into records.
pub struct DocumentProfile {
    pub name: String,
    pub segmenter: SegmenterKind,
    pub numerals: NumeralStyle,
    pub envelope: Envelope,
    /// Applied to each verse in order, trimming after each.
    pub strip: Vec<Regex>,
}

/// Preset patterns are literals.
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

impl DocumentProfile {
    pub fn new(name: impl Into<String>, segmenter: SegmenterKind, numerals: NumeralStyle) -> Self {
        Self {
            name: name.into(),
            segmenter,
            numerals,
            envelope: Envelope::Array,
            strip: Vec::new(),
        }
    }

    pub fn preset(preset: Preset) -> Self {
        use NumeralStyle::*;
        match preset {
            Preset::Devala => Self::new(
                "devala-smRtiH",
                SegmenterKind::Paragraph(ParagraphSegmenter),
                Source,
            ),
            Preset::Vadhula => Self::new(
                "vadhula_grihya_sutra",
                SegmenterKind::RunningCounter(RunningCounterSegmenter::default()),
                Devanagari,
            ),
            Preset::VashishthaSmriti => Self {
                strip: vec![
                    re(r"इति वासिष्ठे धर्मशास्त्रे\s*[^।]+।"),
                    re(r"^.*ऽध्यायः\s*"),
                    re(r"^।\s*"),
                ],
                ..Self::new(
                    "vashishtha_smriti",
                    SegmenterKind::RunningCounter(RunningCounterSegmenter::default()),
                    Devanagari,
                )
            },
            Preset::Kaushitaka => Self::new(
                "kaushitaka_grihya_sutra",
                SegmenterKind::Chapter(ChapterSegmenter {
                    dividers: vec![
                        Divider::Closing(re(r"इति कौषीतकगृह्ये\s*(.*?)\s*(?:\n|$)")),
                        Divider::Heading {
                            pattern: re(r"अथ[^\n]*?खण्डः"),
                            implicit_opener: Some("अथ ".to_string()),
                        },
                    ],
                    verse: VerseRule::numbered(),
                }),
                Devanagari,
            ),
            Preset::Gobhila => Self::new(
                "gobhila_grihya_sutra",
                SegmenterKind::Chapter(ChapterSegmenter {
                    dividers: vec![
                        Divider::Closing(re(&format!(
                            r"इति\s*(?:{})\s+प्रपाठकः\s*(?:\n|$)",
                            NOMINATIVE_ORDINALS
                        ))),
                        Divider::NumeralLine,
                    ],
                    verse: VerseRule::devanagari_numbered(),
                }),
                Devanagari,
            ),
            Preset::Hiranyakeshi => Self::new(
                "hiranyakeshi_grihya_sutra",
                SegmenterKind::Chapter(ChapterSegmenter {
                    dividers: vec![
                        Divider::Delimiter("प्रथमः प्रश्नः समाप्तः".to_string()),
                        Divider::Closing(re(&format!(
                            r"(?:{})\s+पटलः\s*(?:\n|$)",
                            NOMINATIVE_ORDINALS
                        ))),
                        Divider::NumeralLine,
                    ],
                    verse: VerseRule::devanagari_numbered(),
                }),
                Devanagari,
            ),
            Preset::VasishthaDharma => Self::new(
                "vasishtha_dharma_sutra",
                SegmenterKind::Chapter(ChapterSegmenter {
                    dividers: vec![Divider::Closing(re(
                        r"इति वासिष्ठधर्मशास्त्रे\s*.*?ऽध्यायः\s*(?P<num>\d+)",
                    ))],
                    verse: VerseRule::number_at_line_end(),
                }),
                Source,
            ),
            Preset::Brihajjataka => Self::new(
                "बृहज्जातक",
                SegmenterKind::VerseMarker(VerseMarkerSegmenter),
                Arabic,
            ),
            Preset::Vivahapatala => Self {
                envelope: Envelope::Verses,
                ..Self::new(
                    "vivAhapaTala",
                    SegmenterKind::LeadingNumber(LeadingNumberSegmenter::number_first()),
                    Source,
                )
            },
            Preset::Suryasiddhanta => Self::new(
                "sUryasiddhAntaH_pAThAntaropetaH",
                SegmenterKind::LeadingNumber(LeadingNumberSegmenter::dotted_colon()),
                Source,
            ),
        }
    }

    pub fn family(family: Family, name: &str, numerals: NumeralStyle) -> Self {
        let segmenter = match family {
            Family::Paragraph => SegmenterKind::Paragraph(ParagraphSegmenter),
            Family::RunningCounter => SegmenterKind::RunningCounter(RunningCounterSegmenter::default()),
            Family::VerseMarker => SegmenterKind::VerseMarker(VerseMarkerSegmenter),
            Family::NumberFirst => SegmenterKind::LeadingNumber(LeadingNumberSegmenter::number_first()),
            Family::DottedColon => SegmenterKind::LeadingNumber(LeadingNumberSegmenter::dotted_colon()),
        };
        Self::new(name, segmenter, numerals)
    }

    fn clean(&self, verse: &str) -> String {
        self.strip.iter().fold(verse.trim().to_string(), |text, re| {
            re.replace_all(&text, "").trim().to_string()
        })
    }

    /// Records for a whole document, in document order.
    pub fn parse(&self, text: &str) -> Vec<VerseRecord> {
        let text = text.replace("\r\n", "\n");
        let mut spans = self.segmenter.segment(&text);
        for span in &mut spans {
            span.text = self.clean(&span.text);
        }
        debug!("{}: {} spans", self.name, spans.len());
        segment::build_records(spans, &self.name, self.numerals)
    }

    /// Parse a Markdown/text file, or the `<pre>` text of a saved HTML page.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<VerseRecord>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        let text = if is_html {
            let doc = Html::parse_document(&raw);
            html::pre_text(&doc)
                .with_context(|| format!("No <pre> block in {}", path.display()))?
        } else {
            raw
        };
        Ok(self.parse(&text))
    }
}
