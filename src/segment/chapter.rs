use std::sync::LazyLock;

use regex::Regex;

use super::{Segmenter, Span};

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(?P<text>.+?)\s(?P<num>\d+)").unwrap());
static DEVANAGARI_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(?P<text>.+?)\s(?P<num>[०-९]+)").unwrap());
static NUMBER_LINE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(?P<text>.*?)(?P<num>\d+)\s*(?:\n|$)").unwrap());
static NUMERAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(.*?)\n([०-९]+)\s*(?:\n|$)").unwrap());

/// How verse text and its number are found inside a section, via the
/// groups `text` and `num`.
#[derive(Debug, Clone)]
pub struct VerseRule(Regex);

impl VerseRule {
    /// Text, whitespace, then a number in either script.
    pub fn numbered() -> Self {
        Self(NUMBERED.clone())
    }

    /// Text, whitespace, then Devanagari digits only.
    pub fn devanagari_numbered() -> Self {
        Self(DEVANAGARI_NUMBERED.clone())
    }

    /// Text ending in a number at the end of its line.
    pub fn number_at_line_end() -> Self {
        Self(NUMBER_LINE_END.clone())
    }

    /// `(text, number)` pairs in order, text trimmed.
    pub fn verses<'t>(&'t self, text: &'t str) -> impl Iterator<Item = (&'t str, &'t str)> + 't {
        self.0.captures_iter(text).filter_map(|caps| {
            let body = caps.name("text")?.as_str().trim();
            let num = caps.name("num")?.as_str();
            Some((body, num))
        })
    }
}

/// One level of a document's chapter structure.
#[derive(Debug, Clone)]
pub enum Divider {
    /// Split on every occurrence of a literal phrase.
    Delimiter(String),
    /// Each match closes a section. A `num` group, when present, labels the
    /// section; otherwise sections are numbered by position. Text after the
    /// last closing phrase is dropped; without any match the whole text is
    /// one section.
    Closing(Regex),
    /// Each match opens a section; text before the first match is dropped.
    /// `implicit_opener` is prepended to the text so that a section start
    /// with no written opener still counts as one.
    Heading {
        pattern: Regex,
        implicit_opener: Option<String>,
    },
    /// A line holding only Devanagari digits closes a section; whatever
    /// follows the last such line forms a final section.
    NumeralLine,
}

/// A labelled slice of text produced by one divider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub text: String,
}

fn section(label: impl ToString, text: &str) -> Option<Section> {
    let text = text.trim();
    (!text.is_empty()).then(|| Section {
        label: label.to_string(),
        text: text.to_string(),
    })
}

impl Divider {
    /// Non-empty sections in order. Empty ones are skipped but still use up
    /// their positional number.
    pub fn split(&self, text: &str) -> Vec<Section> {
        match self {
            Divider::Delimiter(phrase) => text
                .split(phrase.as_str())
                .enumerate()
                .filter_map(|(i, part)| section(i + 1, part))
                .collect(),
            Divider::Closing(re) => {
                let mut out = Vec::new();
                let mut last_end = 0;
                let mut any = false;
                for (i, caps) in re.captures_iter(text).enumerate() {
                    any = true;
                    let Some(m) = caps.get(0) else { continue };
                    let label = caps
                        .name("num")
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_else(|| (i + 1).to_string());
                    out.extend(section(label, &text[last_end..m.start()]));
                    last_end = m.end();
                }
                if !any {
                    out.extend(section(1, text));
                }
                out
            }
            Divider::Heading {
                pattern,
                implicit_opener,
            } => {
                let owned;
                let text = match implicit_opener {
                    Some(opener) => {
                        owned = format!("{}{}", opener, text);
                        owned.as_str()
                    }
                    None => text,
                };
                let starts: Vec<(usize, usize)> =
                    pattern.find_iter(text).map(|m| (m.start(), m.end())).collect();
                starts
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &(_, body_start))| {
                        let body_end = starts.get(i + 1).map_or(text.len(), |&(s, _)| s);
                        section(i + 1, &text[body_start..body_end])
                    })
                    .collect()
            }
            Divider::NumeralLine => {
                let mut out = Vec::new();
                let mut last_end = 0;
                let mut count = 0;
                for (i, caps) in NUMERAL_LINE.captures_iter(text).enumerate() {
                    count = i + 1;
                    out.extend(section(count, &caps[1]));
                    if let Some(m) = caps.get(0) {
                        last_end = m.end();
                    }
                }
                if last_end < text.len() {
                    out.extend(section(count + 1, &text[last_end..]));
                }
                out
            }
        }
    }
}

/// Nested chapter structure: each divider splits the sections produced by
/// the one before it, then the verse rule numbers the verses inside.
#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    pub dividers: Vec<Divider>,
    pub verse: VerseRule,
}

impl Segmenter for ChapterSegmenter {
    fn segment(&self, text: &str) -> Vec<Span> {
        let mut sections: Vec<(Vec<String>, String)> = vec![(Vec::new(), text.to_string())];
        for divider in &self.dividers {
            sections = sections
                .into_iter()
                .flat_map(|(path, body)| {
                    divider.split(&body).into_iter().map(move |s| {
                        let mut p = path.clone();
                        p.push(s.label);
                        (p, s.text)
                    })
                })
                .collect();
        }

        let mut spans = Vec::new();
        for (path, body) in &sections {
            for (verse, num) in self.verse.verses(body) {
                let mut p = path.clone();
                p.push(num.to_string());
                spans.push(Span::new(p, verse));
            }
        }
        spans
    }
}
