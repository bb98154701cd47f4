use std::sync::LazyLock;

use regex::Regex;

use crate::filter::VERSE_MARKER;

static SCRIPT_SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Select script\s*\nHide\s*\nDisplaying in.*?Aksharamukha").unwrap()
});
static NAVIGATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)Home\n.*?PRINT").unwrap());
static FORMAT_LABELS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)ITX\n.*?PDF").unwrap());
static BLANK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*$").unwrap());
static WHITESPACE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\n").unwrap());
static LATIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]").unwrap());
static VERSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)(.*?॥\s*(\d+)\s*॥)").unwrap());

const NOISE_WORDS: &[&str] = &["home", "print", "pdf", "itx", "select script"];

/// A verse cut from page text, before it gets a ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVerse {
    pub number: String,
    pub text: String,
}

/// Strip site chrome from container text. Order matters: widget and
/// navigation blocks are matched on their English labels before stray
/// Latin letters are removed.
pub fn remove_boilerplate(text: &str) -> String {
    let mut out = SCRIPT_SELECTOR_RE.replace_all(text, "").into_owned();
    for re in [
        &*NAVIGATION_RE,
        &*FORMAT_LABELS_RE,
        &*BLANK_LINE_RE,
        &*WHITESPACE_LINE_RE,
        &*LATIN_RE,
    ] {
        out = re.replace_all(&out, "").into_owned();
    }
    out
}

fn is_noise_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    NOISE_WORDS.iter().any(|w| lower.contains(w))
        || line.chars().all(char::is_numeric)
        || LATIN_RE.is_match(line)
}

/// Keep the verse-bearing lines of a span and drop its end marker.
pub fn clean_span(span: &str) -> String {
    let kept: Vec<&str> = span
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_noise_line(l))
        .collect();
    VERSE_MARKER
        .replace_all(&kept.join("\n"), "")
        .trim()
        .to_string()
}

/// Remove `heading` wherever it occurs in the lines of `text`. Returns `None`
/// when nothing is left.
pub fn strip_heading(text: &str, heading: &str) -> Option<String> {
    if heading.is_empty() || !text.contains(heading) {
        return Some(text.to_string());
    }
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.replace(heading, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    let joined = lines.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Cut cleaned body text into numbered verses. Spans with no text left after
/// cleaning are dropped; the first surviving span loses the page heading.
pub fn split_verses(body: &str, heading: &str) -> Vec<RawVerse> {
    let mut verses: Vec<RawVerse> = Vec::new();
    for caps in VERSE_RE.captures_iter(body) {
        let number = caps[2].to_string();
        let text = clean_span(caps[1].trim());
        if text.is_empty() {
            tracing::debug!("Verse {} marker found, but no text before it", number);
            continue;
        }
        let text = if verses.is_empty() {
            match strip_heading(&text, heading) {
                Some(t) => t,
                None => continue,
            }
        } else {
            text
        };
        verses.push(RawVerse { number, text });
    }
    verses
}
