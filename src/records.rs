use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One extracted verse with its hierarchical citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    #[serde(rename = "ref")]
    pub reference: String,
    pub verse: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl VerseRecord {
    pub fn new(reference: impl Into<String>, verse: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            verse: verse.into(),
            document_link: None,
            metadata: None,
        }
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.document_link = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Top-level shape of a records file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Envelope {
    /// `[ {...}, {...} ]`
    #[default]
    Array,
    /// `{ "verses": [ {...} ] }`
    Verses,
}

#[derive(Serialize)]
struct VersesEnvelope<'a> {
    verses: &'a [VerseRecord],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyEnvelope {
    Array(Vec<VerseRecord>),
    Verses { verses: Vec<VerseRecord> },
}

pub fn to_json(records: &[VerseRecord], envelope: Envelope) -> Result<String> {
    let text = match envelope {
        Envelope::Array => serde_json::to_string_pretty(records)?,
        Envelope::Verses => serde_json::to_string_pretty(&VersesEnvelope { verses: records })?,
    };
    Ok(text)
}

/// Write records as indented UTF-8 JSON. Non-ASCII text is written literally.
pub fn write_records(path: &Path, records: &[VerseRecord], envelope: Envelope) -> Result<()> {
    let text = to_json(records, envelope)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Read a records file in either envelope.
pub fn read_records(path: &Path) -> Result<Vec<VerseRecord>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: AnyEnvelope = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(match parsed {
        AnyEnvelope::Array(records) => records,
        AnyEnvelope::Verses { verses } => verses,
    })
}

/// Refs that occur more than once, with their counts, in first-seen order.
pub fn duplicate_refs(records: &[VerseRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for r in records {
        let n = counts.entry(r.reference.as_str()).or_insert(0);
        if *n == 0 {
            order.push(r.reference.as_str());
        }
        *n += 1;
    }
    order
        .into_iter()
        .filter_map(|r| {
            let n = counts[r];
            (n > 1).then(|| (r.to_string(), n))
        })
        .collect()
}

/// Log duplicate refs as a warning diagnostic. Returns how many distinct refs repeat.
pub fn report_duplicates(source: &str, records: &[VerseRecord]) -> usize {
    let dupes = duplicate_refs(records);
    for (reference, count) in &dupes {
        tracing::warn!("{}: ref {} appears {} times", source, reference, count);
    }
    dupes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_ref_field_name_and_skips_empty_options() {
        let json = to_json(&[VerseRecord::new("देवल->१", "धर्मः")], Envelope::Array).unwrap();
        assert!(json.contains("\"ref\": \"देवल->१\""));
        assert!(!json.contains("document_link"));
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn writes_non_ascii_literally() {
        let json = to_json(&[VerseRecord::new("a->1", "॥ १ ॥")], Envelope::Array).unwrap();
        assert!(json.contains("॥ १ ॥"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn verses_envelope_wraps_array() {
        let json = to_json(&[VerseRecord::new("x->1", "v")], Envelope::Verses).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["verses"][0]["ref"], "x->1");
    }

    #[test]
    fn reads_both_envelopes() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            VerseRecord::new("x->1", "a").with_link("https://example.org/a.html"),
            VerseRecord::new("x->2", "b"),
        ];
        let array = dir.path().join("array.json");
        let wrapped = dir.path().join("nested/wrapped.json");
        write_records(&array, &records, Envelope::Array).unwrap();
        write_records(&wrapped, &records, Envelope::Verses).unwrap();
        assert_eq!(read_records(&array).unwrap(), records);
        assert_eq!(read_records(&wrapped).unwrap(), records);
    }

    #[test]
    fn finds_duplicates_in_order() {
        let records = vec![
            VerseRecord::new("d->१.१", "a"),
            VerseRecord::new("d->१.२", "b"),
            VerseRecord::new("d->१.१", "c"),
            VerseRecord::new("d->१.२", "d"),
            VerseRecord::new("d->१.१", "e"),
            VerseRecord::new("d->२.१", "f"),
        ];
        assert_eq!(
            duplicate_refs(&records),
            vec![("d->१.१".to_string(), 3), ("d->१.२".to_string(), 2)]
        );
    }
}
