use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::combiner;
use crate::progress;
use crate::records::{self, Envelope, VerseRecord};

static PARENTHESIZED_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*\(([^)]+)\)\s*(.*)$").unwrap());
static DASH_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([^\s-]+)\s*-\s*[\n\r]+(.*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub removed_text: String,
    pub position: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModifiedVerse {
    #[serde(rename = "ref")]
    pub reference: String,
    pub document_link: Option<String>,
    pub original_verse: String,
    pub modified_verse: String,
    pub modifications: Vec<Modification>,
}

/// Strip a leading `(word)` and then a leading `word -` line from a verse.
pub fn clean_verse(verse: &str) -> (String, Vec<Modification>) {
    let mut text = verse.to_string();
    let mut mods = Vec::new();

    if let Some(caps) = PARENTHESIZED_PREFIX_RE.captures(&text) {
        mods.push(Modification {
            kind: "removed_parentheses",
            removed_text: format!("({})", &caps[1]),
            position: "start",
        });
        text = caps[2].to_string();
    }
    if let Some(caps) = DASH_PREFIX_RE.captures(&text) {
        mods.push(Modification {
            kind: "removed_dash_prefix",
            removed_text: format!("{}-", &caps[1]),
            position: "start",
        });
        text = caps[2].to_string();
    }

    (text.trim().to_string(), mods)
}

/// Clean every record in place; returns the log entries for changed ones.
pub fn clean_records(records: &mut [VerseRecord]) -> Vec<ModifiedVerse> {
    let mut modified = Vec::new();
    for r in records.iter_mut() {
        let (cleaned, mods) = clean_verse(&r.verse);
        if !mods.is_empty() {
            modified.push(ModifiedVerse {
                reference: r.reference.clone(),
                document_link: r.document_link.clone(),
                original_verse: r.verse.clone(),
                modified_verse: cleaned.clone(),
                modifications: mods,
            });
        }
        r.verse = cleaned;
    }
    modified
}

#[derive(Debug, Default)]
pub struct CleanStats {
    pub batches: usize,
    pub failed: usize,
    pub verses: usize,
    pub modified: usize,
}

fn clean_batch(path: &Path, output_dir: &Path, modified_dir: &Path) -> Result<(usize, usize)> {
    let mut recs = records::read_records(path)?;
    let modified = clean_records(&mut recs);
    let file_name = path.file_name().context("batch path has no file name")?;

    records::write_records(&output_dir.join(file_name), &recs, Envelope::Array)?;
    if !modified.is_empty() {
        let log_path = modified_dir.join(file_name);
        let json = serde_json::to_string_pretty(&modified)?;
        std::fs::write(&log_path, json)
            .with_context(|| format!("Failed to write {}", log_path.display()))?;
    }
    Ok((recs.len(), modified.len()))
}

/// Clean all `<prefix>-<n>.json` batches in parallel. Each batch is written
/// to `output_dir` under the same name; its change log goes to `modified_dir`.
pub fn clean_batches(
    input_dir: &Path,
    prefix: &str,
    output_dir: &Path,
    modified_dir: &Path,
) -> Result<Option<CleanStats>> {
    if !input_dir.is_dir() {
        println!("Batch directory {} does not exist", input_dir.display());
        return Ok(None);
    }
    let batches: Vec<(u64, PathBuf)> = combiner::discover_batches(input_dir, prefix)?;
    if batches.is_empty() {
        println!("No {}-<n>.json files in {}", prefix, input_dir.display());
        return Ok(None);
    }
    for dir in [output_dir, modified_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let pb = progress::bar(batches.len())?;
    let results: Vec<_> = batches
        .par_iter()
        .map(|(_, path)| {
            let r = clean_batch(path, output_dir, modified_dir);
            pb.inc(1);
            r
        })
        .collect();
    pb.finish_and_clear();

    let mut stats = CleanStats {
        batches: batches.len(),
        ..Default::default()
    };
    for ((n, path), result) in batches.iter().zip(results) {
        match result {
            Ok((verses, modified)) => {
                info!("Batch {}: {} verses, {} modified", n, verses, modified);
                stats.verses += verses;
                stats.modified += modified;
            }
            Err(e) => {
                warn!("Error processing {}: {:#}", path.display(), e);
                stats.failed += 1;
            }
        }
    }
    Ok(Some(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_parenthesized_word() {
        let (text, mods) = clean_verse("(शिवः) नमः शिवाय\nशान्ताय");
        assert_eq!(text, "नमः शिवाय\nशान्ताय");
        assert_eq!(mods[0].removed_text, "(शिवः)");
    }

    #[test]
    fn strips_dash_prefix_line() {
        let (text, mods) = clean_verse("ध्यानम् -\nवन्दे उमापतिम्");
        assert_eq!(text, "वन्दे उमापतिम्");
        assert_eq!(mods[0].kind, "removed_dash_prefix");
        assert_eq!(mods[0].removed_text, "ध्यानम्-");
    }

    #[test]
    fn untouched_verse_has_no_log() {
        let (text, mods) = clean_verse("  नमः शिवाय  ");
        assert_eq!(text, "नमः शिवाय");
        assert!(mods.is_empty());
    }

    #[test]
    fn batches_cleaned_into_two_directories() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("output_files");
        let out = dir.path().join("processed_verses");
        let log = dir.path().join("modified_verses");
        records::write_records(
            &input.join("output-1.json"),
            &[
                VerseRecord::new("स्तोत्रम्.१", "(पाठः) नमः").with_link("https://d.test/1"),
                VerseRecord::new("स्तोत्रम्.२", "शिवाय"),
            ],
            Envelope::Array,
        )
        .unwrap();
        records::write_records(&input.join("output-2.json"), &[VerseRecord::new("क.१", "ख")], Envelope::Array)
            .unwrap();

        let stats = clean_batches(&input, "output", &out, &log).unwrap().unwrap();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.verses, 3);
        assert_eq!(stats.modified, 1);

        let cleaned = records::read_records(&out.join("output-1.json")).unwrap();
        assert_eq!(cleaned[0].verse, "नमः");
        let entries: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(log.join("output-1.json")).unwrap()).unwrap();
        assert_eq!(entries[0]["original_verse"], "(पाठः) नमः");
        assert_eq!(entries[0]["modifications"][0]["type"], "removed_parentheses");
        assert!(!log.join("output-2.json").exists());
    }
}
