use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::records::{self, VerseRecord};

static LATIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]").unwrap());

pub struct AuditReport<'a> {
    pub total: usize,
    pub latin: Vec<&'a VerseRecord>,
    pub duplicates: Vec<(String, usize)>,
}

pub fn audit(records: &[VerseRecord]) -> AuditReport<'_> {
    AuditReport {
        total: records.len(),
        latin: records.iter().filter(|r| LATIN_RE.is_match(&r.verse)).collect(),
        duplicates: records::duplicate_refs(records),
    }
}

/// Print verses that still carry Latin text and refs used more than once.
/// Returns the number of problems found.
pub fn check_file(path: &Path) -> Result<usize> {
    let recs = records::read_records(path)?;
    let report = audit(&recs);

    println!("Checked {} verses in {}", report.total, path.display());
    if report.latin.is_empty() {
        println!("No English text found in any verses.");
    } else {
        println!("\nFound {} verses containing English text:", report.latin.len());
        for r in &report.latin {
            println!("\nReference: {}", r.reference);
            println!("Document: {}", r.document_link.as_deref().unwrap_or("-"));
            println!("Verse text:\n{}", r.verse);
            println!("{}", "-".repeat(80));
        }
    }

    if report.duplicates.is_empty() {
        println!("No duplicate refs.");
    } else {
        println!("\nFound {} duplicate refs:", report.duplicates.len());
        for (reference, count) in &report.duplicates {
            println!("  {} x{}", reference, count);
        }
    }

    Ok(report.latin.len() + report.duplicates.len())
}
