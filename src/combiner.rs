use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::config::CombineSettings;
use crate::records::{self, Envelope, VerseRecord};

#[derive(Debug)]
pub struct CombineStats {
    pub batches: usize,
    pub unreadable: usize,
    pub verses: usize,
    pub duplicates: usize,
}

/// Batch files `<prefix>-<n>.json` in `dir`, ordered by `n`.
pub fn discover_batches(dir: &Path, prefix: &str) -> Result<Vec<(u64, PathBuf)>> {
    let pattern = Regex::new(&format!(r"^{}-(\d+)\.json$", regex::escape(prefix)))?;
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(caps) = pattern.captures(name) {
            if let Ok(n) = caps[1].parse::<u64>() {
                found.push((n, path.clone()));
            }
        }
    }
    found.sort_by_key(|(n, _)| *n);
    Ok(found)
}

/// Concatenate batches in the order given.
pub fn combine_batches(batches: Vec<Vec<VerseRecord>>) -> Vec<VerseRecord> {
    batches.into_iter().flatten().collect()
}

pub fn rewrite_refs(records: &mut [VerseRecord], from: &str, to: &str) {
    if from.is_empty() || from == to {
        return;
    }
    for r in records {
        r.reference = r.reference.replace(from, to);
    }
}

/// Merge all batch files into one array. Returns `None` when there was
/// nothing to merge; no output is written in that case.
pub fn combine(settings: &CombineSettings) -> Result<Option<CombineStats>> {
    if !settings.input_dir.is_dir() {
        println!("Batch directory {} does not exist", settings.input_dir.display());
        return Ok(None);
    }

    let batches = discover_batches(&settings.input_dir, &settings.prefix)?;
    if batches.is_empty() {
        println!(
            "No {}-<n>.json files in {}",
            settings.prefix,
            settings.input_dir.display()
        );
        return Ok(None);
    }

    let mut loaded = Vec::with_capacity(batches.len());
    let mut unreadable = 0usize;
    for (n, path) in &batches {
        match records::read_records(path) {
            Ok(recs) => {
                info!("Batch {}: {} verses from {}", n, recs.len(), path.display());
                loaded.push(recs);
            }
            Err(e) => {
                warn!("Skipping unreadable batch {}: {:#}", path.display(), e);
                unreadable += 1;
            }
        }
    }

    let mut combined = combine_batches(loaded);
    if settings.rewrite_refs {
        rewrite_refs(&mut combined, &settings.batch_separator, &settings.public_separator);
    }
    let duplicates = records::report_duplicates(&settings.output.display().to_string(), &combined);

    records::write_records(&settings.output, &combined, Envelope::Array)?;
    info!("Wrote {} verses to {}", combined.len(), settings.output.display());

    Ok(Some(CombineStats {
        batches: batches.len(),
        unreadable,
        verses: combined.len(),
        duplicates,
    }))
}
