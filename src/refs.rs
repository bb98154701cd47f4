use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::numerals;
use crate::segment::REF_SEPARATOR;

pub const TARGET_FILE: &str = "output.json";
const LEGACY_KEY: &str = "verse_number";

/// Transliterated document names and their Devanagari titles.
const DOCUMENT_TITLES: &[(&str, &str)] = &[
    ("ashvalayana_grihya_sutra", "अश्वलयन ग्रिह्य सुत्र"),
    ("ashvalayana_shrauta_sutra", "अश्वलयन श्रौत सुत्र"),
    ("Baudhayana_shrauta_sutra", "बौधयन श्रौत सुत्र"),
    ("Baudhayana_Shulba_Sutra", "बौधयन शुल्ब सुत्र"),
    ("gautama_dharma_sutra", "गौतम धर्म सुत्र"),
    ("vasishtha_dharma_sutra", "वसिश्थ धर्म सुत्र"),
    ("drahyayana_grihya_sutra", "द्रह्ययन ग्रिह्य सुत्र"),
    ("gobhila_grihya_sutra", "गोभिल ग्रिह्य सुत्र"),
    ("hiranyakeshi_grihya_sutra", "हिरन्यकेशि ग्रिह्य सुत्र"),
    ("kathaka_grihya_sutra", "कथक ग्रिह्य सुत्र"),
    ("kaushitaka_grihya_sutra", "कौशितक ग्रिह्य सुत्र"),
    ("vadhula_grihya_sutra", "वधुल ग्रिह्य सुत्र"),
    ("varaha_grihya_sutra", "वरह ग्रिह्य सुत्र"),
    ("sUryasiddhAntaH_pAThAntaropetaH", "सूर्यसिद्धान्तः पाठान्तरोपेतः"),
    ("vivAhapaTala", "विवाहपटल"),
    ("yogayAtrA", "योगयात्रा"),
    ("yogayAtrA_Pingree_edition", "योगयात्रा पिन्ग्री"),
    ("lagadha_vedanga_jyotish", "लगध वेदन्ग ज्योतिश्"),
    ("AngIrasa-smRtiH", "अन्गिरसस्म्रितिह्"),
    ("brihaspati-smRtiH", "ब्रिहस्पतिस्म्र्तिह्"),
    ("devala-smRtiH", "देवलस्म्र्तिह्"),
    ("naradeyadharmashartam", "नरदेयधर्मशर्तम्"),
    ("vashishtha_smriti", "वशिश्थस्म्रिति"),
    ("vishwamitra_smriti", "विश्वमित्रस्म्रिति"),
    ("yogadeepika", "योगदीपिका"),
];

pub fn devanagari_title(name: &str) -> Option<&'static str> {
    DOCUMENT_TITLES
        .iter()
        .find(|(latin, _)| *latin == name)
        .map(|&(_, title)| title)
}

/// Arabic digits throughout, and a Devanagari document title when one is known.
pub fn normalize_ref(reference: &str) -> String {
    let arabic = numerals::to_arabic(reference);
    match arabic.split_once(REF_SEPARATOR) {
        Some((name, rest)) => match devanagari_title(name) {
            Some(title) => format!("{}{}{}", title, REF_SEPARATOR, rest),
            None => arabic,
        },
        None => arabic,
    }
}

/// Normalise every record object inside `data` (an array, or an object with
/// a `verses` array). Returns how many objects changed.
pub fn normalize_value(data: &mut Value) -> usize {
    let items = match data {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get_mut("verses") {
            Some(Value::Array(items)) => items,
            _ => return 0,
        },
        _ => return 0,
    };

    let mut changed = 0;
    for item in items.iter_mut() {
        let Value::Object(obj) = item else { continue };
        let mut touched = false;
        if !obj.contains_key("ref") && obj.contains_key(LEGACY_KEY) {
            // rename in place so the key keeps its position
            *obj = std::mem::take(obj)
                .into_iter()
                .map(|(k, v)| if k == LEGACY_KEY { ("ref".to_string(), v) } else { (k, v) })
                .collect();
            touched = true;
        }
        if let Some(Value::String(reference)) = obj.get_mut("ref") {
            let normalized = normalize_ref(reference);
            if normalized != *reference {
                *reference = normalized;
                touched = true;
            }
        }
        if touched {
            changed += 1;
        }
    }
    changed
}

fn process_file(path: &Path) -> Result<usize> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut data: Value =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    let changed = normalize_value(&mut data);
    if changed > 0 {
        std::fs::write(path, serde_json::to_string_pretty(&data)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(changed)
}

pub fn find_targets(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == TARGET_FILE)
        .map(|e| e.into_path())
        .collect()
}

#[derive(Debug, Default)]
pub struct RefStats {
    pub files: usize,
    pub failed: usize,
    pub changed_records: usize,
}

/// Rewrite refs in every `output.json` below `root`, in place.
pub fn normalize_tree(root: &Path) -> Result<RefStats> {
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());
    let targets = find_targets(root);
    let results: Vec<_> = targets.par_iter().map(|p| process_file(p)).collect();

    let mut stats = RefStats {
        files: targets.len(),
        ..Default::default()
    };
    for (path, result) in targets.iter().zip(results) {
        match result {
            Ok(changed) => {
                info!("Processed {}: {} records updated", path.display(), changed);
                stats.changed_records += changed;
            }
            Err(e) => {
                warn!("Error processing {}: {:#}", path.display(), e);
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ref_gets_arabic_digits_and_title() {
        assert_eq!(normalize_ref("gobhila_grihya_sutra->१.२.१०"), "गोभिल ग्रिह्य सुत्र->1.2.10");
        assert_eq!(normalize_ref("unknown_text->३"), "unknown_text->3");
        assert_eq!(normalize_ref("शिवस्तोत्रम्.४"), "शिवस्तोत्रम्.4");
    }

    #[test]
    fn legacy_key_renamed_in_both_envelopes() {
        let mut arr = json!([{"verse_number": "vivAhapaTala->१", "verse": "क", "verse_metadata": []}]);
        assert_eq!(normalize_value(&mut arr), 1);
        assert_eq!(arr[0]["ref"], "विवाहपटल->1");
        assert!(arr[0].get("verse_number").is_none());
        assert_eq!(arr[0]["verse_metadata"], json!([]));

        let mut wrapped = json!({"verses": [{"ref": "x->1", "verse": "ख"}]});
        assert_eq!(normalize_value(&mut wrapped), 0);
    }

    #[test]
    fn rewrite_keeps_key_order() {
        let mut arr: Value = serde_json::from_str(
            r#"[{"verse": "क", "verse_number": "vivAhapaTala->२", "document_link": "https://d.test/1"}]"#,
        )
        .unwrap();
        assert_eq!(normalize_value(&mut arr), 1);
        let keys: Vec<&str> = arr[0].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["verse", "ref", "document_link"]);
    }

    #[test]
    fn tree_walk_touches_only_output_json() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("gRhyam").join("gobhila");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("output.json"), r#"[{"ref": "gobhila_grihya_sutra->१.१.१", "verse": "क"}]"#)
            .unwrap();
        std::fs::write(nested.join("verses.json"), r#"[{"ref": "gobhila_grihya_sutra->१"}]"#).unwrap();
        std::fs::write(dir.path().join("output.json"), "not json").unwrap();

        let stats = normalize_tree(dir.path()).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.changed_records, 1);

        let out: Value = serde_json::from_str(&std::fs::read_to_string(nested.join("output.json")).unwrap()).unwrap();
        assert_eq!(out[0]["ref"], "गोभिल ग्रिह्य सुत्र->1.1.1");
        let untouched = std::fs::read_to_string(nested.join("verses.json")).unwrap();
        assert!(untouched.contains("१"));
    }
}
