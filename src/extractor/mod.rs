pub mod page;
pub mod verses;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::ExtractSettings;
use crate::progress;
use crate::records::{self, Envelope, VerseRecord};
use crate::session::{PageSession, SessionError};

/// Extraction stats returned after completion.
#[derive(Debug, Default)]
pub struct ExtractStats {
    pub urls: usize,
    pub pages_ok: usize,
    pub skipped: usize,
    pub failed: usize,
    pub verses: usize,
    pub batch_files: Vec<PathBuf>,
}

pub fn batch_path(dir: &Path, prefix: &str, n: usize) -> PathBuf {
    dir.join(format!("{}-{}.json", prefix, n))
}

/// Visit each URL in fixed-size batches and write every non-empty batch to
/// `<output_dir>/<prefix>-<n>.json` as soon as it completes.
pub async fn extract_batches<S: PageSession>(
    session: &mut S,
    urls: &[String],
    settings: &ExtractSettings,
) -> Result<ExtractStats> {
    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("Failed to create {}", settings.output_dir.display()))?;

    let batch_size = settings.batch_size.max(1);
    let total_batches = urls.len().div_ceil(batch_size);
    let mut stats = ExtractStats {
        urls: urls.len(),
        ..Default::default()
    };

    let pb = progress::bar(urls.len())?;
    for (i, batch) in urls.chunks(batch_size).enumerate() {
        let n = i + 1;
        pb.set_message(format!("batch {}/{}", n, total_batches));

        let mut batch_verses: Vec<VerseRecord> = Vec::new();
        for url in batch {
            match extract_url(session, url, settings).await {
                Ok(Ok(found)) => {
                    debug!("{} verses from {}", found.len(), url);
                    stats.pages_ok += 1;
                    batch_verses.extend(found);
                }
                Ok(Err(skip)) => {
                    warn!("Skipping {}: {}", url, skip);
                    stats.skipped += 1;
                }
                Err(e) => {
                    if e.downcast_ref::<SessionError>().is_some_and(SessionError::is_timeout) {
                        warn!("Timed out on {}", url);
                    } else {
                        warn!("Failed {}: {:#}", url, e);
                    }
                    stats.failed += 1;
                }
            }
            pb.inc(1);
            if !settings.delay().is_zero() {
                tokio::time::sleep(settings.delay()).await;
            }
        }

        if batch_verses.is_empty() {
            info!("Batch {} produced no verses; nothing written", n);
            continue;
        }
        let path = batch_path(&settings.output_dir, &settings.prefix, n);
        records::write_records(&path, &batch_verses, Envelope::Array)?;
        info!("Saved batch {} to {} with {} verses", n, path.display(), batch_verses.len());
        stats.verses += batch_verses.len();
        stats.batch_files.push(path);
    }
    pb.finish_and_clear();

    Ok(stats)
}

async fn extract_url<S: PageSession>(
    session: &mut S,
    url: &str,
    settings: &ExtractSettings,
) -> Result<Result<Vec<VerseRecord>, page::PageSkip>> {
    session.navigate(url).await?;
    session.wait_for("body", settings.wait_timeout()).await?;
    Ok(page::parse_page(session.page_source()?, url, &settings.ref_separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::FakeSession;

    fn page(verse: &str) -> String {
        format!("<html><head><title>स्तोत्रम्</title></head><body><div>{}</div></body></html>", verse)
    }

    fn settings(dir: &Path, batch_size: usize) -> ExtractSettings {
        ExtractSettings {
            output_dir: dir.to_path_buf(),
            batch_size,
            delay_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn writes_one_file_per_nonempty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let urls: Vec<String> = (1..=5).map(|i| format!("https://d.test/{}", i)).collect();
        let mut session = FakeSession::new()
            .page(&urls[0], &page("प्रथमम् ॥ १ ॥"))
            .page(&urls[1], &page("द्वितीयम् ॥ १ ॥ तृतीयम् ॥ २ ॥"))
            .page(&urls[2], "<html><body><p>nothing</p></body></html>")
            .timing_out(&urls[3])
            .page(&urls[4], &page("पञ्चमम् ॥ ५ ॥"));

        let stats = extract_batches(&mut session, &urls, &settings(dir.path(), 2)).await.unwrap();

        assert_eq!(stats.urls, 5);
        assert_eq!(stats.pages_ok, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.verses, 4);
        // batch 2 (urls 3 and 4) produced nothing
        assert_eq!(
            stats.batch_files,
            vec![batch_path(dir.path(), "output", 1), batch_path(dir.path(), "output", 3)]
        );

        let first = records::read_records(&stats.batch_files[0]).unwrap();
        let refs: Vec<&str> = first.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(refs, vec!["स्तोत्रम्.१", "स्तोत्रम्.१", "स्तोत्रम्.२"]);
        assert_eq!(first[2].document_link.as_deref(), Some("https://d.test/2"));
        assert!(!batch_path(dir.path(), "output", 2).exists());
    }

    #[tokio::test]
    async fn empty_url_list_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = FakeSession::new();
        let stats = extract_batches(&mut session, &[], &settings(dir.path(), 100)).await.unwrap();
        assert!(stats.batch_files.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
