use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::FilterSettings;
use crate::progress;
use crate::session::PageSession;
use crate::urls;

/// `॥ n ॥` with any whitespace and ASCII or Devanagari digits.
pub static VERSE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"॥\s*\d+\s*॥").unwrap());

pub fn has_verse_marker(text: &str) -> bool {
    VERSE_MARKER.is_match(text)
}

pub struct FilterStats {
    pub checked: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Keep the URLs whose rendered text carries a verse marker, in input order.
/// Pages that fail to load or never show a body are logged and skipped.
pub async fn filter_urls<S: PageSession>(
    session: &mut S,
    urls: &[String],
    settings: &FilterSettings,
) -> Result<(Vec<String>, FilterStats)> {
    let pb = progress::bar(urls.len())?;
    let mut kept = Vec::new();
    let mut failed = 0usize;

    for (i, url) in urls.iter().enumerate() {
        match check_page(session, url, settings).await {
            Ok(true) => {
                debug!("Verse marker found: {}", url);
                kept.push(url.clone());
            }
            Ok(false) => debug!("No verse marker: {}", url),
            Err(e) => {
                warn!("Skipping {}: {:#}", url, e);
                failed += 1;
            }
        }
        pb.inc(1);
        if i + 1 < urls.len() && !settings.delay().is_zero() {
            tokio::time::sleep(settings.delay()).await;
        }
    }
    pb.finish_and_clear();

    let stats = FilterStats {
        checked: urls.len(),
        kept: kept.len(),
        failed,
    };
    info!(
        "Filtered {} URLs: {} with verses, {} failed",
        stats.checked, stats.kept, stats.failed
    );
    Ok((kept, stats))
}

/// Filter the URL list at `settings.input` into `settings.output`. Returns
/// `None` for an empty list; nothing is written when no URL passes.
pub async fn filter_file<S: PageSession>(
    session: &mut S,
    settings: &FilterSettings,
) -> Result<Option<FilterStats>> {
    let input = urls::read_urls(&settings.input)?;
    if input.is_empty() {
        println!("No URLs in {}.", settings.input.display());
        return Ok(None);
    }
    println!("Checking {} URLs for verse markers...", input.len());
    let (kept, stats) = filter_urls(session, &input, settings).await?;
    if !kept.is_empty() {
        urls::write_urls(&settings.output, &kept)?;
    }
    Ok(Some(stats))
}

async fn check_page<S: PageSession>(
    session: &mut S,
    url: &str,
    settings: &FilterSettings,
) -> Result<bool> {
    session.navigate(url).await?;
    session.wait_for("body", settings.wait_timeout()).await?;
    Ok(has_verse_marker(&session.rendered_text()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fake::FakeSession;

    fn settings() -> FilterSettings {
        FilterSettings {
            delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn marker_accepts_both_digit_systems() {
        assert!(has_verse_marker("नमः शिवाय ॥ १ ॥"));
        assert!(has_verse_marker("नमः शिवाय ॥12॥"));
        assert!(has_verse_marker("॥\n३\n॥"));
        assert!(!has_verse_marker("नमः शिवाय ॥ इति ॥"));
        assert!(!has_verse_marker("no marker here"));
    }

    #[tokio::test]
    async fn keeps_matching_urls_in_order() {
        let urls: Vec<String> = (1..=5).map(|i| format!("https://d.test/{}", i)).collect();
        let with_verse = "<html><body><div>ॐ नमः शिवाय ॥ १ ॥</div></body></html>";
        let without = "<html><body><div>index page</div></body></html>";
        let mut session = FakeSession::new()
            .page(&urls[0], without)
            .page(&urls[1], with_verse)
            .page(&urls[2], without)
            .page(&urls[3], with_verse)
            .timing_out(&urls[4]);

        let (kept, stats) = filter_urls(&mut session, &urls, &settings()).await.unwrap();
        assert_eq!(kept, vec![urls[1].clone(), urls[3].clone()]);
        assert_eq!(stats.checked, 5);
        assert_eq!(stats.failed, 1);
        assert_eq!(session.visited, urls);
    }

    #[tokio::test]
    async fn filtered_csv_has_one_row_per_match() {
        let dir = tempfile::tempdir().unwrap();
        let urls: Vec<String> = (1..=4).map(|i| format!("https://d.test/{}", i)).collect();
        let settings = FilterSettings {
            input: dir.path().join("links.csv"),
            output: dir.path().join("filtered.csv"),
            delay_ms: 0,
            ..Default::default()
        };
        urls::write_urls(&settings.input, &urls).unwrap();
        let mut session = FakeSession::new()
            .page(&urls[0], "<html><body><p>॥ २ ॥</p></body></html>")
            .page(&urls[1], "<html><body><p>contents</p></body></html>")
            .timing_out(&urls[2])
            .page(&urls[3], "<html><body><p>॥ 7 ॥</p></body></html>");

        let stats = filter_file(&mut session, &settings).await.unwrap().unwrap();
        assert_eq!(stats.kept, 2);

        assert_eq!(urls::read_urls(&settings.output).unwrap(), vec![urls[0].clone(), urls[3].clone()]);
        let text = std::fs::read_to_string(&settings.output).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn no_match_writes_no_csv() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://d.test/index".to_string();
        let settings = FilterSettings {
            input: dir.path().join("links.csv"),
            output: dir.path().join("filtered.csv"),
            delay_ms: 0,
            ..Default::default()
        };
        urls::write_urls(&settings.input, std::slice::from_ref(&url)).unwrap();
        let mut session = FakeSession::new().page(&url, "<html><body>index</body></html>");

        let stats = filter_file(&mut session, &settings).await.unwrap().unwrap();
        assert_eq!(stats.kept, 0);
        assert!(!settings.output.exists());
    }

    #[tokio::test]
    async fn marker_inside_script_is_ignored() {
        let url = "https://d.test/script".to_string();
        let mut session = FakeSession::new().page(
            &url,
            "<html><body><p>text</p><script>var m = '॥ 1 ॥';</script></body></html>",
        );
        let (kept, _) = filter_urls(&mut session, &[url], &settings()).await.unwrap();
        assert!(kept.is_empty());
    }
}
