use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::warn;

pub const HEADER: &str = "URL";

/// Read a one-column URL list. A missing `URL` header is tolerated: the first
/// row is then read as data.
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open URL list {}", path.display()))?;

    let rows = reader
        .records()
        .collect::<Result<Vec<_>, csv::Error>>()
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;

    let Some(first) = rows.first() else {
        bail!("URL list {} is empty", path.display());
    };

    let skip = if first.len() == 1 && first.get(0) == Some(HEADER) {
        1
    } else {
        warn!(
            "Expected header [{}] in {}, found {:?}; reading first row as data",
            HEADER,
            path.display(),
            first.iter().collect::<Vec<_>>()
        );
        0
    };

    Ok(rows
        .iter()
        .skip(skip)
        .filter_map(|row| row.get(0))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn write_urls(path: &Path, urls: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record([HEADER])?;
    for url in urls {
        writer.write_record([url])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
