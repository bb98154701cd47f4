use scraper::Html;

use super::verses::{remove_boilerplate, split_verses};
use crate::html;
use crate::records::VerseRecord;

pub const UNKNOWN_HEADING: &str = "Unknown Heading";
const CONTENT_MARKER: &str = "॥";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageSkip {
    #[error("no content area containing ॥")]
    NoContent,
    #[error("no verse markers in content")]
    NoVerses,
}

/// Turn one rendered document page into verse records.
pub fn parse_page(page_html: &str, url: &str, ref_separator: &str) -> Result<Vec<VerseRecord>, PageSkip> {
    let doc = Html::parse_document(page_html);
    let heading = html::heading(&doc).unwrap_or_else(|| UNKNOWN_HEADING.to_string());

    let content = html::first_div_containing(&doc, CONTENT_MARKER).ok_or(PageSkip::NoContent)?;
    let body = remove_boilerplate(&html::text_with_breaks(content));

    let verses = split_verses(&body, &heading);
    if verses.is_empty() {
        return Err(PageSkip::NoVerses);
    }

    Ok(verses
        .into_iter()
        .map(|v| {
            VerseRecord::new(format!("{}{}{}", heading, ref_separator, v.number), v.text)
                .with_link(url)
        })
        .collect())
}
