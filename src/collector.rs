use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::config::CollectSettings;
use crate::html;
use crate::session::PageSession;

static ANCHOR: std::sync::LazyLock<Selector> =
    std::sync::LazyLock::new(|| Selector::parse("a").unwrap());

/// Why a listing yielded no links.
#[derive(Debug, PartialEq, Eq)]
pub enum Listing {
    Links(Vec<String>),
    NoContainer,
    NoItems,
    NoLinks,
}

/// Pull document links out of a rendered listing page.
pub fn parse_listing(page_html: &str, base: &Url, settings: &CollectSettings) -> Result<Listing> {
    let container_sel = html::selector(&settings.container_selector)?;
    let item_sel = html::selector(&settings.item_selector)?;
    let doc = Html::parse_document(page_html);

    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(Listing::NoContainer);
    };

    let items: Vec<_> = container.select(&item_sel).collect();
    if items.is_empty() {
        return Ok(Listing::NoItems);
    }

    let links: Vec<String> = items
        .iter()
        .filter_map(|item| {
            let anchor = item.select(&ANCHOR).nth(settings.anchor_index)?;
            let href = anchor.value().attr("href")?;
            base.join(href).ok().map(String::from)
        })
        .collect();

    if links.is_empty() {
        Ok(Listing::NoLinks)
    } else {
        Ok(Listing::Links(links))
    }
}

/// Render the listing page and collect one link per list item.
/// A wait timeout aborts the run; an empty result is reported, not written.
pub async fn collect_links<S: PageSession>(
    session: &mut S,
    settings: &CollectSettings,
) -> Result<Vec<String>> {
    let base = Url::parse(&settings.listing_url)
        .with_context(|| format!("Invalid listing URL {}", settings.listing_url))?;

    info!("Loading listing {}", base);
    session
        .navigate(base.as_str())
        .await
        .with_context(|| format!("Failed to load listing {}", base))?;
    session
        .wait_for(&settings.ready_selector, settings.wait_timeout())
        .await
        .with_context(|| format!("Listing {} never showed {}", base, settings.ready_selector))?;

    let listing = parse_listing(session.page_source()?, &base, settings)?;
    let links = match listing {
        Listing::Links(links) => links,
        Listing::NoContainer => {
            println!(
                "Could not find the listing container ({}) on {}",
                settings.container_selector, base
            );
            Vec::new()
        }
        Listing::NoItems => {
            println!("No list items matching {} found on {}", settings.item_selector, base);
            Vec::new()
        }
        Listing::NoLinks => {
            println!(
                "No links found (anchor #{} in {})",
                settings.anchor_index + 1,
                settings.item_selector
            );
            Vec::new()
        }
    };

    info!("Collected {} links from {}", links.len(), base);
    Ok(links)
}
