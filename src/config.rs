use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "verse_scraper";
pub const ENV_PREFIX: &str = "VERSES";

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Which collaborator renders pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Plain HTTP fetch; pages are parsed as served.
    #[default]
    Http,
    /// Remote rendering via spider.cloud (needs SPIDER_API_KEY).
    Spider,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub collect: CollectSettings,
    pub filter: FilterSettings,
    pub extract: ExtractSettings,
    pub combine: CombineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub backend: Backend,
    pub user_agent: String,
    pub page_load_timeout_secs: u64,
    /// Re-render interval while waiting for an element (rendering backends only).
    pub poll_interval_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Http,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            page_load_timeout_secs: 30,
            poll_interval_ms: 2000,
        }
    }
}

impl FetchSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectSettings {
    pub listing_url: String,
    /// Selector whose presence signals that the listing has loaded.
    pub ready_selector: String,
    pub container_selector: String,
    pub item_selector: String,
    /// Zero-based position of the anchor whose href is collected.
    pub anchor_index: usize,
    pub wait_timeout_secs: u64,
    pub output: PathBuf,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            listing_url: "https://sanskritdocuments.org/doc_shiva/".to_string(),
            ready_selector: "li.devanagari".to_string(),
            container_selector: r#"ul[style="list-style-type:none"]"#.to_string(),
            item_selector: "li.devanagari".to_string(),
            anchor_index: 2,
            wait_timeout_secs: 20,
            output: PathBuf::from("shiva_document_links.csv"),
        }
    }
}

impl CollectSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub wait_timeout_secs: u64,
    pub delay_ms: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("shiva_document_links.csv"),
            output: PathBuf::from("filtered_urls.csv"),
            wait_timeout_secs: 15,
            delay_ms: 1000,
        }
    }
}

impl FilterSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub batch_size: usize,
    pub wait_timeout_secs: u64,
    pub delay_ms: u64,
    /// Joins heading and verse number inside batch files.
    pub ref_separator: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("filtered_urls.csv"),
            output_dir: PathBuf::from("output_files"),
            prefix: "output".to_string(),
            batch_size: 100,
            wait_timeout_secs: 15,
            delay_ms: 500,
            ref_separator: ".".to_string(),
        }
    }
}

impl ExtractSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombineSettings {
    pub input_dir: PathBuf,
    pub prefix: String,
    pub output: PathBuf,
    /// Separator used in batch refs; rewritten to `public_separator` when `rewrite_refs` is set.
    pub batch_separator: String,
    pub public_separator: String,
    pub rewrite_refs: bool,
}

impl Default for CombineSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("output_files"),
            prefix: "output".to_string(),
            output: PathBuf::from("output.json"),
            batch_separator: ".".to_string(),
            public_separator: "->".to_string(),
            rewrite_refs: true,
        }
    }
}

impl Settings {
    /// Defaults, then `verse_scraper.toml` (optional), then `VERSES_*` env vars.
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
