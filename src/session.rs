use std::time::{Duration, Instant};

use anyhow::Context;
use scraper::Html;
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::debug;

use crate::config::{Backend, FetchSettings};
use crate::html;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("timed out after {:.1}s waiting for {target} on {url}", .waited.as_secs_f64())]
    Timeout {
        url: String,
        target: String,
        waited: Duration,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("rendering {url} failed: {message}")]
    Render { url: String, message: String },
    #[error("no page has been loaded")]
    NoPage,
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

/// The page a session currently has open.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub url: String,
    pub html: String,
}

/// A browser-like collaborator: open a page, wait for content, read it back.
pub trait PageSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Load the current page again.
    async fn reload(&mut self) -> Result<(), SessionError>;

    fn current(&self) -> Option<&LoadedPage>;

    /// How often `wait_for` re-reads the page. `None` when content is static
    /// and re-reading cannot make a missing element appear.
    fn poll_interval(&self) -> Option<Duration>;

    fn page_source(&self) -> Result<&str, SessionError> {
        self.current()
            .map(|p| p.html.as_str())
            .ok_or(SessionError::NoPage)
    }

    fn rendered_text(&self) -> Result<String, SessionError> {
        let doc = Html::parse_document(self.page_source()?);
        Ok(html::visible_text(&doc))
    }

    /// Block until `selector` matches in the current page or `timeout` passes.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), SessionError> {
        let started = Instant::now();
        loop {
            if html::has_match(self.page_source()?, selector)? {
                return Ok(());
            }
            let Some(poll) = self.poll_interval() else {
                break;
            };
            if started.elapsed() + poll > timeout {
                break;
            }
            tokio::time::sleep(poll).await;
            self.reload().await?;
        }
        Err(SessionError::Timeout {
            url: self.current().map(|p| p.url.clone()).unwrap_or_default(),
            target: selector.to_string(),
            waited: started.elapsed(),
        })
    }
}

// ── Static HTTP ──

pub struct HttpSession {
    client: reqwest::Client,
    page: Option<LoadedPage>,
}

impl HttpSession {
    pub fn new(settings: &FetchSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.page_load_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, page: None })
    }

    async fn fetch(&self, url: &str) -> Result<String, SessionError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, started, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|e| request_error(url, started, e))
    }
}

fn request_error(url: &str, started: Instant, e: reqwest::Error) -> SessionError {
    if e.is_timeout() {
        SessionError::Timeout {
            url: url.to_string(),
            target: "page load".to_string(),
            waited: started.elapsed(),
        }
    } else {
        SessionError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.page = None;
        let html = self.fetch(url).await?;
        self.page = Some(LoadedPage {
            url: url.to_string(),
            html,
        });
        Ok(())
    }

    async fn reload(&mut self) -> Result<(), SessionError> {
        let url = self.current().ok_or(SessionError::NoPage)?.url.clone();
        self.navigate(&url).await
    }

    fn current(&self) -> Option<&LoadedPage> {
        self.page.as_ref()
    }

    fn poll_interval(&self) -> Option<Duration> {
        None
    }
}

// ── Remote rendering ──

pub struct SpiderSession {
    spider: Spider,
    load_timeout: Duration,
    poll: Duration,
    page: Option<LoadedPage>,
}

impl SpiderSession {
    pub fn from_env(settings: &FetchSettings) -> anyhow::Result<Self> {
        let api_key = std::env::var("SPIDER_API_KEY")
            .context("SPIDER_API_KEY environment variable must be set for the spider backend")?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))?;
        Ok(Self {
            spider,
            load_timeout: settings.page_load_timeout(),
            poll: settings.poll_interval(),
            page: None,
        })
    }

    async fn render(&self, url: &str) -> Result<String, SessionError> {
        let params = RequestParams {
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Raw)),
            ..Default::default()
        };

        let started = Instant::now();
        let response = tokio::time::timeout(
            self.load_timeout,
            self.spider.scrape_url(url, Some(params), "application/json"),
        )
        .await
        .map_err(|_| SessionError::Timeout {
            url: url.to_string(),
            target: "page render".to_string(),
            waited: started.elapsed(),
        })?
        .map_err(|e| SessionError::Render {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        // The API answers with a JSON array, sometimes delivered as a string.
        let parsed: serde_json::Value = match response.as_str() {
            Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
            None => response,
        };
        let first = parsed.as_array().and_then(|arr| arr.first());

        if let Some(status) = first
            .and_then(|obj| obj.get("status"))
            .and_then(|s| s.as_u64())
        {
            if status >= 400 {
                return Err(SessionError::Status {
                    url: url.to_string(),
                    status: status as u16,
                });
            }
        }

        first
            .and_then(|obj| obj.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| SessionError::Render {
                url: url.to_string(),
                message: "no content in spider response".to_string(),
            })
    }
}

impl PageSession for SpiderSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.page = None;
        let html = self.render(url).await?;
        self.page = Some(LoadedPage {
            url: url.to_string(),
            html,
        });
        Ok(())
    }

    async fn reload(&mut self) -> Result<(), SessionError> {
        let url = self.current().ok_or(SessionError::NoPage)?.url.clone();
        self.navigate(&url).await
    }

    fn current(&self) -> Option<&LoadedPage> {
        self.page.as_ref()
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.poll)
    }
}

// ── Runtime selection ──

/// The session a stage owns for its whole run; dropped when the stage ends.
pub enum Session {
    Http(HttpSession),
    Spider(SpiderSession),
}

impl Session {
    pub fn open(settings: &FetchSettings) -> anyhow::Result<Self> {
        let session = match settings.backend {
            Backend::Http => Session::Http(HttpSession::new(settings)?),
            Backend::Spider => Session::Spider(SpiderSession::from_env(settings)?),
        };
        debug!("Opened {} session", session.kind());
        Ok(session)
    }

    fn kind(&self) -> &'static str {
        match self {
            Session::Http(_) => "http",
            Session::Spider(_) => "spider",
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Closing {} session", self.kind());
    }
}

impl PageSession for Session {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        match self {
            Session::Http(s) => s.navigate(url).await,
            Session::Spider(s) => s.navigate(url).await,
        }
    }

    async fn reload(&mut self) -> Result<(), SessionError> {
        match self {
            Session::Http(s) => s.reload().await,
            Session::Spider(s) => s.reload().await,
        }
    }

    fn current(&self) -> Option<&LoadedPage> {
        match self {
            Session::Http(s) => s.current(),
            Session::Spider(s) => s.current(),
        }
    }

    fn poll_interval(&self) -> Option<Duration> {
        match self {
            Session::Http(s) => s.poll_interval(),
            Session::Spider(s) => s.poll_interval(),
        }
    }
}

/// In-memory session serving canned pages, for stage tests.
#[cfg(test)]
pub mod fake {
    use std::collections::{HashMap, HashSet};

    use super::*;

    #[derive(Default)]
    pub struct FakeSession {
        pages: HashMap<String, String>,
        timeouts: HashSet<String>,
        pub visited: Vec<String>,
        page: Option<LoadedPage>,
    }

    impl FakeSession {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn timing_out(mut self, url: &str) -> Self {
            self.timeouts.insert(url.to_string());
            self
        }
    }

    impl PageSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
            self.visited.push(url.to_string());
            self.page = None;
            if self.timeouts.contains(url) {
                return Err(SessionError::Timeout {
                    url: url.to_string(),
                    target: "page load".to_string(),
                    waited: Duration::ZERO,
                });
            }
            let html = self.pages.get(url).ok_or_else(|| SessionError::Status {
                url: url.to_string(),
                status: 404,
            })?;
            self.page = Some(LoadedPage {
                url: url.to_string(),
                html: html.clone(),
            });
            Ok(())
        }

        async fn reload(&mut self) -> Result<(), SessionError> {
            Ok(())
        }

        fn current(&self) -> Option<&LoadedPage> {
            self.page.as_ref()
        }

        fn poll_interval(&self) -> Option<Duration> {
            None
        }
    }
}
