mod archive;
mod chrome;
mod headers;
mod request;

pub use archive::ArchiveResolver;
pub use chrome::RenderSession;
pub use request::RequestFetcher;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::HarvestConfig;
use crate::error::FetchError;

/// Issues a single GET for a page.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<String, FetchError>;
}

/// Clock used for every wait, so tests can observe delays instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `base * 2^attempt` seconds plus up to one second of jitter.
pub(crate) fn backoff_delay(base_secs: f64, attempt: u32) -> Duration {
    let exponential = base_secs * 2f64.powi(attempt.min(30) as i32);
    Duration::from_secs_f64(exponential + rand::random::<f64>())
}

/// How a registered site must be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchMode {
    /// Fetch an archived snapshot instead of the live page
    pub archive: bool,
    /// Fetch through the rendering service
    pub render: bool,
}

fn content_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("head > *, body *").expect("valid content selector"))
}

/// A fetched page and its parsed document.
pub struct Page {
    url: String,
    fetched_from: String,
    html: String,
    document: Html,
}

impl Page {
    pub fn new(url: impl Into<String>, fetched_from: impl Into<String>, html: String) -> Self {
        let document = Html::parse_document(&html);
        Self {
            url: url.into(),
            fetched_from: fetched_from.into(),
            html,
            document,
        }
    }

    /// Page parsed from HTML already in hand.
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(url.clone(), url, html.into())
    }

    /// The requested URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Where the HTML actually came from (differs from `url` in archive mode).
    pub fn fetched_from(&self) -> &str {
        &self.fetched_from
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Whether the response carried any markup or text at all.
    pub fn has_content(&self) -> bool {
        if self.html.trim().is_empty() {
            return false;
        }
        self.document.select(content_selector()).next().is_some()
            || self
                .document
                .root_element()
                .text()
                .any(|t| !t.trim().is_empty())
    }
}

/// Retrieves pages with retry, optional archive substitution and optional rendering.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    archive: ArchiveResolver,
    render_service_url: Option<String>,
    render_timeout: Duration,
    session: Option<RenderSession>,
    retries: u32,
    backoff_secs: f64,
}

impl PageFetcher {
    pub fn new(
        config: &HarvestConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, FetchError> {
        let archive = ArchiveResolver::new(config.archive.clone(), sleeper.clone())?;
        Ok(Self {
            transport,
            sleeper,
            archive,
            render_service_url: config.fetch.render_service_url.clone(),
            render_timeout: config.fetch.timeout(),
            session: None,
            retries: config.fetch.retries,
            backoff_secs: config.fetch.backoff_secs,
        })
    }

    /// Fetches `url`. The returned page always reports `url` as its address,
    /// whichever path produced the HTML.
    pub async fn fetch(&mut self, url: &str, mode: FetchMode) -> Result<Page, FetchError> {
        let target = if mode.archive {
            self.archive.resolve(url).await?
        } else {
            url.to_string()
        };

        let html = if mode.render {
            self.render(&target).await?
        } else {
            self.fetch_with_retry(&target).await?
        };

        Ok(Page::new(url, target, html))
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match self.transport.get(url, headers::browser_headers()).await {
                Ok(html) => {
                    debug!("Fetched {} on attempt {}", url, attempt + 1);
                    return Ok(html);
                }
                Err(e) if e.is_transient() => {
                    warn!("Attempt {} failed for {}: {}", attempt + 1, url, e);
                    last_error = e.to_string();
                    if attempt + 1 < attempts {
                        self.sleeper
                            .sleep(backoff_delay(self.backoff_secs, attempt))
                            .await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        error!("Failed to fetch {} after {} attempts", url, attempts);
        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last: last_error,
        })
    }

    async fn render(&mut self, url: &str) -> Result<String, FetchError> {
        if self.session.is_none() {
            let service = self.render_service_url.as_deref().ok_or_else(|| {
                FetchError::Render("no render_service_url configured".to_string())
            })?;
            self.session = Some(RenderSession::open(service, self.render_timeout)?);
        }
        match self.session.as_mut() {
            Some(session) => session.render(url).await,
            None => Err(FetchError::Render("render session unavailable".to_string())),
        }
    }

    /// Closes the render session if one was opened.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

impl Drop for PageFetcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub(crate) fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    /// Answers GETs from a fixed script, one entry per call.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<String, FetchError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<String, FetchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str, _headers: HeaderMap) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Render("script exhausted".to_string())))
        }
    }
}
