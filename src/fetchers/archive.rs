use log::{debug, info, warn};
use reqwest::header::CONTENT_LOCATION;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{backoff_delay, Sleeper};
use crate::config::ArchiveConfig;
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: Snapshots,
}

#[derive(Debug, Default, Deserialize)]
struct Snapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    url: String,
}

/// Maps a page URL to an archived snapshot of it, requesting one when none exists.
pub struct ArchiveResolver {
    client: Client,
    config: ArchiveConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl ArchiveResolver {
    pub fn new(config: ArchiveConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            sleeper,
        })
    }

    pub async fn resolve(&self, url: &str) -> Result<String, FetchError> {
        if let Some(snapshot) = self.lookup(url).await? {
            info!("Using archived snapshot {} for {}", snapshot, url);
            return Ok(snapshot);
        }

        info!("No archived snapshot for {}, requesting one", url);
        self.request_snapshot(url).await
    }

    async fn lookup(&self, url: &str) -> Result<Option<String>, FetchError> {
        let attempts = self.config.retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            let outcome = self
                .client
                .get(&self.config.lookup_url)
                .query(&[("url", url)])
                .send()
                .await;

            last_error = match outcome {
                Ok(response) if response.status().is_success() => {
                    let availability: Availability = response.json().await.map_err(|e| {
                        FetchError::Archive(format!("unreadable lookup response: {e}"))
                    })?;
                    return Ok(availability
                        .archived_snapshots
                        .closest
                        .filter(|s| s.available && !s.url.is_empty())
                        .map(|s| s.url));
                }
                Ok(response) if is_retryable(response.status()) => {
                    format!("status {}", response.status())
                }
                Ok(response) => {
                    return Err(FetchError::Archive(format!(
                        "lookup of {} returned status {}",
                        url,
                        response.status()
                    )));
                }
                Err(e) => e.to_string(),
            };

            warn!(
                "Snapshot lookup {}/{} for {} failed: {}",
                attempt + 1,
                attempts,
                url,
                last_error
            );
            if attempt + 1 < attempts {
                self.sleeper
                    .sleep(backoff_delay(self.config.backoff_secs, attempt))
                    .await;
            }
        }

        Err(FetchError::Archive(format!(
            "lookup of {url} failed after {attempts} attempts: {last_error}"
        )))
    }

    async fn request_snapshot(&self, url: &str) -> Result<String, FetchError> {
        let save_url = format!("{}{}", self.config.save_url, url);
        let attempts = self.config.retries.max(1);

        for attempt in 0..attempts {
            let outcome = self.client.get(&save_url).send().await;
            let retry_reason = match outcome {
                Ok(response) if response.status().is_success() => {
                    let location = response
                        .headers()
                        .get(CONTENT_LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .map(|loc| self.absolutise(loc));
                    let snapshot = location.unwrap_or_else(|| response.url().to_string());
                    info!("Archived {} as {}", url, snapshot);
                    return Ok(snapshot);
                }
                Ok(response) if is_retryable(response.status()) => {
                    format!("status {}", response.status())
                }
                Ok(response) => {
                    return Err(FetchError::Archive(format!(
                        "snapshot request for {} returned status {}",
                        url,
                        response.status()
                    )));
                }
                Err(e) => e.to_string(),
            };

            warn!(
                "Snapshot request {}/{} for {} failed: {}",
                attempt + 1,
                attempts,
                url,
                retry_reason
            );
            if attempt + 1 < attempts {
                let delay = backoff_delay(self.config.backoff_secs, attempt);
                debug!("Waiting {:?} before next snapshot request", delay);
                self.sleeper.sleep(delay).await;
            }
        }

        Err(FetchError::Archive(format!(
            "could not archive {url} after {attempts} attempts"
        )))
    }

    fn absolutise(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.host.trim_end_matches('/'),
                location.trim_start_matches('/')
            )
        }
    }
}

/// Rate limiting and server errors are worth another attempt.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
