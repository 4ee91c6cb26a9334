use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;

use super::Transport;
use crate::error::FetchError;

const BOT_CHALLENGE_MARKERS: [&str; 6] = [
    "cf-browser-verification",
    "cf-captcha-container",
    "px-captcha",
    "verify you are a human",
    "please enable javascript and cookies",
    "blocked by cloudflare",
];

/// Plain HTTP GET transport.
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(15));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for RequestFetcher {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<String, FetchError> {
        let response = self.client.get(url).headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        if is_bot_challenge(&html) {
            return Err(FetchError::Blocked {
                url: url.to_string(),
            });
        }
        Ok(html)
    }
}

/// Detects anti-bot interstitials served with a success status.
pub(crate) fn is_bot_challenge(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    BOT_CHALLENGE_MARKERS.iter().any(|m| lower.contains(m))
}
