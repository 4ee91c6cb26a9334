use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FetchError;

#[derive(Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: String,
}

/// Handle on the external page-rendering service.
///
/// Opened lazily by [`super::PageFetcher`] the first time a site flagged
/// `render` is fetched, and closed by [`super::PageFetcher::shutdown`].
/// Requests are issued one at a time; the handle is not shared.
pub struct RenderSession {
    endpoint: String,
    client: Client,
    renders: u32,
}

impl RenderSession {
    pub fn open(service_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let endpoint = format!("{}/api/fetch-content", service_url.trim_end_matches('/'));
        let client = Client::builder().timeout(timeout).build()?;
        info!("Opened render session against {}", endpoint);
        Ok(Self {
            endpoint,
            client,
            renders: 0,
        })
    }

    pub async fn render(&mut self, url: &str) -> Result<String, FetchError> {
        debug!("Rendering {} through {}", url, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ContentRequest { url })
            .send()
            .await
            .map_err(|e| FetchError::Render(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Render(format!(
                "render of {} failed with status: {}",
                url,
                response.status()
            )));
        }

        let content: ContentResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Render(e.to_string()))?;
        self.renders += 1;
        Ok(content.content)
    }

    pub fn close(self) {
        info!(
            "Closed render session against {} after {} renders",
            self.endpoint, self.renders
        );
    }
}
