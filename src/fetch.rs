use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Source of the HTML document a cycle extracts from. The seam keeps the
/// pipeline testable against fixture pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self) -> Result<String>;
}

/// Fetches the source page over HTTP. One attempt per poll cycle; transient
/// failures propagate to the orchestrator and the cycle waits for the next
/// scheduled trigger.
pub struct PageFetcher {
    client: reqwest::Client,
    url: String,
}

impl PageFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        debug!(url = %self.url, bytes = html.len(), "fetched source page");
        Ok(html)
    }
}
