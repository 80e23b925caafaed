use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use udc_taxonomy_engine::crawl::{FetchError, PageFetcher, PageTarget};

/// Per-request timeout; the crawl as a whole has its own, longer limit.
const REQUEST_TIMEOUT_SECS: u64 = 60;

const USER_AGENT: &str = concat!("udc-taxonomy/", env!("CARGO_PKG_VERSION"));

/// Fetches classification pages over HTTP. A node page is the base URL with
/// the node's id added as the `id` query parameter.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPageFetcher {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim().to_string(),
        })
    }

    fn page_url(&self, target: &PageTarget) -> String {
        match target {
            PageTarget::Root => self.base_url.clone(),
            PageTarget::Node(id) => {
                let separator = if self.base_url.contains('?') { '&' } else { '?' };
                format!("{}{separator}id={id}", self.base_url)
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, target: &PageTarget) -> Result<String, FetchError> {
        let url = self.page_url(target);
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
