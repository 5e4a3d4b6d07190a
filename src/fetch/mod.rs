// src/fetch/mod.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

pub mod cache;
pub mod urls;

pub use cache::{FetchOutcome, FetchSummary, PageCache, Throttle};
pub use urls::Layout;

/// A fetched response. Non-success statuses are data, not errors.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

/// Where report pages come from. `Err` means the transport itself failed.
#[async_trait]
pub trait PageSource {
    async fn get(&self, url: &Url) -> Result<Page>;
}

#[async_trait]
impl<T: PageSource + Sync + ?Sized> PageSource for &T {
    async fn get(&self, url: &Url) -> Result<Page> {
        (**self).get(url).await
    }
}

/// `PageSource` over a plain `reqwest::Client`, one GET per call, no retries.
#[derive(Clone, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn get(&self, url: &Url) -> Result<Page> {
        debug!("Fetching text from {}", url);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))?;
        Ok(Page { status, body })
    }
}
