use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned HTTP {status}")]
    Status { status: u16 },
}

/// Where the raw feed document comes from. Seam for tests; production uses
/// [`HttpFeedSource`].
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_text(&self) -> Result<String, FetchError>;
}

/// Fetches the configured document URL with a bounded timeout. Any
/// non-success status is an error; an error page body must never flow into
/// the parser as if it were data.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_text(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
