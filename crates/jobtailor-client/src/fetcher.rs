use std::time::Duration;

use jobtailor_core::error::AppError;
use jobtailor_core::traits::Fetcher;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::backoff;

const DEFAULT_READER_BASE_URL: &str = "https://r.jina.ai/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Job postings are capped at this many bytes; anything longer is
/// navigation chrome and boilerplate the classifier would discard anyway.
const MAX_BODY_BYTES: usize = 100_000;

/// Fetches a job posting as rendered markdown through the r.jina.ai reader
/// proxy: `GET https://r.jina.ai/<target-url>` returns the page as
/// markdown-like text. A thin pass-through — the classifier downstream does
/// the real work on whatever text comes back.
#[derive(Clone)]
pub struct ReaderFetcher {
    client: Client,
    base_url: String,
    timeout_secs: u64,
    cancel: CancellationToken,
}

impl ReaderFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent("jobtailor/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_READER_BASE_URL.to_string(),
            timeout_secs: timeout.as_secs(),
            cancel: CancellationToken::new(),
        })
    }

    /// Attach a caller-supplied cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn reader_url(&self, target: &str) -> Result<Url, AppError> {
        Url::parse(&format!("{}{}", self.base_url, target))
            .map_err(|e| AppError::Transport(format!("invalid target URL {target}: {e}")))
    }
}

impl Fetcher for ReaderFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let reader_url = self.reader_url(url)?;

        let mut backoff_ms = 0u64;
        loop {
            if backoff_ms != 0 {
                backoff::wait(&self.cancel, backoff_ms).await?;
            }

            let send = self.client.get(reader_url.clone()).send();
            let response = tokio::select! {
                _ = self.cancel.cancelled() => return Err(AppError::Cancelled),
                r = send => r.map_err(|e| {
                    if e.is_timeout() {
                        AppError::Timeout(self.timeout_secs)
                    } else if e.is_connect() {
                        AppError::Network(format!("Connection failed: {e}"))
                    } else {
                        AppError::Transport(e.to_string())
                    }
                })?,
            };

            let status = response.status();
            if status.as_u16() == 429 {
                match backoff::next_backoff(backoff_ms) {
                    Some(ms) => {
                        tracing::warn!(backoff_ms = ms, "Throttled by reader proxy, retrying");
                        backoff_ms = ms;
                        continue;
                    }
                    None => return Err(AppError::RateLimited),
                }
            }
            if !status.is_success() {
                return Err(AppError::Transport(format!(
                    "reader proxy returned HTTP {} for {}",
                    status.as_u16(),
                    url
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| AppError::Transport(format!("failed to read response body: {e}")))?;
            let capped = &bytes[..bytes.len().min(MAX_BODY_BYTES)];
            return Ok(String::from_utf8_lossy(capped).into_owned());
        }
    }
}
