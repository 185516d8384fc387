//! Profile data sources
//!
//! [`DataSource`] is the seam between the controller and the network. The
//! provided methods implement random selection and the retrying entry point on
//! top of [`DataSource::fetch_by_handle`], so substitute sources only need to
//! supply a single fetch.

use crate::config::{Config, RetryConfig};
use crate::error::{Error, ErrorKind, FetchError, Result};
use crate::retry;
use crate::types::{Handle, RawUser, UserRecord};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

/// Source of normalized profile records
///
/// # Examples
///
/// ```no_run
/// use profile_card::{Config, DataSource, HttpDataSource};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpDataSource::new(&Config::default())?;
///
/// let record = source.fetch_by_handle("octocat").await?;
/// println!("{} has {} followers", record.display_name(), record.followers());
///
/// let record = source.fetch_with_retry("octocat", 3).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch and normalize one profile with a single request
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] when the handle is empty or malformed (no request is made)
    /// - [`Error::Fetch`] carrying the classified failure otherwise
    async fn fetch_by_handle(&self, handle: &str) -> Result<UserRecord>;

    /// Handles [`DataSource::fetch_random`] picks from
    fn candidates(&self) -> &[String];

    /// Backoff settings used by [`DataSource::fetch_with_retry`]
    fn retry_config(&self) -> &RetryConfig;

    /// Pick one candidate uniformly at random
    fn pick_random_handle(&self) -> Result<Handle> {
        let mut rng = rand::thread_rng();
        let candidate = self
            .candidates()
            .choose(&mut rng)
            .ok_or_else(|| Error::config("candidates", "candidate list is empty"))?;
        Handle::parse(candidate)
    }

    /// Fetch a profile for a randomly picked candidate
    async fn fetch_random(&self) -> Result<UserRecord> {
        let handle = self.pick_random_handle()?;
        tracing::debug!(handle = %handle, "picked random candidate");
        self.fetch_by_handle(handle.as_str()).await
    }

    /// Fetch with up to `max_attempts` attempts and exponential backoff
    ///
    /// Server errors, network failures and unclassified statuses are retried;
    /// not-found, rate-limited and validation failures are returned at once.
    async fn fetch_with_retry(&self, handle: &str, max_attempts: u32) -> Result<UserRecord> {
        let handle = Handle::parse(handle)?;
        retry::fetch_with_retry(self.retry_config(), max_attempts, || {
            self.fetch_by_handle(handle.as_str())
        })
        .await
    }
}

/// [`DataSource`] backed by the upstream REST API
///
/// Issues exactly one `GET {base_url}/{handle}` per attempt. Configuration is
/// read-only after construction.
pub struct HttpDataSource {
    http: reqwest::Client,
    base_url: Url,
    candidates: Vec<String>,
    retry: RetryConfig,
}

impl HttpDataSource {
    /// Build a source from a validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let user_agent = HeaderValue::from_str(&config.api.user_agent)
            .map_err(|e| Error::config("api.user_agent", format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.api.timeout)
            .build()
            .map_err(|e| Error::Other(format!("failed to create HTTP client: {e}")))?;

        Self::with_client(http, config)
    }

    /// Build a source around an existing client
    ///
    /// The client is used as-is: `api.timeout` and `api.user_agent` only apply
    /// to clients built by [`HttpDataSource::new`].
    pub fn with_client(http: reqwest::Client, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http,
            base_url: config.base_url()?,
            candidates: config.candidates.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Configured base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn user_url(&self, handle: &Handle) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config("api.base_url", "base URL cannot carry a path"))?
            .pop_if_empty()
            .push(handle.as_str());
        Ok(url)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_by_handle(&self, handle: &str) -> Result<UserRecord> {
        let handle = Handle::parse(handle)?;
        let url = self.user_url(&handle)?;

        tracing::debug!(handle = %handle, url = %url, "fetching profile");

        let response = self.http.get(url).send().await.map_err(|e| {
            tracing::warn!(handle = %handle, error = %e, "profile request failed in transport");
            FetchError::network()
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(handle = %handle, status = status.as_u16(), "profile request rejected");
            return Err(FetchError::from_status(status.as_u16()).into());
        }

        let raw: RawUser = response.json().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                FetchError::network()
            } else {
                tracing::warn!(handle = %handle, error = %e, "profile payload could not be decoded");
                FetchError::new(ErrorKind::Unknown)
            }
        })?;

        let record = UserRecord::from_raw(raw)?;
        tracing::debug!(handle = %record.handle(), "profile fetched");
        Ok(record)
    }

    fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
}
