//! Configuration types for profile-card

use crate::error::{Error, Result};
use crate::types::Handle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Upstream REST API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URI; a profile is fetched from `{base_url}/{handle}`
    /// (default: "https://api.github.com/users")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 10 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry behavior for the retrying fetch entry point
///
/// The wait after failed attempt `n` is `initial_delay * backoff_multiplier^(n-1)`,
/// capped at `max_delay` when one is set. With the defaults that is exactly
/// `2^n` seconds: 2s, 4s, 8s, ... with no upper bound.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Upper bound on a single delay (default: none)
    #[serde(
        default,
        with = "option_duration_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_delay: Option<Duration>,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: None,
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Base delay (before jitter) to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

/// Main configuration for a profile card
///
/// Read-only once a data source has been built from it.
///
/// # Example
///
/// ```
/// use profile_card::Config;
///
/// let config: Config = serde_json::from_str(r#"{
///     "candidates": ["octocat", "torvalds"],
///     "retry": { "max_attempts": 5 }
/// }"#).unwrap();
///
/// assert_eq!(config.retry.max_attempts, 5);
/// assert_eq!(config.api.base_url, "https://api.github.com/users");
/// config.validate().unwrap();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Handles a random load picks from (ordered, non-empty)
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Retry settings for bootstrap and explicit retry loads
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            candidates: default_candidates(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Check the configuration for values that would make the card unusable
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.candidates.is_empty() {
            return Err(Error::config(
                "candidates",
                "candidate list must not be empty",
            ));
        }
        for candidate in &self.candidates {
            Handle::parse(candidate).map_err(|_| {
                Error::config("candidates", format!("invalid candidate handle '{candidate}'"))
            })?;
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts",
                "max_attempts must be at least 1",
            ));
        }
        if self.retry.backoff_multiplier.is_nan() || self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                "backoff_multiplier must be >= 1.0",
            ));
        }

        Ok(())
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            Error::config(
                "api.base_url",
                format!("invalid base URL '{}': {e}", self.api.base_url),
            )
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::config(
                "api.base_url",
                format!("base URL '{}' cannot carry a path", self.api.base_url),
            ));
        }
        Ok(url)
    }
}

fn default_base_url() -> String {
    "https://api.github.com/users".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("profile-card/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_candidates() -> Vec<String> {
    [
        "octocat",
        "torvalds",
        "gaearon",
        "sindresorhus",
        "tj",
        "yyx990803",
        "addyosmani",
        "kentcdodds",
        "mojombo",
        "defunkt",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
