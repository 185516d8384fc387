//! Core types and events

use crate::error::{Error, ErrorKind, FetchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bio shown when the profile has none
pub const NO_BIO: &str = "No bio available";

/// Location shown when the profile has none
pub const NO_LOCATION: &str = "Location not specified";

/// Longest handle the upstream API accepts
pub const MAX_HANDLE_LEN: usize = 39;

/// Unique identifier string for a profile
///
/// Always trimmed, non-empty, and safe to use as a single URL path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Validate and normalize a handle
    ///
    /// Surrounding whitespace is trimmed. Empty input, embedded whitespace,
    /// URL-reserved characters (`/ ? # %`), dot-only handles (`.`, `..`) and
    /// overlong handles are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("handle is empty".into()));
        }
        if trimmed.chars().count() > MAX_HANDLE_LEN {
            return Err(Error::Validation(format!(
                "handle exceeds {MAX_HANDLE_LEN} characters"
            )));
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
        {
            return Err(Error::Validation(format!(
                "handle contains invalid character {c:?}"
            )));
        }
        // `.` and `..` are path navigation, never a segment of their own
        if trimmed.chars().all(|c| c == '.') {
            return Err(Error::Validation("handle is a relative path".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Handle {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

/// User payload as returned by `GET {base}/{handle}`
///
/// Only the fields the card displays are decoded; unknown fields are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawUser {
    /// Numeric account id
    pub id: u64,
    /// Account handle
    pub login: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar image URI
    pub avatar_url: String,
    /// Biography text
    #[serde(default)]
    pub bio: Option<String>,
    /// Free-form location
    #[serde(default)]
    pub location: Option<String>,
    /// Public email
    #[serde(default)]
    pub email: Option<String>,
    /// Organization
    #[serde(default)]
    pub company: Option<String>,
    /// Website URI
    #[serde(default)]
    pub blog: Option<String>,
    /// Follower count
    #[serde(default)]
    pub followers: Option<i64>,
    /// Following count
    #[serde(default)]
    pub following: Option<i64>,
    /// Public repository count
    #[serde(default)]
    pub public_repos: Option<i64>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Profile page URI
    pub html_url: String,
}

/// Normalized, immutable snapshot of one profile
///
/// Optional fields are either non-empty or `None`, never an empty string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    id: u64,
    handle: Handle,
    display_name: String,
    avatar_url: String,
    bio: String,
    location: String,
    email: Option<String>,
    company: Option<String>,
    website: Option<String>,
    followers: u64,
    following: u64,
    public_repos: u64,
    created_at: DateTime<Utc>,
    profile_url: String,
}

impl UserRecord {
    /// Normalize a raw payload, applying the documented fallbacks
    pub fn from_raw(raw: RawUser) -> std::result::Result<Self, FetchError> {
        let handle = Handle::parse(&raw.login).map_err(|e| {
            tracing::warn!(login = %raw.login, error = %e, "payload carried an unusable login");
            FetchError::new(ErrorKind::Unknown)
        })?;

        let display_name = non_blank(raw.name).unwrap_or_else(|| handle.to_string());

        Ok(Self {
            id: raw.id,
            display_name,
            avatar_url: raw.avatar_url.trim().to_string(),
            bio: non_blank(raw.bio).unwrap_or_else(|| NO_BIO.to_string()),
            location: non_blank(raw.location).unwrap_or_else(|| NO_LOCATION.to_string()),
            email: non_blank(raw.email),
            company: non_blank(raw.company),
            website: non_blank(raw.blog),
            followers: count(raw.followers),
            following: count(raw.following),
            public_repos: count(raw.public_repos),
            created_at: raw.created_at,
            profile_url: raw.html_url.trim().to_string(),
            handle,
        })
    }

    /// Numeric account id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Account handle
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Display name, falling back to the handle
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Avatar image URI
    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }

    /// Biography, or [`NO_BIO`]
    pub fn bio(&self) -> &str {
        &self.bio
    }

    /// Location, or [`NO_LOCATION`]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Public email
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Organization
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    /// Website exactly as published
    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    /// Website as a link target: `https://` is prefixed when no scheme is given
    pub fn website_href(&self) -> Option<String> {
        self.website.as_deref().map(|site| {
            if site.starts_with("http://") || site.starts_with("https://") {
                site.to_string()
            } else {
                format!("https://{site}")
            }
        })
    }

    /// Follower count
    pub fn followers(&self) -> u64 {
        self.followers
    }

    /// Following count
    pub fn following(&self) -> u64 {
        self.following
    }

    /// Public repository count
    pub fn public_repos(&self) -> u64 {
        self.public_repos
    }

    /// Account creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Membership line for the card, e.g. `Joined January 2011`
    pub fn joined(&self) -> String {
        format!("Joined {}", self.created_at.format("%B %Y"))
    }

    /// Profile page URI
    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn count(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

/// What a load should fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "handle", rename_all = "snake_case")]
pub enum LoadTarget {
    /// A handle picked at random from the configured candidates
    Random,
    /// A specific handle
    Handle(Handle),
}

impl std::fmt::Display for LoadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadTarget::Random => f.write_str("<random>"),
            LoadTarget::Handle(h) => write!(f, "{h}"),
        }
    }
}

/// The controller's load state; exactly one is current at any time
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The last load succeeded
    Loaded(UserRecord),
    /// The last load failed
    Failed {
        /// Fetch classification (`None` for a rejected handle)
        kind: Option<ErrorKind>,
        /// Message shown to the user
        message: String,
    },
}

impl LoadState {
    /// Whether a fetch is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// The current record, if loaded
    pub fn record(&self) -> Option<&UserRecord> {
        match self {
            LoadState::Loaded(record) => Some(record),
            _ => None,
        }
    }
}

/// Interaction emitted by the renderer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// Reload the current profile (or a random one when none is loaded)
    Refresh,
    /// Repeat the last failed load, with backoff
    Retry,
    /// Flip the follow toggle
    FollowToggle,
    /// Message the current profile
    Message,
    /// Load a specific handle, as typed by the user
    Load(String),
    /// Load a random profile
    LoadRandom,
}

/// Event published to controller subscribers
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A load began
    LoadStarted {
        /// What is being fetched
        target: LoadTarget,
    },

    /// A load completed and the record is now current
    Loaded {
        /// Handle of the loaded profile
        handle: Handle,
        /// Its display name
        display_name: String,
    },

    /// A load failed
    LoadFailed {
        /// Fetch classification (`None` for a rejected handle)
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<ErrorKind>,
        /// Message shown to the user
        message: String,
    },

    /// The follow toggle changed
    FollowChanged {
        /// Handle of the current profile
        handle: Handle,
        /// New follow state
        following: bool,
    },
}
