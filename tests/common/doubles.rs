//! Substitute collaborators for controller tests

use super::fixtures::record_for;
use async_trait::async_trait;
use profile_card::{
    DataSource, ErrorKind, FetchError, Renderer, Result, RetryConfig, Severity, UserRecord,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

type Respond = Box<dyn Fn(&str, u32) -> Result<UserRecord> + Send + Sync>;

/// Scripted [`DataSource`] that counts and records every fetch
///
/// The response function receives the handle and the 1-based call number.
pub struct StubSource {
    respond: Respond,
    delay: Duration,
    calls: AtomicU32,
    requested: Mutex<Vec<String>>,
    candidates: Vec<String>,
    retry: RetryConfig,
}

impl StubSource {
    pub fn new(respond: impl Fn(&str, u32) -> Result<UserRecord> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            requested: Mutex::new(Vec::new()),
            candidates: vec!["octocat".into(), "torvalds".into()],
            retry: RetryConfig::default(),
        }
    }

    /// Every fetch succeeds with a record for the requested handle
    pub fn ok() -> Self {
        Self::new(|handle, _| Ok(record_for(handle)))
    }

    /// Every fetch fails with `kind`
    pub fn failing(kind: ErrorKind) -> Self {
        Self::new(move |_, _| Err(FetchError::new(kind).into()))
    }

    /// The first `failures` fetches fail with `kind`, later ones succeed
    pub fn failing_first(failures: u32, kind: ErrorKind) -> Self {
        Self::new(move |handle, call| {
            if call <= failures {
                Err(FetchError::new(kind).into())
            } else {
                Ok(record_for(handle))
            }
        })
    }

    /// Suspend every fetch for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_candidates(mut self, candidates: &[&str]) -> Self {
        self.candidates = candidates.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for StubSource {
    async fn fetch_by_handle(&self, handle: &str) -> Result<UserRecord> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requested.lock().unwrap().push(handle.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(handle, call)
    }

    fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
}

/// One call made on the renderer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderCall {
    Idle,
    Loading,
    Error(String),
    Loaded(String),
    Following(bool),
    Notify(String, Severity),
}

/// [`Renderer`] that records every call in order
#[derive(Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
    pub following: bool,
}

impl RecordingRenderer {
    pub fn errors(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::Error(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(&str, Severity)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::Notify(m, s) => Some((m.as_str(), *s)),
                _ => None,
            })
            .collect()
    }

    pub fn loaded(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RenderCall::Loaded(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &RenderCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl Renderer for RecordingRenderer {
    fn show_idle(&mut self) {
        self.calls.push(RenderCall::Idle);
    }

    fn show_loading(&mut self) {
        self.calls.push(RenderCall::Loading);
    }

    fn show_error(&mut self, message: &str) {
        self.calls.push(RenderCall::Error(message.to_string()));
    }

    fn show_loaded(&mut self, record: &UserRecord) {
        self.calls
            .push(RenderCall::Loaded(record.handle().to_string()));
    }

    fn set_following(&mut self, following: bool) {
        self.following = following;
        self.calls.push(RenderCall::Following(following));
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        self.calls
            .push(RenderCall::Notify(message.to_string(), severity));
    }
}
