//! Profile card controller
//!
//! The [`Controller`] owns the load state, the current record and the follow
//! flag of one card. It turns renderer interactions into data source calls and
//! decides which state follows each outcome:
//!
//! ```text
//! Idle ──load──▶ Loading ──ok──▶ Loaded ──load/refresh──▶ Loading
//!                   │                                        ▲
//!                   └──err──▶ Failed ──load/refresh/retry────┘
//! ```
//!
//! `Loading` is single-flight: a load requested while one is in flight is
//! ignored, neither queued nor restarted. Plain loads make one attempt;
//! [`Controller::bootstrap`] and the retry path go through
//! [`DataSource::fetch_with_retry`]. Every failure ends in `Failed` with an
//! error panel and a notification carrying the same message.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::renderer::{Renderer, Severity};
use crate::source::{DataSource, HttpDataSource};
use crate::types::{Event, Handle, LoadState, LoadTarget, UiEvent, UserRecord};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Capacity of the subscriber event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How many attempts a load gets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchMode {
    /// One attempt
    Single,
    /// Up to the configured attempt count, with backoff
    Retrying,
}

/// A started load whose result has not been applied yet
struct PendingLoad {
    fetch: BoxFuture<'static, Result<UserRecord>>,
    /// State to fall back to if the load is abandoned
    previous: LoadState,
}

/// State machine for one profile card
///
/// Each instance holds its own state; nothing is shared between instances.
///
/// # Example
///
/// ```no_run
/// use profile_card::{Config, Controller, Renderer, Severity, UiEvent, UserRecord};
/// use tokio_util::sync::CancellationToken;
///
/// struct Console;
///
/// impl Renderer for Console {
///     fn show_loading(&mut self) { println!("loading..."); }
///     fn show_error(&mut self, message: &str) { println!("error: {message}"); }
///     fn show_loaded(&mut self, record: &UserRecord) { println!("{}", record.display_name()); }
///     fn set_following(&mut self, following: bool) { println!("following: {following}"); }
///     fn notify(&mut self, message: &str, _severity: Severity) { println!("{message}"); }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut controller = Controller::from_config(&Config::default(), Console)?;
/// controller.bootstrap().await;
///
/// let (tx, rx) = tokio::sync::mpsc::channel(16);
/// tx.send(UiEvent::FollowToggle).await?;
/// drop(tx);
/// controller.run(rx, CancellationToken::new()).await;
/// # Ok(())
/// # }
/// ```
pub struct Controller<R: Renderer> {
    source: Arc<dyn DataSource>,
    renderer: R,
    state: LoadState,
    /// Last successfully loaded record; survives later failures
    current: Option<UserRecord>,
    following: bool,
    /// Target of the most recent load, repeated by the retry path
    last_target: Option<LoadTarget>,
    max_attempts: u32,
    event_tx: broadcast::Sender<Event>,
}

impl<R: Renderer> Controller<R> {
    /// Create a controller around an existing data source and renderer
    pub fn new(source: Arc<dyn DataSource>, renderer: R) -> Self {
        let max_attempts = source.retry_config().max_attempts;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            renderer,
            state: LoadState::Idle,
            current: None,
            following: false,
            last_target: None,
            max_attempts,
            event_tx,
        }
    }

    /// Create a controller fetching from the configured upstream API
    pub fn from_config(config: &Config, renderer: R) -> Result<Self> {
        let source = HttpDataSource::new(config)?;
        Ok(Self::new(Arc::new(source), renderer))
    }

    /// Current load state
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Last successfully loaded record
    pub fn current(&self) -> Option<&UserRecord> {
        self.current.as_ref()
    }

    /// Follow toggle
    pub fn is_following(&self) -> bool {
        self.following
    }

    /// The renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Initial load: a random profile, with retries
    pub async fn bootstrap(&mut self) {
        let pending = self.begin_load(LoadTarget::Random, FetchMode::Retrying);
        self.complete(pending).await;
    }

    /// Load a random profile with a single attempt
    pub async fn load_random(&mut self) {
        let pending = self.begin_load(LoadTarget::Random, FetchMode::Single);
        self.complete(pending).await;
    }

    /// Load the profile for a user-supplied handle with a single attempt
    ///
    /// An empty or malformed handle fails immediately without touching the
    /// data source.
    pub async fn load_handle(&mut self, input: &str) {
        let pending = self.begin_handle_load(input);
        self.complete(pending).await;
    }

    /// Reload the current profile, or a random one when none has loaded yet
    pub async fn refresh(&mut self) {
        let pending = self.begin_refresh();
        self.complete(pending).await;
    }

    /// Repeat the most recent load through the retrying entry point
    pub async fn retry(&mut self) {
        let pending = self.begin_retry();
        self.complete(pending).await;
    }

    /// Handle one renderer interaction to completion
    pub async fn handle(&mut self, event: UiEvent) {
        let pending = self.dispatch(event);
        self.complete(pending).await;
    }

    /// Process renderer interactions until `events` closes or `shutdown` fires
    ///
    /// Fetches run concurrently with event intake, so loads requested while one
    /// is in flight are dropped. On teardown an in-flight fetch is discarded, its
    /// result never applied, and the renderer is switched back to the view of the
    /// state that preceded it.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UiEvent>, shutdown: CancellationToken) {
        let mut in_flight: Option<PendingLoad> = None;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("controller shutting down");
                    break;
                }

                result = async {
                    match in_flight.as_mut() {
                        Some(pending) => (&mut pending.fetch).await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    self.finish_load(result);
                }

                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("renderer event channel closed");
                        break;
                    };
                    if let Some(pending) = self.dispatch(event) {
                        in_flight = Some(pending);
                    }
                }
            }
        }

        if let Some(pending) = in_flight {
            tracing::debug!("discarding in-flight load on teardown");
            self.state = pending.previous;
            self.redraw();
        }
    }

    /// Re-render the current state after it was restored
    fn redraw(&mut self) {
        match &self.state {
            LoadState::Idle => self.renderer.show_idle(),
            LoadState::Loading => self.renderer.show_loading(),
            LoadState::Loaded(record) => {
                self.renderer.show_loaded(record);
                self.renderer.set_following(self.following);
            }
            LoadState::Failed { message, .. } => self.renderer.show_error(message),
        }
    }

    /// Flip the follow toggle of the loaded profile
    ///
    /// Local only: nothing is sent anywhere. Ignored unless a profile is loaded.
    pub fn toggle_follow(&mut self) {
        let Some(record) = self.state.record() else {
            tracing::debug!(state = ?self.state, "follow toggle ignored: no profile loaded");
            return;
        };
        let name = record.display_name().to_string();
        let handle = record.handle().clone();

        self.following = !self.following;
        self.renderer.set_following(self.following);

        let (message, severity) = if self.following {
            (format!("You are now following {name}"), Severity::Success)
        } else {
            (format!("You unfollowed {name}"), Severity::Info)
        };
        self.renderer.notify(&message, severity);

        self.publish(Event::FollowChanged {
            handle,
            following: self.following,
        });
    }

    /// Surface the messaging placeholder for the loaded profile
    pub fn request_message(&mut self) {
        let Some(record) = self.state.record() else {
            tracing::debug!(state = ?self.state, "message request ignored: no profile loaded");
            return;
        };
        let message = format!(
            "Messaging {} (@{}) is coming soon!",
            record.display_name(),
            record.handle()
        );
        self.renderer.notify(&message, Severity::Info);
    }

    fn dispatch(&mut self, event: UiEvent) -> Option<PendingLoad> {
        tracing::trace!(event = ?event, "renderer event");
        match event {
            UiEvent::Refresh => self.begin_refresh(),
            UiEvent::Retry => self.begin_retry(),
            UiEvent::LoadRandom => self.begin_load(LoadTarget::Random, FetchMode::Single),
            UiEvent::Load(input) => self.begin_handle_load(&input),
            UiEvent::FollowToggle => {
                self.toggle_follow();
                None
            }
            UiEvent::Message => {
                self.request_message();
                None
            }
        }
    }

    fn begin_handle_load(&mut self, input: &str) -> Option<PendingLoad> {
        if self.state.is_loading() {
            tracing::debug!(input = %input, "load already in flight, ignoring request");
            return None;
        }
        match Handle::parse(input) {
            Ok(handle) => self.begin_load(LoadTarget::Handle(handle), FetchMode::Single),
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    fn begin_refresh(&mut self) -> Option<PendingLoad> {
        let target = match &self.current {
            Some(record) => LoadTarget::Handle(record.handle().clone()),
            None => LoadTarget::Random,
        };
        self.begin_load(target, FetchMode::Single)
    }

    fn begin_retry(&mut self) -> Option<PendingLoad> {
        let target = self.last_target.clone().unwrap_or(LoadTarget::Random);
        self.begin_load(target, FetchMode::Retrying)
    }

    /// Enter `Loading` and build the fetch, unless a load is already in flight
    fn begin_load(&mut self, target: LoadTarget, mode: FetchMode) -> Option<PendingLoad> {
        if self.state.is_loading() {
            tracing::debug!(load = %target, "load already in flight, ignoring request");
            return None;
        }

        tracing::debug!(load = %target, mode = ?mode, "starting load");
        let previous = std::mem::replace(&mut self.state, LoadState::Loading);
        self.last_target = Some(target.clone());
        self.renderer.show_loading();
        self.publish(Event::LoadStarted {
            target: target.clone(),
        });

        let source = Arc::clone(&self.source);
        let max_attempts = self.max_attempts;
        let fetch: BoxFuture<'static, Result<UserRecord>> = Box::pin(async move {
            match (target, mode) {
                (LoadTarget::Random, FetchMode::Single) => source.fetch_random().await,
                (LoadTarget::Random, FetchMode::Retrying) => {
                    let handle = source.pick_random_handle()?;
                    source.fetch_with_retry(handle.as_str(), max_attempts).await
                }
                (LoadTarget::Handle(handle), FetchMode::Single) => {
                    source.fetch_by_handle(handle.as_str()).await
                }
                (LoadTarget::Handle(handle), FetchMode::Retrying) => {
                    source.fetch_with_retry(handle.as_str(), max_attempts).await
                }
            }
        });

        Some(PendingLoad { fetch, previous })
    }

    async fn complete(&mut self, pending: Option<PendingLoad>) {
        if let Some(pending) = pending {
            let result = pending.fetch.await;
            self.finish_load(result);
        }
    }

    fn finish_load(&mut self, result: Result<UserRecord>) {
        match result {
            Ok(record) => {
                tracing::info!(handle = %record.handle(), "profile loaded");
                self.following = false;
                self.renderer.show_loaded(&record);
                self.renderer.set_following(false);
                self.renderer.notify(
                    &format!("Loaded {}'s profile", record.display_name()),
                    Severity::Success,
                );
                self.publish(Event::Loaded {
                    handle: record.handle().clone(),
                    display_name: record.display_name().to_string(),
                });
                self.current = Some(record.clone());
                self.state = LoadState::Loaded(record);
            }
            Err(e) => self.fail(&e),
        }
    }

    fn fail(&mut self, error: &Error) {
        let message = error.user_message();
        tracing::warn!(error = %error, code = error.code(), "profile load failed");

        self.state = LoadState::Failed {
            kind: error.kind(),
            message: message.clone(),
        };
        self.renderer.show_error(&message);
        self.renderer.notify(&message, Severity::Error);
        self.publish(Event::LoadFailed {
            kind: error.kind(),
            message,
        });
    }

    fn publish(&self, event: Event) {
        // No subscribers is not an error
        self.event_tx.send(event).ok();
    }
}
