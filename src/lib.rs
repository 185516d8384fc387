//! # profile-card
//!
//! Headless core of a public profile card: fetch a user profile from a REST
//! API, normalize it into a stable record, and drive a renderer through
//! loading, loaded and error states.
//!
//! ## Design
//!
//! - **Library-first** - No UI; presentation is a [`Renderer`] you implement
//! - **Injected collaborators** - A [`Controller`] is built from a [`DataSource`] and a
//!   [`Renderer`], so every card is independent and easy to test with substitutes
//! - **Single-flight** - At most one fetch per card is in flight; extra load requests are ignored
//! - **Classified failures** - Every failure maps to an [`ErrorKind`] and a user-facing message
//!
//! ## Quick Start
//!
//! ```no_run
//! use profile_card::{Config, Controller, LoadState, Renderer, Severity, UserRecord};
//!
//! struct Console;
//!
//! impl Renderer for Console {
//!     fn show_loading(&mut self) {}
//!     fn show_error(&mut self, message: &str) { eprintln!("{message}"); }
//!     fn show_loaded(&mut self, record: &UserRecord) {
//!         println!("{} (@{}): {}", record.display_name(), record.handle(), record.bio());
//!     }
//!     fn set_following(&mut self, _following: bool) {}
//!     fn notify(&mut self, _message: &str, _severity: Severity) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut card = Controller::from_config(&Config::default(), Console)?;
//!
//!     card.load_handle("octocat").await;
//!     if let LoadState::Loaded(record) = card.state() {
//!         println!("{} followers", record.followers());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Profile card state machine
pub mod controller;
/// Error types
pub mod error;
/// Rendering boundary
pub mod renderer;
/// Retry logic with exponential backoff
pub mod retry;
/// Profile data sources
pub mod source;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, RetryConfig};
pub use controller::Controller;
pub use error::{Error, ErrorKind, FetchError, Result, VALIDATION_MESSAGE};
pub use renderer::{CountAnimation, Renderer, Severity};
pub use source::{DataSource, HttpDataSource};
pub use types::{Event, Handle, LoadState, LoadTarget, RawUser, UiEvent, UserRecord};
