//! Rendering boundary
//!
//! The controller drives a [`Renderer`] and nothing else touches presentation.
//! A renderer is a projection of the state handed to it: it never fetches and
//! never mutates a [`UserRecord`]. User interactions flow back to the
//! controller as [`UiEvent`](crate::types::UiEvent)s.

use crate::types::UserRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Severity of a transient notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Something completed
    Success,
    /// Neutral information
    Info,
    /// Degraded but not failed
    Warning,
    /// Something failed
    Error,
}

/// Visible surface of a profile card
pub trait Renderer {
    /// Switch back to the empty view shown before anything was loaded
    ///
    /// Only called when an abandoned first load is torn down.
    fn show_idle(&mut self) {}

    /// Switch to the loading view
    fn show_loading(&mut self);

    /// Switch to the error view, with a retry affordance
    fn show_error(&mut self, message: &str);

    /// Switch to the loaded view and display `record`
    fn show_loaded(&mut self, record: &UserRecord);

    /// Reflect the follow toggle
    fn set_following(&mut self, following: bool);

    /// Show a transient notification
    fn notify(&mut self, message: &str, severity: Severity);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn show_idle(&mut self) {
        (**self).show_idle();
    }

    fn show_loading(&mut self) {
        (**self).show_loading();
    }

    fn show_error(&mut self, message: &str) {
        (**self).show_error(message);
    }

    fn show_loaded(&mut self, record: &UserRecord) {
        (**self).show_loaded(record);
    }

    fn set_following(&mut self, following: bool) {
        (**self).set_following(following);
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        (**self).notify(message, severity);
    }
}

/// Count-up animation for a displayed integer
///
/// Presentation only: it may be restarted at any time, and once `duration`
/// has elapsed it always yields exactly the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountAnimation {
    from: u64,
    to: u64,
    duration: Duration,
}

impl CountAnimation {
    /// Default animation length
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(1000);

    /// Animate from `from` to `to` over `duration`
    pub fn new(from: u64, to: u64, duration: Duration) -> Self {
        Self { from, to, duration }
    }

    /// Animate from zero to `to` over the default duration
    pub fn to(to: u64) -> Self {
        Self::new(0, to, Self::DEFAULT_DURATION)
    }

    /// Target value
    pub fn target(&self) -> u64 {
        self.to
    }

    /// Whether the animation has reached its target at `elapsed`
    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Displayed value at `elapsed`, on an ease-out cubic curve
    pub fn value_at(&self, elapsed: Duration) -> u64 {
        if self.is_finished(elapsed) {
            return self.to;
        }

        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(3);
        let (from, to) = (self.from as f64, self.to as f64);
        let value = (from + (to - from) * eased).round();

        // Float rounding must never overshoot either end
        let (low, high) = (self.from.min(self.to), self.from.max(self.to));
        (value as u64).clamp(low, high)
    }

    /// Values to display at every `step` until the animation ends
    ///
    /// The last value is always the target. A zero `step` yields only the target.
    pub fn frames(&self, step: Duration) -> Vec<u64> {
        if step.is_zero() {
            return vec![self.to];
        }
        let mut frames = Vec::new();
        let mut elapsed = Duration::ZERO;
        while !self.is_finished(elapsed) {
            frames.push(self.value_at(elapsed));
            elapsed += step;
        }
        frames.push(self.to);
        frames
    }
}
