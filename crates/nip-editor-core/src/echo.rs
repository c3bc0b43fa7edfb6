//! Suppression of value updates caused by the editor's own edits.
//!
//! When the editor reports a change, the owner of the value usually hands the
//! same value straight back. Re-parsing it would throw away the live selection,
//! so for a short window after each edit incoming values are ignored.

use std::time::Duration;

use web_time::Instant;

/// Default suppression window after a self-caused edit.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(50);

/// A self-caused-edit flag that clears itself after a deadline.
///
/// Marking again replaces the deadline, so the most recent edit wins.
#[derive(Debug, Clone, Copy)]
pub struct EchoGuard {
    window: Duration,
    until: Option<Instant>,
}

impl Default for EchoGuard {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_WINDOW)
    }
}

impl EchoGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            until: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Mark an edit made at `now`.
    pub fn mark_at(&mut self, now: Instant) {
        self.until = Some(now + self.window);
    }

    pub fn mark(&mut self) {
        self.mark_at(Instant::now());
    }

    /// True while an edit marked before `now` is still within its window.
    pub fn is_active_at(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Instant::now())
    }

    pub fn clear(&mut self) {
        self.until = None;
    }
}
