//! Transient notifications, the toasts shown after an operation.

use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    shown_at: Instant,
}

impl Notification {
    fn expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= ttl
    }
}

#[derive(Debug)]
pub struct Notifications {
    items: Vec<Notification>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        let message = message.into();
        match level {
            Level::Success => tracing::debug!(%message, "notify"),
            Level::Error => tracing::warn!(%message, "notify"),
        }
        self.items.push(Notification {
            level,
            message,
            shown_at: Instant::now(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Drops expired entries and returns the ones still on screen.
    pub fn active(&mut self) -> &[Notification] {
        let now = Instant::now();
        let ttl = self.ttl;
        self.items.retain(|n| !n.expired(ttl, now));
        &self.items
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }
}
