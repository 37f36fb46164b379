//! User-facing notifications
//!
//! Every failure the browser recovers from ends up here as a short,
//! time-limited message. Hosts pick the sink:
//!
//! - **`NotificationCenter`**: buffered, expiring and dismissible messages
//!   for a status bar or toast area
//! - **`StderrNotifier`**: coloured terminal output

use crate::config::BrowserConfig;
use colored::Colorize;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Default lifetime of a notification
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Most notifications kept before the oldest are dropped
const MAX_NOTIFICATIONS: usize = 100;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for user-facing messages
pub trait Notifier {
    fn notify(&self, level: Level, message: &str);

    /// Drop every message currently shown
    fn clear(&self);

    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(Level::Success, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// A message with its creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub text: String,
    pub created_at: Instant,
}

impl Notification {
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.created_at) >= ttl
    }
}

#[derive(Debug, Default)]
struct Inbox {
    next_id: u64,
    items: Vec<Notification>,
}

/// Buffered notifications with TTL expiry and manual dismissal
///
/// # Examples
///
/// ```
/// use roster::notify::{Level, NotificationCenter, Notifier};
///
/// let center = NotificationCenter::new();
/// center.error("Could not load partners");
///
/// let shown = center.active();
/// assert_eq!(shown[0].level, Level::Error);
/// center.dismiss(shown[0].id);
/// assert!(center.active().is_empty());
/// ```
#[derive(Debug)]
pub struct NotificationCenter {
    inbox: Mutex<Inbox>,
    ttl: Duration,
}

impl NotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Center using the configured notification lifetime
    #[must_use]
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::with_ttl(config.notification_ttl())
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inbox: Mutex::new(Inbox::default()),
            ttl,
        }
    }

    /// Notifications still within their TTL, oldest first
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    #[must_use]
    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        self.inbox
            .lock()
            .items
            .iter()
            .filter(|n| !n.is_expired(self.ttl, now))
            .cloned()
            .collect()
    }

    /// Most recent live notification
    #[must_use]
    pub fn latest(&self) -> Option<Notification> {
        let now = Instant::now();
        self.inbox
            .lock()
            .items
            .iter()
            .rev()
            .find(|n| !n.is_expired(self.ttl, now))
            .cloned()
    }

    /// Live notifications of a given level
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.active().iter().filter(|n| n.level == level).count()
    }

    /// Remove one notification; returns whether it existed
    pub fn dismiss(&self, id: u64) -> bool {
        let mut inbox = self.inbox.lock();
        let before = inbox.items.len();
        inbox.items.retain(|n| n.id != id);
        inbox.items.len() != before
    }

    /// Forget expired notifications
    pub fn prune(&self, now: Instant) {
        let ttl = self.ttl;
        self.inbox.lock().items.retain(|n| !n.is_expired(ttl, now));
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, level: Level, message: &str) {
        let mut inbox = self.inbox.lock();
        inbox.next_id += 1;
        let id = inbox.next_id;
        inbox.items.push(Notification {
            id,
            level,
            text: message.to_string(),
            created_at: Instant::now(),
        });

        if inbox.items.len() > MAX_NOTIFICATIONS {
            inbox.items.drain(0..MAX_NOTIFICATIONS / 2);
        }
    }

    fn clear(&self) {
        self.inbox.lock().items.clear();
    }
}

/// Writes notifications to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Info => eprintln!("{}", message.dimmed()),
            Level::Success => eprintln!("{} {}", "✓".green(), message),
            Level::Warning => eprintln!("{} {}", "⚠️".yellow(), message),
            Level::Error => eprintln!("{} {}", "❌".red(), message),
        }
    }

    fn clear(&self) {}
}
