//! Auto-expiring notification banners.

use std::time::Duration;

use tokio::time::Instant;

/// How long a banner stays up unless dismissed.
pub const DEFAULT_DISPLAY_TIME: Duration = Duration::from_secs(5);

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Succeeded with a caveat.
    Warning,
    /// Neutral information.
    Info,
}

impl Severity {
    /// Alert style class for HTML renderers.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::Success => "alert-success",
            Severity::Error => "alert-danger",
            Severity::Warning => "alert-warning",
            Severity::Info => "alert-info",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Success => "SUCCESS",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// Identifies a banner for dismissal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

/// A banner on screen.
#[derive(Debug, Clone)]
pub struct Notification {
    id: NotificationId,
    message: String,
    severity: Severity,
    shown_at: Instant,
    expires_at: Instant,
}

impl Notification {
    /// Identifier for [`dismiss`](NotificationPresenter::dismiss).
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Banner text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Banner style.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// When the banner was shown.
    pub fn shown_at(&self) -> Instant {
        self.shown_at
    }

    /// Returns true once the display time has elapsed at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Single-line text rendering, e.g. `[ERROR] Network error: ...`.
    pub fn render_banner(&self) -> String {
        format!("[{}] {}", self.severity.label(), self.message)
    }
}

/// Holds the banners currently on screen.
///
/// Showing a banner is purely additive; expired banners are dropped by
/// [`prune_expired`](Self::prune_expired) and are never returned by
/// [`active`](Self::active).
#[derive(Debug)]
pub struct NotificationPresenter {
    display_time: Duration,
    next_id: u64,
    banners: Vec<Notification>,
}

impl Default for NotificationPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_TIME)
    }
}

impl NotificationPresenter {
    /// Creates a presenter whose banners last `display_time`.
    pub fn new(display_time: Duration) -> Self {
        Self {
            display_time,
            next_id: 0,
            banners: Vec::new(),
        }
    }

    /// Adds a dismissible banner that expires after the display time.
    pub fn show_notification(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::warn!(%message, "Notification"),
            Severity::Warning => tracing::warn!(%message, "Notification"),
            Severity::Success | Severity::Info => tracing::info!(%message, "Notification"),
        }

        self.prune_expired();

        let shown_at = Instant::now();
        self.next_id += 1;
        self.banners.push(Notification {
            id: NotificationId(self.next_id),
            message,
            severity,
            shown_at,
            expires_at: shown_at + self.display_time,
        });
    }

    /// Removes a banner early. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.banners.len();
        self.banners.retain(|banner| banner.id != id);
        self.banners.len() != before
    }

    /// Banners still visible, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        let now = Instant::now();
        self.banners
            .iter()
            .filter(move |banner| !banner.is_expired_at(now))
    }

    /// Most recently shown banner that is still visible.
    pub fn latest(&self) -> Option<&Notification> {
        self.active().last()
    }

    /// Drops expired banners and returns how many were removed.
    pub fn prune_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.banners.len();
        self.banners.retain(|banner| !banner.is_expired_at(now));
        before - self.banners.len()
    }

    /// How long banners stay visible.
    pub fn display_time(&self) -> Duration {
        self.display_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_banner_expires_after_display_time() {
        let mut presenter = NotificationPresenter::default();
        presenter.show_notification("Face registered successfully!", Severity::Success);
        assert_eq!(presenter.active().count(), 1);

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert_eq!(presenter.active().count(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(presenter.active().count(), 0);
        assert_eq!(presenter.prune_expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_banners_are_additive() {
        let mut presenter = NotificationPresenter::default();
        presenter.show_notification("first", Severity::Info);
        tokio::time::advance(Duration::from_secs(2)).await;
        presenter.show_notification("second", Severity::Error);

        let messages: Vec<_> = presenter.active().map(Notification::message).collect();
        assert_eq!(messages, vec!["first", "second"]);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(presenter.latest().map(Notification::message), Some("second"));
        assert_eq!(presenter.active().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss() {
        let mut presenter = NotificationPresenter::default();
        presenter.show_notification("gone soon", Severity::Warning);
        let id = presenter.latest().unwrap().id();

        assert!(presenter.dismiss(id));
        assert!(!presenter.dismiss(id));
        assert!(presenter.latest().is_none());
    }

    #[test]
    fn test_render_banner() {
        let mut presenter = NotificationPresenter::new(Duration::from_secs(60));
        presenter.show_notification("Network error: timed out", Severity::Error);
        let banner = presenter.latest().unwrap();
        assert_eq!(banner.render_banner(), "[ERROR] Network error: timed out");
        assert_eq!(banner.severity().css_class(), "alert-danger");
    }
}
