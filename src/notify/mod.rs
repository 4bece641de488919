//! Transient user feedback.
//!
//! Every outcome of the capture workflow, good or bad, ends up here as a
//! banner that disappears on its own after a few seconds.

mod presenter;

pub use presenter::{
    Notification, NotificationId, NotificationPresenter, Severity, DEFAULT_DISPLAY_TIME,
};
