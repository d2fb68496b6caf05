//! User-facing notices
//!
//! The host application owns the notification surface. The plugin only
//! talks to it through [`Notifier`].

use tracing::{info, warn};

/// A notice that stays visible and can be updated, e.g. download progress
pub trait ProgressNotice: Send {
    /// Replace the displayed message
    fn set_message(&mut self, message: &str);

    /// Remove the notice
    fn hide(self: Box<Self>);
}

/// Host notification surface
pub trait Notifier: Send + Sync {
    /// Show a one-shot notice
    fn notice(&self, message: &str);

    /// Show a persistent notice that the caller updates and hides
    fn progress(&self, message: &str) -> Box<dyn ProgressNotice>;
}

/// Notifier that only writes to the log
///
/// Used when the host has no notification surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

struct LogProgress;

impl ProgressNotice for LogProgress {
    fn set_message(&mut self, message: &str) {
        info!("{}", message);
    }

    fn hide(self: Box<Self>) {}
}

impl Notifier for LogNotifier {
    fn notice(&self, message: &str) {
        warn!("Notice: {}", message);
    }

    fn progress(&self, message: &str) -> Box<dyn ProgressNotice> {
        info!("{}", message);
        Box::new(LogProgress)
    }
}
