//! Signalling the widget surface to rebuild its timeline.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;
use tracing::debug;

/// Asks the display surface to regenerate now instead of at its next tick.
pub trait ReloadSignal: Send + Sync {
    fn reload_timelines(&self);
}

/// In-process signal backed by [`Notify`].
///
/// A signal raised while nobody is waiting is kept, so an edit that lands
/// between two scheduler waits still triggers one regeneration.
#[derive(Debug, Default)]
pub struct NotifyReload {
    notify: Notify,
    raised: AtomicU64,
}

impl NotifyReload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the next signal.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Signals raised so far.
    pub fn raised(&self) -> u64 {
        self.raised.load(Ordering::Relaxed)
    }
}

impl ReloadSignal for NotifyReload {
    fn reload_timelines(&self) {
        self.raised.fetch_add(1, Ordering::Relaxed);
        debug!("Timeline reload requested");
        self.notify.notify_one();
    }
}
