//! Timeline refresh loop for the widget surface.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::metrics::SharedMetrics;
use crate::reload::NotifyReload;
use crate::timeline::{RegenerationReason, Timeline, TimelineGenerator};

/// Regenerates the timeline when it expires or when a reload is signalled.
pub struct TimelineScheduler {
    generator: TimelineGenerator,
    reload: Arc<NotifyReload>,
    metrics: SharedMetrics,
}

impl TimelineScheduler {
    pub fn new(generator: TimelineGenerator, reload: Arc<NotifyReload>, metrics: SharedMetrics) -> Self {
        Self {
            generator,
            reload,
            metrics,
        }
    }

    /// Run until `shutdown` resolves, handing every timeline to `publish`.
    pub async fn run<F, S>(&self, mut publish: F, shutdown: S)
    where
        F: FnMut(&Timeline),
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut reason = RegenerationReason::Initial;

        loop {
            let now = Utc::now();
            let timeline = self.generator.timeline(now, reason);
            self.metrics.timeline_regenerated();
            debug!(?reason, next_refresh = %timeline.next_refresh, "Timeline generated");
            publish(&timeline);

            let wait = (timeline.next_refresh - now)
                .to_std()
                .unwrap_or(self.generator.interval());

            reason = tokio::select! {
                _ = &mut shutdown => {
                    info!("Timeline scheduler stopping");
                    return;
                }
                _ = tokio::time::sleep(wait) => RegenerationReason::Scheduled,
                _ = self.reload.notified() => RegenerationReason::Signalled,
            };
        }
    }
}
