//! WidgetFX Refresh
//!
//! Drives the converter's shared state: the foreground session that fetches
//! rates and persists snapshots, out-of-band keypad edits from the widget,
//! and the timeline scheduler that rebuilds the widget view on expiry or
//! on a reload signal.

pub mod config;
pub mod foreground;
pub mod keypad;
pub mod metrics;
pub mod reload;
pub mod scheduler;
pub mod timeline;

pub use config::{ProviderConfig, RefreshConfig};
pub use foreground::{ForegroundSession, RATE_UNAVAILABLE};
pub use keypad::KeypadMutation;
pub use metrics::{Metrics, MetricsSnapshot, SharedMetrics};
pub use reload::{NotifyReload, ReloadSignal};
pub use scheduler::TimelineScheduler;
pub use timeline::{
    conversion_rows, ConversionRow, DisplayState, RegenerationReason, Timeline, TimelineEntry,
    TimelineGenerator,
};
