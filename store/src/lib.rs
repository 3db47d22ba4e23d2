//! WidgetFX Shared Snapshot Store
//!
//! Persists the three records the foreground app and the widget exchange:
//! latest rates, latest conversion snapshot, and amount presets. Each record
//! lives under its own key and is replaced wholesale, so a reader sees
//! either the previous value or the new one.

pub mod backend;
pub mod shared;
pub mod error;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use shared::{keys, SharedStore};
pub use error::{StoreError, StoreResult};
