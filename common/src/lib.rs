//! WidgetFX Common Types
//!
//! This crate contains the records shared between the foreground app and the
//! widget surface: currency codes, rate tables, conversion snapshots, chart
//! series and amount presets.

pub mod monetary;
pub mod series;
pub mod presets;
pub mod catalog;
pub mod error;
pub mod time;

pub use monetary::*;
pub use series::*;
pub use presets::*;
pub use error::*;
pub use time::*;
