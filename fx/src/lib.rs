//! WidgetFX rate engine
//!
//! Upstream rate access, conversion and amount editing for the converter
//! and its widget.
//!
//! # Features
//!
//! - Ordered fallback across current-rate providers
//! - History fetch with a synthetic placeholder when history is unavailable
//! - Pure conversion of amount text against a rate table
//! - Keypad reducer for out-of-band amount edits
//!
//! # Example
//!
//! ```rust,ignore
//! use widgetfx_fx::{RateGateway, GatewayEndpoints, compute_conversion};
//! use widgetfx_common::CurrencyCode;
//!
//! let gateway = RateGateway::http(reqwest::Client::new(), &GatewayEndpoints::default());
//! let table = gateway.fetch_rates(&CurrencyCode::usd(), &[CurrencyCode::eur()]).await?;
//! let snapshot = compute_conversion("100", &table, &CurrencyCode::eur());
//! ```

pub mod gateway;
pub mod provider;
pub mod trend;
pub mod conversion;
pub mod keypad;
pub mod error;

pub use gateway::{GatewayEndpoints, RateGateway};
pub use provider::{FallbackRateProvider, HostLatestProvider, OpenErProvider, RateProvider};
pub use trend::{HostTimeseriesProvider, TrendProvider};
pub use conversion::{compute_conversion, compute_conversion_at, parse_amount, recompute_amount};
pub use keypad::{apply_keypad_edit, sanitize_amount_text, KeypadButton, AMOUNT_TEXT_MAX_LEN};
pub use error::{FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use trend::MockTrendProvider;
