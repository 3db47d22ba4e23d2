//! Historical series providers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use widgetfx_common::{CurrencyCode, DateWindow, RatePoint};

use crate::error::{FxError, FxResult};
use crate::provider::{fetch_json, HOST_DATE_FORMAT};

/// Trait for historical-series providers.
#[async_trait]
pub trait TrendProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily `base`→`target` values inside `window`, ascending by date.
    async fn fetch_series(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        window: DateWindow,
    ) -> FxResult<Vec<RatePoint>>;
}

#[derive(Debug, Deserialize)]
struct HostTimeseriesResponse {
    success: bool,
    #[serde(default)]
    rates: HashMap<String, HashMap<String, Decimal>>,
}

/// `GET {base_url}/timeseries?base&symbols&start_date&end_date`.
pub struct HostTimeseriesProvider {
    client: Client,
    base_url: String,
}

impl HostTimeseriesProvider {
    pub const NAME: &'static str = "exchangerate.host/timeseries";

    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TrendProvider for HostTimeseriesProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_series(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        window: DateWindow,
    ) -> FxResult<Vec<RatePoint>> {
        let request = self.client.get(format!("{}/timeseries", self.base_url)).query(&[
            ("base", base.code().to_string()),
            ("symbols", target.code().to_string()),
            ("start_date", window.start.format(HOST_DATE_FORMAT).to_string()),
            ("end_date", window.end.format(HOST_DATE_FORMAT).to_string()),
        ]);

        let decoded: HostTimeseriesResponse = fetch_json(Self::NAME, request).await?;
        if !decoded.success {
            return Err(FxError::provider(Self::NAME, "success flag is false"));
        }

        let mut points: Vec<RatePoint> = decoded
            .rates
            .into_iter()
            .filter_map(|(day, quotes)| {
                let date = NaiveDate::parse_from_str(&day, HOST_DATE_FORMAT).ok()?;
                let value = quotes.get(target.code()).copied()?;
                Some(RatePoint::new(date, value))
            })
            .collect();
        points.sort_by_key(|p| p.date);

        Ok(points)
    }
}

/// Mock trend provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockTrendProvider {
    series: Option<Vec<RatePoint>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTrendProvider {
    /// A provider that always returns `series`.
    pub fn with_series(series: Vec<RatePoint>) -> Self {
        Self { series: Some(series) }
    }

    /// A provider that always fails.
    pub fn failing() -> Self {
        Self { series: None }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl TrendProvider for MockTrendProvider {
    fn name(&self) -> &str {
        "mock-trend"
    }

    async fn fetch_series(
        &self,
        _base: &CurrencyCode,
        _target: &CurrencyCode,
        _window: DateWindow,
    ) -> FxResult<Vec<RatePoint>> {
        self.series
            .clone()
            .ok_or_else(|| FxError::provider("mock-trend", "configured to fail"))
    }
}
