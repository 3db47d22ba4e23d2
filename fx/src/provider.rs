//! Rate provider traits and implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use widgetfx_common::{CurrencyCode, RateTable};

use crate::error::{FxError, FxResult};

/// Date format used by the exchangerate.host family of endpoints.
pub(crate) const HOST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Trait for current-rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch rates for `symbols` quoted against `base`.
    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> FxResult<RateTable>;
}

/// Send a GET and decode a JSON body. Anything but `200 OK` is a failure.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> FxResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| FxError::provider(provider, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FxError::provider(provider, format!("HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FxError::provider(provider, format!("decode failed: {e}")))
}

fn join_symbols(symbols: &[CurrencyCode]) -> String {
    symbols
        .iter()
        .map(CurrencyCode::code)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Deserialize)]
struct HostLatestResponse {
    #[serde(default)]
    success: Option<bool>,
    base: String,
    date: String,
    rates: HashMap<String, Decimal>,
}

/// Primary provider: `GET {base_url}/latest?base=..&symbols=..`.
pub struct HostLatestProvider {
    client: Client,
    base_url: String,
}

impl HostLatestProvider {
    pub const NAME: &'static str = "exchangerate.host";

    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RateProvider for HostLatestProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> FxResult<RateTable> {
        let request = self
            .client
            .get(format!("{}/latest", self.base_url))
            .query(&[("base", base.code().to_string()), ("symbols", join_symbols(symbols))]);

        let decoded: HostLatestResponse = fetch_json(Self::NAME, request).await?;
        if decoded.success == Some(false) {
            return Err(FxError::provider(Self::NAME, "success flag is false"));
        }

        let base = CurrencyCode::parse(&decoded.base).map_err(|e| FxError::provider(Self::NAME, e))?;
        let as_of = NaiveDate::parse_from_str(&decoded.date, HOST_DATE_FORMAT)
            .map_err(|e| FxError::provider(Self::NAME, format!("bad date {:?}: {e}", decoded.date)))?
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| FxError::provider(Self::NAME, "bad date"))?;

        Ok(RateTable::from_raw(base, as_of, decoded.rates, symbols))
    }
}

#[derive(Debug, Deserialize)]
struct OpenErResponse {
    #[serde(default)]
    result: Option<String>,
    base_code: String,
    time_last_update_unix: i64,
    rates: HashMap<String, Decimal>,
}

/// Secondary provider: `GET {base_url}/v6/latest/{BASE}`, returns every
/// currency it knows about.
pub struct OpenErProvider {
    client: Client,
    base_url: String,
}

impl OpenErProvider {
    pub const NAME: &'static str = "open.er-api.com";

    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RateProvider for OpenErProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> FxResult<RateTable> {
        let request = self
            .client
            .get(format!("{}/v6/latest/{}", self.base_url, base.code()));

        let decoded: OpenErResponse = fetch_json(Self::NAME, request).await?;
        if let Some(result) = decoded.result.as_deref() {
            if result != "success" {
                return Err(FxError::provider(Self::NAME, format!("result {result:?}")));
            }
        }

        let base = CurrencyCode::parse(&decoded.base_code).map_err(|e| FxError::provider(Self::NAME, e))?;
        let as_of = DateTime::<Utc>::from_timestamp(decoded.time_last_update_unix, 0)
            .ok_or_else(|| FxError::provider(Self::NAME, "bad update timestamp"))?;

        Ok(RateTable::from_raw(base, as_of, decoded.rates, symbols))
    }
}

/// Tries providers strictly in order and returns the first success.
pub struct FallbackRateProvider {
    providers: Vec<Arc<dyn RateProvider>>,
}

impl FallbackRateProvider {
    /// Create a chain; earlier providers are preferred.
    pub fn new(providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl RateProvider for FallbackRateProvider {
    fn name(&self) -> &str {
        "FALLBACK"
    }

    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> FxResult<RateTable> {
        for provider in &self.providers {
            match provider.fetch_rates(base, symbols).await {
                Ok(table) => {
                    debug!(
                        provider = provider.name(),
                        base = %base,
                        quotes = table.len(),
                        "Got rates from provider"
                    );
                    if symbols.is_empty() {
                        return Ok(table);
                    }
                    return Ok(table.retain_symbols(symbols));
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        base = %base,
                        error = %e,
                        "Provider failed to return rates"
                    );
                }
            }
        }

        Err(FxError::RatesUnavailable { base: base.clone() })
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    tables: dashmap::DashMap<CurrencyCode, RateTable>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider that knows no bases.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Serve `table` for its base currency.
    pub fn set_table(&self, table: RateTable) {
        self.tables.insert(table.base.clone(), table);
    }

    /// Forget every table so that all calls fail.
    pub fn clear(&self) {
        self.tables.clear();
    }

    /// Number of fetches attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> FxResult<RateTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let table = self
            .tables
            .get(base)
            .map(|t| t.clone())
            .ok_or_else(|| FxError::provider(&self.name, "no table"))?;
        Ok(RateTable::from_raw(
            table.base,
            table.as_of,
            table.rates.into_iter().map(|(c, r)| (c.code().to_string(), r)),
            symbols,
        ))
    }
}
