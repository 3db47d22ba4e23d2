//! Rate Source Gateway: current rates with ordered fallback, and history
//! with a synthetic terminal fallback.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use widgetfx_common::{CurrencyCode, DateWindow, RatePoint, RateTable, Timestamp};

use crate::error::{FxError, FxResult};
use crate::provider::{FallbackRateProvider, HostLatestProvider, OpenErProvider, RateProvider};
use crate::trend::{HostTimeseriesProvider, TrendProvider};

/// Upstream endpoint roots.
#[derive(Debug, Clone)]
pub struct GatewayEndpoints {
    pub primary_url: String,
    pub secondary_url: String,
    pub timeseries_url: String,
}

impl Default for GatewayEndpoints {
    fn default() -> Self {
        Self {
            primary_url: "https://api.exchangerate.host".to_string(),
            secondary_url: "https://open.er-api.com".to_string(),
            timeseries_url: "https://api.exchangerate.host".to_string(),
        }
    }
}

/// Entry point for all upstream rate data.
pub struct RateGateway {
    rates: FallbackRateProvider,
    trend: Arc<dyn TrendProvider>,
}

impl RateGateway {
    /// Create a gateway over an explicit provider chain.
    pub fn new(rate_providers: Vec<Arc<dyn RateProvider>>, trend: Arc<dyn TrendProvider>) -> Self {
        Self {
            rates: FallbackRateProvider::new(rate_providers),
            trend,
        }
    }

    /// The standard chain: exchangerate.host, then open.er-api.com.
    pub fn http(client: Client, endpoints: &GatewayEndpoints) -> Self {
        Self::new(
            vec![
                Arc::new(HostLatestProvider::new(client.clone(), &endpoints.primary_url)),
                Arc::new(OpenErProvider::new(client.clone(), &endpoints.secondary_url)),
            ],
            Arc::new(HostTimeseriesProvider::new(client, &endpoints.timeseries_url)),
        )
    }

    /// Fetch current rates, trying each provider in turn.
    ///
    /// Fails only with [`FxError::RatesUnavailable`]; callers fall back to
    /// their cached table.
    #[instrument(skip(self, symbols), fields(base = %base, symbols = symbols.len()))]
    pub async fn fetch_rates(
        &self,
        base: &CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> FxResult<RateTable> {
        let table = self.rates.fetch_rates(base, symbols).await?;
        info!(as_of = %table.as_of, quotes = table.len(), "Rates refreshed");
        Ok(table)
    }

    /// History for the `days` days ending yesterday, seeded at 1.0 if a
    /// placeholder has to be substituted.
    pub async fn fetch_trend(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        days: u32,
    ) -> FxResult<Vec<RatePoint>> {
        self.fetch_trend_seeded(base, target, days, None).await
    }

    /// Like [`Self::fetch_trend`], seeding any placeholder from `last_rate`.
    ///
    /// The only error is [`FxError::DateRangeError`]; provider failure is
    /// absorbed into a placeholder series.
    pub async fn fetch_trend_seeded(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        days: u32,
        last_rate: Option<Decimal>,
    ) -> FxResult<Vec<RatePoint>> {
        self.fetch_trend_at(Utc::now(), base, target, days, last_rate)
            .await
    }

    #[instrument(skip(self, now, last_rate), fields(base = %base, target = %target))]
    async fn fetch_trend_at(
        &self,
        now: Timestamp,
        base: &CurrencyCode,
        target: &CurrencyCode,
        days: u32,
        last_rate: Option<Decimal>,
    ) -> FxResult<Vec<RatePoint>> {
        let window = DateWindow::ending_before(now, days).ok_or_else(|| {
            FxError::DateRangeError(format!("{days} days before {}", now.date_naive()))
        })?;

        match self.trend.fetch_series(base, target, window).await {
            Ok(series) => {
                debug!(provider = self.trend.name(), points = series.len(), "Got history");
                Ok(series)
            }
            Err(e) => {
                warn!(
                    provider = self.trend.name(),
                    error = %e,
                    "History unavailable, substituting placeholder series"
                );
                let seed = last_rate.unwrap_or(Decimal::ONE);
                Ok(RatePoint::placeholder_series(seed, days, window.end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;
    use crate::trend::MockTrendProvider;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_with(trend: MockTrendProvider) -> RateGateway {
        RateGateway::new(vec![Arc::new(MockRateProvider::new("empty"))], Arc::new(trend))
    }

    #[tokio::test]
    async fn test_trend_placeholder_on_failure() {
        let gateway = gateway_with(MockTrendProvider::failing());

        let series = gateway
            .fetch_trend(&CurrencyCode::usd(), &CurrencyCode::eur(), 7)
            .await
            .unwrap();

        assert_eq!(series.len(), 7);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert!(series.iter().all(|p| p.value > dec!(0.01)));
        assert_eq!(series.last().unwrap().date, Utc::now().date_naive().pred_opt().unwrap());
    }

    #[tokio::test]
    async fn test_trend_placeholder_seeded_from_last_rate() {
        let gateway = gateway_with(MockTrendProvider::failing());

        let series = gateway
            .fetch_trend_seeded(&CurrencyCode::usd(), &CurrencyCode::eur(), 7, Some(dec!(150)))
            .await
            .unwrap();

        assert!(series.iter().all(|p| p.value >= dec!(149.4) && p.value <= dec!(150.6)));
    }

    #[tokio::test]
    async fn test_trend_real_series_passthrough() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        let gateway = gateway_with(MockTrendProvider::with_series(vec![RatePoint::new(day, dec!(0.9))]));

        let series = gateway
            .fetch_trend(&CurrencyCode::usd(), &CurrencyCode::eur(), 7)
            .await
            .unwrap();

        assert_eq!(series, vec![RatePoint::new(day, dec!(0.9))]);
    }

    #[tokio::test]
    async fn test_trend_date_range_error() {
        let gateway = gateway_with(MockTrendProvider::failing());
        let now = Utc.with_ymd_and_hms(2025, 11, 9, 0, 0, 0).unwrap();

        let result = gateway
            .fetch_trend_at(now, &CurrencyCode::usd(), &CurrencyCode::eur(), u32::MAX, None)
            .await;

        assert!(matches!(result, Err(FxError::DateRangeError(_))));
    }

    #[tokio::test]
    async fn test_rates_unavailable() {
        let gateway = gateway_with(MockTrendProvider::failing());

        let result = gateway.fetch_rates(&CurrencyCode::usd(), &[CurrencyCode::eur()]).await;

        assert!(matches!(result, Err(FxError::RatesUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_http_gateway_timeseries_success_false_yields_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/timeseries"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})),
            )
            .mount(&server)
            .await;

        let endpoints = GatewayEndpoints {
            primary_url: server.uri(),
            secondary_url: server.uri(),
            timeseries_url: server.uri(),
        };
        let gateway = RateGateway::http(Client::new(), &endpoints);

        let series = gateway
            .fetch_trend(&CurrencyCode::usd(), &CurrencyCode::eur(), 7)
            .await
            .unwrap();

        assert_eq!(series.len(), 7);
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert!(series.iter().all(|p| p.value > dec!(0.01)));
    }

    #[tokio::test]
    async fn test_http_gateway_falls_back_to_secondary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "base_code": "USD",
                "time_last_update_unix": 1_762_560_000,
                "rates": {"EUR": 0.9, "GBP": 0.8, "SEK": 10.5}
            })))
            .mount(&server)
            .await;

        let endpoints = GatewayEndpoints {
            primary_url: server.uri(),
            secondary_url: server.uri(),
            timeseries_url: server.uri(),
        };
        let gateway = RateGateway::http(Client::new(), &endpoints);

        let table = gateway
            .fetch_rates(&CurrencyCode::usd(), &[CurrencyCode::eur(), CurrencyCode::gbp()])
            .await
            .unwrap();

        let mut expected = BTreeMap::new();
        expected.insert(CurrencyCode::eur(), dec!(0.9));
        expected.insert(CurrencyCode::gbp(), dec!(0.8));
        assert_eq!(table.base, CurrencyCode::usd());
        assert_eq!(table.rates, expected);
    }
}
