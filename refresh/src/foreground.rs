//! Foreground converter session.
//!
//! Owns the user's current base/target/amount, pulls rates and history
//! through the gateway, and writes the resulting snapshot to the shared
//! store for the widget. Every failure has a non-fatal fallback: a failed
//! rate fetch reuses the cached table when its base matches, and a failed
//! history fetch is replaced by a placeholder series.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use widgetfx_common::catalog;
use widgetfx_common::{
    ConversionSnapshot, CurrencyCode, Preset, PresetList, RatePoint, RateTable, Timestamp,
};
use widgetfx_fx::{
    compute_conversion_at, sanitize_amount_text, FxError, FxResult, RateGateway,
    AMOUNT_TEXT_MAX_LEN,
};
use widgetfx_store::{SharedStore, StoreResult};

use crate::metrics::SharedMetrics;
use crate::reload::ReloadSignal;

/// Text shown when no rate exists for the current pair.
pub const RATE_UNAVAILABLE: &str = "Rate unavailable";

/// Foreground state mirrored into the shared store.
pub struct ForegroundSession {
    gateway: Arc<RateGateway>,
    store: SharedStore,
    reload: Arc<dyn ReloadSignal>,
    metrics: SharedMetrics,
    symbols: Vec<CurrencyCode>,
    trend_days: u32,

    base: CurrencyCode,
    target: CurrencyCode,
    amount_text: String,
    latest_rates: Option<RateTable>,
    /// Timestamp stamped on snapshots computed from `latest_rates`.
    rates_timestamp: Option<Timestamp>,
    converted: Option<Decimal>,
    chart_series: Vec<RatePoint>,
    notice: Option<String>,
    presets: PresetList,
}

impl ForegroundSession {
    /// Restore a session from whatever the store holds.
    pub fn new(
        gateway: Arc<RateGateway>,
        store: SharedStore,
        reload: Arc<dyn ReloadSignal>,
        metrics: SharedMetrics,
        trend_days: u32,
    ) -> Self {
        let mut session = Self {
            gateway,
            reload,
            metrics,
            symbols: catalog::extended_codes(),
            trend_days,
            base: CurrencyCode::usd(),
            target: CurrencyCode::eur(),
            amount_text: "100".to_string(),
            latest_rates: None,
            rates_timestamp: None,
            converted: None,
            chart_series: Vec::new(),
            notice: None,
            presets: store.load_presets(),
            store,
        };

        if let Some(cached) = session.store.load_rates() {
            session.base = cached.base.clone();
            session.rates_timestamp = Some(cached.as_of);
            session.latest_rates = Some(cached);
        }

        if let Some(snapshot) = session.store.load_snapshot() {
            session.base = snapshot.base_currency;
            session.target = snapshot.target_currency;
            session.amount_text = snapshot.amount_text;
            session.converted = Some(snapshot.converted_amount);
            session.chart_series = snapshot.chart_series;
        }

        session
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn target(&self) -> &CurrencyCode {
        &self.target
    }

    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    /// Converted amount, `None` when no rate is available.
    pub fn converted(&self) -> Option<Decimal> {
        self.converted
    }

    /// Stale-data notice from the last failed rate refresh.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn presets(&self) -> &PresetList {
        &self.presets
    }

    /// "1 USD = 0.9200 EUR", or [`RATE_UNAVAILABLE`].
    pub fn formatted_rate(&self) -> String {
        match self.current_rate() {
            Some(rate) => format!("1 {} = {:.4} {}", self.base, rate, self.target),
            None => RATE_UNAVAILABLE.to_string(),
        }
    }

    /// Converted amount to two places, or "--".
    pub fn formatted_result(&self) -> String {
        match self.converted {
            Some(value) => format!("{:.2}", value),
            None => "--".to_string(),
        }
    }

    /// View activation and pull-to-refresh: rates and history are fetched
    /// concurrently, then applied.
    #[instrument(skip(self), fields(base = %self.base, target = %self.target))]
    pub async fn activate(&mut self) {
        let seed = self.current_rate();
        let (rates, trend) = tokio::join!(
            self.gateway.fetch_rates(&self.base, &self.symbols),
            self.gateway
                .fetch_trend_seeded(&self.base, &self.target, self.trend_days, seed),
        );
        self.apply_rates(rates);
        self.apply_trend(trend);
    }

    /// Fetch rates only.
    pub async fn refresh_rates(&mut self) {
        let rates = self.gateway.fetch_rates(&self.base, &self.symbols).await;
        self.apply_rates(rates);
    }

    /// Fetch history only; persists the snapshot whatever the rate state.
    pub async fn refresh_trend(&mut self) {
        let trend = self
            .gateway
            .fetch_trend_seeded(&self.base, &self.target, self.trend_days, self.current_rate())
            .await;
        self.apply_trend(trend);
    }

    /// Set the pair without fetching; follow with [`Self::activate`].
    pub fn set_pair(&mut self, base: CurrencyCode, target: CurrencyCode) {
        self.base = base;
        self.target = target;
    }

    /// Change the base currency; triggers a full refresh.
    pub async fn select_base(&mut self, code: CurrencyCode) {
        if self.base == code {
            return;
        }
        self.base = code;
        self.activate().await;
    }

    /// Change the target currency; the table already quotes it, so only the
    /// conversion and history are refreshed.
    pub async fn select_target(&mut self, code: CurrencyCode) {
        if self.target == code {
            return;
        }
        self.target = code;
        self.update_conversion();
        self.refresh_trend().await;
    }

    /// Swap base and target, then refresh.
    pub async fn swap_currencies(&mut self) {
        std::mem::swap(&mut self.base, &mut self.target);
        self.activate().await;
    }

    /// Typed amount from the foreground field. A comma is read as the
    /// separator; the text is capped and sanitised before use.
    pub fn update_amount(&mut self, raw: &str) {
        let capped: String = raw
            .replace(',', ".")
            .chars()
            .take(AMOUNT_TEXT_MAX_LEN)
            .collect();
        self.amount_text = sanitize_amount_text(&capped);
        self.update_conversion();
    }

    /// Replace the preset list wholesale and tell the widget.
    pub fn update_presets(&mut self, presets: Vec<Preset>) -> StoreResult<()> {
        self.presets = PresetList::from_user(presets);
        self.store.save_presets(&self.presets)?;
        self.reload.reload_timelines();
        Ok(())
    }

    fn apply_rates(&mut self, result: FxResult<RateTable>) {
        match result {
            Ok(table) => {
                self.metrics.rate_refreshed();
                if let Err(e) = self.store.save_rates(&table) {
                    warn!(error = %e, "Failed to persist rates");
                }
                self.rates_timestamp = Some(Utc::now());
                self.latest_rates = Some(table);
                self.notice = None;
            }
            Err(e) => {
                self.notice = Some(stale_notice(&e));
                let cached = self
                    .store
                    .load_rates()
                    .filter(|cached| cached.base == self.base);
                self.metrics.rate_failed(cached.is_some());

                match cached {
                    Some(cached) => {
                        info!(as_of = %cached.as_of, "Using cached rates");
                        self.rates_timestamp = Some(cached.as_of);
                        self.latest_rates = Some(cached);
                    }
                    None => {
                        warn!(base = %self.base, "No cached rates for base");
                        if self.latest_rates.as_ref().is_some_and(|t| t.base != self.base) {
                            self.latest_rates = None;
                            self.rates_timestamp = None;
                        }
                    }
                }
            }
        }
        self.update_conversion();
    }

    fn apply_trend(&mut self, result: FxResult<Vec<RatePoint>>) {
        self.chart_series = match result {
            Ok(series) => series,
            Err(e) => {
                warn!(error = %e, "History window unavailable, using placeholder");
                RatePoint::placeholder_series(
                    self.current_rate().unwrap_or(Decimal::ONE),
                    self.trend_days,
                    Utc::now().date_naive(),
                )
            }
        };
        self.metrics.trend_refreshed();
        if let Some(snapshot) = self.current_snapshot() {
            self.persist(&snapshot);
        }
    }

    fn update_conversion(&mut self) {
        match self.current_snapshot() {
            Some(snapshot) => {
                self.converted = Some(snapshot.converted_amount);
                self.persist(&snapshot);
            }
            None => {
                if self.matching_rates().is_some() {
                    let e = FxError::NoRateForTarget {
                        base: self.base.clone(),
                        target: self.target.clone(),
                    };
                    debug!(error = %e, "Conversion skipped");
                }
                self.converted = None;
            }
        }
    }

    /// Rate table for the current base, if any.
    fn matching_rates(&self) -> Option<&RateTable> {
        self.latest_rates.as_ref().filter(|t| t.base == self.base)
    }

    fn current_rate(&self) -> Option<Decimal> {
        self.matching_rates()?.rate_for(&self.target)
    }

    fn current_snapshot(&self) -> Option<ConversionSnapshot> {
        let table = self.matching_rates()?;
        let timestamp = self.rates_timestamp.unwrap_or(table.as_of);
        compute_conversion_at(&self.amount_text, table, &self.target, timestamp)
            .map(|s| s.with_chart_series(self.chart_series.clone()))
    }

    fn persist(&self, snapshot: &ConversionSnapshot) {
        match self.store.save_snapshot(snapshot) {
            Ok(()) => {
                self.metrics.snapshot_persisted();
                self.reload.reload_timelines();
            }
            Err(e) => warn!(error = %e, "Failed to persist snapshot"),
        }
    }
}

fn stale_notice(error: &FxError) -> String {
    format!("Could not refresh rates: {error}. Showing cached data.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::reload::NotifyReload;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use widgetfx_fx::{MockRateProvider, MockTrendProvider};
    use widgetfx_store::MemoryBackend;

    struct Fixture {
        provider: Arc<MockRateProvider>,
        store: SharedStore,
        reload: Arc<NotifyReload>,
        metrics: SharedMetrics,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                provider: Arc::new(MockRateProvider::new("mock")),
                store: SharedStore::new(Arc::new(MemoryBackend::new())),
                reload: Arc::new(NotifyReload::new()),
                metrics: Arc::new(Metrics::new()),
            }
        }

        fn session(&self) -> ForegroundSession {
            let gateway = RateGateway::new(
                vec![self.provider.clone()],
                Arc::new(MockTrendProvider::failing()),
            );
            ForegroundSession::new(
                Arc::new(gateway),
                self.store.clone(),
                self.reload.clone(),
                self.metrics.clone(),
                7,
            )
        }
    }

    fn table(base: CurrencyCode, rates: &[(&str, Decimal)]) -> RateTable {
        let rates: BTreeMap<CurrencyCode, Decimal> = rates
            .iter()
            .map(|(c, r)| (CurrencyCode::parse(c).unwrap(), *r))
            .collect();
        RateTable::new(base, Utc::now(), rates)
    }

    #[tokio::test]
    async fn test_activate_persists_rates_and_snapshot() {
        let fixture = Fixture::new();
        fixture
            .provider
            .set_table(table(CurrencyCode::usd(), &[("EUR", dec!(0.9)), ("GBP", dec!(0.8))]));
        let mut session = fixture.session();

        session.activate().await;

        assert_eq!(session.converted(), Some(dec!(90)));
        assert!(session.notice().is_none());
        assert_eq!(fixture.store.load_rates().unwrap().len(), 2);

        let snapshot = fixture.store.load_snapshot().unwrap();
        assert_eq!(snapshot.converted_amount, dec!(90));
        assert_eq!(snapshot.chart_series.len(), 7);
        assert!(fixture.reload.raised() >= 1);
    }

    #[tokio::test]
    async fn test_failure_reuses_cached_table_for_same_base() {
        let fixture = Fixture::new();
        let cached = table(CurrencyCode::usd(), &[("EUR", dec!(0.5))]);
        fixture.store.save_rates(&cached).unwrap();
        let mut session = fixture.session();

        session.refresh_rates().await;

        assert!(session.notice().unwrap().contains("Showing cached data"));
        assert_eq!(session.converted(), Some(dec!(50)));
        let snapshot = fixture.store.load_snapshot().unwrap();
        assert_eq!(snapshot.timestamp, cached.as_of);
        assert_eq!(fixture.metrics.snapshot().cached_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_failure_without_matching_cache_shows_unavailable() {
        let fixture = Fixture::new();
        fixture
            .store
            .save_rates(&table(CurrencyCode::gbp(), &[("EUR", dec!(1.1))]))
            .unwrap();
        let mut session = fixture.session();
        session.select_base(CurrencyCode::usd()).await;

        assert!(session.notice().is_some());
        assert_eq!(session.converted(), None);
        assert_eq!(session.formatted_rate(), RATE_UNAVAILABLE);
        assert_eq!(session.formatted_result(), "--");
        assert!(fixture.store.load_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_missing_target_is_not_persisted() {
        let fixture = Fixture::new();
        fixture
            .provider
            .set_table(table(CurrencyCode::usd(), &[("GBP", dec!(0.8))]));
        let mut session = fixture.session();

        session.activate().await;

        assert_eq!(session.converted(), None);
        assert!(fixture.store.load_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_update_amount_sanitizes_and_recomputes() {
        let fixture = Fixture::new();
        fixture
            .provider
            .set_table(table(CurrencyCode::usd(), &[("EUR", dec!(0.9))]));
        let mut session = fixture.session();
        session.activate().await;

        session.update_amount("12,5.0");

        assert_eq!(session.amount_text(), "12.50");
        assert_eq!(session.converted(), Some(dec!(11.25)));
        assert_eq!(fixture.store.load_snapshot().unwrap().amount_text, "12.50");
        assert_eq!(session.formatted_rate(), "1 USD = 0.9000 EUR");
        assert_eq!(session.formatted_result(), "11.25");
    }

    #[tokio::test]
    async fn test_swap_currencies_refetches_for_new_base() {
        let fixture = Fixture::new();
        fixture
            .provider
            .set_table(table(CurrencyCode::usd(), &[("EUR", dec!(0.9))]));
        fixture
            .provider
            .set_table(table(CurrencyCode::eur(), &[("USD", dec!(1.1))]));
        let mut session = fixture.session();
        session.activate().await;

        session.swap_currencies().await;

        assert_eq!(session.base(), &CurrencyCode::eur());
        assert_eq!(session.target(), &CurrencyCode::usd());
        assert_eq!(session.converted(), Some(dec!(110)));
        assert_eq!(fixture.provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_session_restores_from_store() {
        let fixture = Fixture::new();
        fixture
            .provider
            .set_table(table(CurrencyCode::usd(), &[("GBP", dec!(0.8))]));
        {
            let mut session = fixture.session();
            session.select_target(CurrencyCode::gbp()).await;
            session.refresh_rates().await;
            session.update_amount("40");
        }

        let restored = fixture.session();

        assert_eq!(restored.target(), &CurrencyCode::gbp());
        assert_eq!(restored.amount_text(), "40");
        assert_eq!(restored.converted(), Some(dec!(32)));
    }

    #[tokio::test]
    async fn test_update_presets_replaces_and_signals() {
        let fixture = Fixture::new();
        let mut session = fixture.session();

        session
            .update_presets(vec![Preset::new("bad", dec!(0))])
            .unwrap();

        assert_eq!(session.presets().len(), 3);
        assert_eq!(fixture.store.load_presets(), *session.presets());
        assert_eq!(fixture.reload.raised(), 1);
    }
}
