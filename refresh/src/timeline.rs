//! Widget timeline generation from the shared store.

use std::time::Duration;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::Serialize;
use widgetfx_common::catalog;
use widgetfx_common::{ConversionSnapshot, CurrencyCode, Preset, RateTable, Timestamp};
use widgetfx_store::SharedStore;

/// Quick-glance rows shown under the main conversion.
pub const MAX_CONVERSION_ROWS: usize = 5;

/// What a timeline entry displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "snapshot", rename_all = "camelCase")]
pub enum DisplayState {
    /// Nothing persisted yet; a fixed sample conversion.
    Placeholder(ConversionSnapshot),
    /// The latest persisted conversion.
    Snapshot(ConversionSnapshot),
}

impl DisplayState {
    pub fn snapshot(&self) -> &ConversionSnapshot {
        match self {
            Self::Placeholder(s) | Self::Snapshot(s) => s,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// Why a timeline was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RegenerationReason {
    Initial,
    Scheduled,
    Signalled,
}

/// One line of the multi-currency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRow {
    pub code: CurrencyCode,
    pub rate: Decimal,
    pub converted: Decimal,
}

impl ConversionRow {
    /// The snapshot's own target conversion.
    pub fn from_snapshot(snapshot: &ConversionSnapshot) -> Self {
        Self {
            code: snapshot.target_currency.clone(),
            rate: snapshot.rate,
            converted: snapshot.converted_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub date: Timestamp,
    pub state: DisplayState,
    pub presets: Vec<Preset>,
    pub rows: Vec<ConversionRow>,
    pub reason: RegenerationReason,
}

/// A single-entry timeline with its requested refresh time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub next_refresh: Timestamp,
}

/// Builds widget timelines. Reads the store only; never fetches.
#[derive(Clone)]
pub struct TimelineGenerator {
    store: SharedStore,
    interval: Duration,
}

impl TimelineGenerator {
    pub fn new(store: SharedStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Entry shown while the surface is still loading.
    pub fn placeholder_entry(&self, now: Timestamp) -> TimelineEntry {
        let snapshot = ConversionSnapshot::placeholder();
        TimelineEntry {
            date: now,
            rows: Vec::new(),
            state: DisplayState::Placeholder(snapshot),
            presets: self.store.load_presets().into_inner(),
            reason: RegenerationReason::Initial,
        }
    }

    /// Entry reflecting the store as it is now.
    pub fn entry(&self, now: Timestamp, reason: RegenerationReason) -> TimelineEntry {
        let (state, rows) = match self.store.load_snapshot() {
            Some(snapshot) => {
                let rows = match self.store.load_rates() {
                    Some(rates) => conversion_rows(&snapshot, &rates),
                    None => vec![ConversionRow::from_snapshot(&snapshot)],
                };
                (DisplayState::Snapshot(snapshot), rows)
            }
            None => (DisplayState::Placeholder(ConversionSnapshot::placeholder()), Vec::new()),
        };

        TimelineEntry {
            date: now,
            state,
            presets: self.store.load_presets().into_inner(),
            rows,
            reason,
        }
    }

    /// One entry, next refresh one interval from `now`.
    pub fn timeline(&self, now: Timestamp, reason: RegenerationReason) -> Timeline {
        let next_refresh = TimeDelta::from_std(self.interval)
            .ok()
            .and_then(|step| now.checked_add_signed(step))
            .unwrap_or(now);
        Timeline {
            entries: vec![self.entry(now, reason)],
            next_refresh,
        }
    }
}

/// Rows for the first primary codes other than the snapshot's base.
///
/// `rates` is used only when it was fetched for that same base; otherwise
/// the single row is the snapshot's own conversion. Rows whose product
/// overflows are skipped.
pub fn conversion_rows(snapshot: &ConversionSnapshot, rates: &RateTable) -> Vec<ConversionRow> {
    if rates.base != snapshot.base_currency {
        return vec![ConversionRow::from_snapshot(snapshot)];
    }

    catalog::primary_codes()
        .into_iter()
        .filter(|code| *code != snapshot.base_currency)
        .filter_map(|code| {
            let rate = rates.rate_for(&code)?;
            Some(ConversionRow {
                converted: snapshot.amount.checked_mul(rate)?,
                code,
                rate,
            })
        })
        .take(MAX_CONVERSION_ROWS)
        .collect()
}
