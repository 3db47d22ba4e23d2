//! Monetary types shared by the foreground app and the widget.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::series::RatePoint;

/// ISO 4217 currency code (three ASCII letters, upper case).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, normalising to upper case.
    pub fn parse(code: &str) -> Result<Self, ModelError> {
        let trimmed = code.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(ModelError::InvalidCurrencyCode(code.to_string()))
        }
    }

    /// Build a code from a literal known to be valid.
    pub(crate) fn known(code: &'static str) -> Self {
        debug_assert!(Self::parse(code).is_ok(), "invalid catalog code {code}");
        Self(code.to_string())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::known("USD")
    }

    pub fn eur() -> Self {
        Self::known("EUR")
    }

    pub fn gbp() -> Self {
        Self::known("GBP")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Latest known rates for one base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    /// Currency the rates are quoted against.
    pub base: CurrencyCode,
    /// When the upstream provider published these rates.
    pub as_of: DateTime<Utc>,
    /// Units of each currency per one unit of `base`.
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

impl RateTable {
    /// Create a new rate table.
    pub fn new(
        base: CurrencyCode,
        as_of: DateTime<Utc>,
        rates: BTreeMap<CurrencyCode, Decimal>,
    ) -> Self {
        Self { base, as_of, rates }
    }

    /// Build a table from raw provider keys, dropping anything that is not a
    /// valid code or was not requested. An empty `symbols` keeps every code.
    pub fn from_raw<I>(
        base: CurrencyCode,
        as_of: DateTime<Utc>,
        raw: I,
        symbols: &[CurrencyCode],
    ) -> Self
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let rates = raw
            .into_iter()
            .filter_map(|(code, rate)| CurrencyCode::parse(&code).ok().map(|c| (c, rate)))
            .filter(|(code, _)| symbols.is_empty() || symbols.contains(code))
            .collect();
        Self { base, as_of, rates }
    }

    /// Rate for the given currency, if present.
    pub fn rate_for(&self, code: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(code).copied()
    }

    /// Keep only the requested symbols.
    pub fn retain_symbols(mut self, symbols: &[CurrencyCode]) -> Self {
        self.rates.retain(|code, _| symbols.contains(code));
        self
    }

    /// Number of quoted currencies.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if the table quotes nothing.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// The last computed conversion, shared with the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSnapshot {
    pub base_currency: CurrencyCode,
    pub target_currency: CurrencyCode,
    /// Units of target per one unit of base.
    pub rate: Decimal,
    pub amount: Decimal,
    /// Canonical text the amount was parsed from.
    pub amount_text: String,
    pub converted_amount: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Ascending by date, possibly empty.
    #[serde(default)]
    pub chart_series: Vec<RatePoint>,
}

impl ConversionSnapshot {
    /// Snapshot shown before anything was ever persisted.
    pub fn placeholder() -> Self {
        let rate = Decimal::new(93, 2);
        let amount = Decimal::from(100);
        Self {
            base_currency: CurrencyCode::usd(),
            target_currency: CurrencyCode::eur(),
            rate,
            amount,
            amount_text: "100".to_string(),
            converted_amount: amount * rate,
            timestamp: Utc::now(),
            chart_series: RatePoint::placeholder_series(
                Decimal::new(94, 2),
                crate::time::constants::TREND_DAYS,
                Utc::now().date_naive(),
            ),
        }
    }

    /// Replace the chart series, keeping every other field.
    pub fn with_chart_series(mut self, series: Vec<RatePoint>) -> Self {
        self.chart_series = series;
        self
    }
}
