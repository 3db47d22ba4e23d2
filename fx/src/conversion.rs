//! Conversion of amount text against a rate table.

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use widgetfx_common::{ConversionSnapshot, CurrencyCode, RateTable, Timestamp};

use crate::keypad::sanitize_amount_text;

/// Parse canonical amount text. Unparseable text is zero.
pub fn parse_amount(text: &str) -> Decimal {
    let trimmed = text.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed).unwrap_or(Decimal::ZERO)
}

/// Convert `amount_text` into `target` using `table`, stamped now.
///
/// `None` when the table has no quote for `target` or the product does not
/// fit a `Decimal`; such a result must not be persisted.
pub fn compute_conversion(
    amount_text: &str,
    table: &RateTable,
    target: &CurrencyCode,
) -> Option<ConversionSnapshot> {
    compute_conversion_at(amount_text, table, target, Utc::now())
}

/// Like [`compute_conversion`] with an explicit timestamp, used when the
/// rate comes from a cached table and should carry that table's `as_of`.
pub fn compute_conversion_at(
    amount_text: &str,
    table: &RateTable,
    target: &CurrencyCode,
    timestamp: Timestamp,
) -> Option<ConversionSnapshot> {
    let rate = table.rate_for(target)?;
    let amount_text = sanitize_amount_text(amount_text);
    let amount = parse_amount(&amount_text);
    let converted_amount = amount.checked_mul(rate)?;

    Some(ConversionSnapshot {
        base_currency: table.base.clone(),
        target_currency: target.clone(),
        rate,
        amount,
        amount_text,
        converted_amount,
        timestamp,
        chart_series: Vec::new(),
    })
}

/// Re-derive `snapshot` for new amount text, keeping its cached rate and
/// chart series. No network access is involved. `None` on overflow.
pub fn recompute_amount(
    snapshot: &ConversionSnapshot,
    amount_text: &str,
    timestamp: Timestamp,
) -> Option<ConversionSnapshot> {
    let amount_text = sanitize_amount_text(amount_text);
    let amount = parse_amount(&amount_text);
    let converted_amount = amount.checked_mul(snapshot.rate)?;

    Some(ConversionSnapshot {
        base_currency: snapshot.base_currency.clone(),
        target_currency: snapshot.target_currency.clone(),
        rate: snapshot.rate,
        amount,
        amount_text,
        converted_amount,
        timestamp,
        chart_series: snapshot.chart_series.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn table() -> RateTable {
        let mut rates = BTreeMap::new();
        rates.insert(CurrencyCode::eur(), dec!(0.92));
        rates.insert(CurrencyCode::gbp(), dec!(0.79));
        RateTable::new(
            CurrencyCode::usd(),
            Utc.with_ymd_and_hms(2025, 11, 8, 0, 0, 0).unwrap(),
            rates,
        )
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5"), dec!(12.5));
        assert_eq!(parse_amount("5."), dec!(5));
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
    }

    #[test]
    fn test_compute_conversion() {
        let snapshot = compute_conversion("1000", &table(), &CurrencyCode::eur()).unwrap();

        assert_eq!(snapshot.base_currency, CurrencyCode::usd());
        assert_eq!(snapshot.rate, dec!(0.92));
        assert_eq!(snapshot.amount, dec!(1000));
        assert_eq!(snapshot.converted_amount, dec!(920));
        assert!(snapshot.chart_series.is_empty());
    }

    #[test]
    fn test_compute_conversion_sanitizes_text() {
        let snapshot = compute_conversion(".5.0", &table(), &CurrencyCode::gbp()).unwrap();

        assert_eq!(snapshot.amount_text, "0.50");
        assert_eq!(snapshot.converted_amount, dec!(0.395));
    }

    #[test]
    fn test_missing_target_is_none() {
        let target = CurrencyCode::parse("JPY").unwrap();
        assert!(compute_conversion("10", &table(), &target).is_none());
    }

    #[test]
    fn test_cached_conversion_keeps_timestamp() {
        let table = table();
        let snapshot =
            compute_conversion_at("1", &table, &CurrencyCode::eur(), table.as_of).unwrap();
        assert_eq!(snapshot.timestamp, table.as_of);
    }

    #[test]
    fn test_recompute_amount_keeps_rate_and_series() {
        let snapshot = ConversionSnapshot::placeholder();
        let updated = recompute_amount(&snapshot, "5.7", Utc::now()).unwrap();

        assert_eq!(updated.rate, snapshot.rate);
        assert_eq!(updated.chart_series, snapshot.chart_series);
        assert_eq!(updated.converted_amount, dec!(5.7) * dec!(0.93));
    }

    #[test]
    fn test_overflowing_product_is_none() {
        let mut rates = BTreeMap::new();
        rates.insert(CurrencyCode::eur(), dec!(10));
        let table = RateTable::new(CurrencyCode::usd(), Utc::now(), rates);
        let huge = "9".repeat(28);

        assert!(compute_conversion(&huge, &table, &CurrencyCode::eur()).is_none());

        let mut snapshot = ConversionSnapshot::placeholder();
        snapshot.rate = dec!(10);
        assert!(recompute_amount(&snapshot, &huge, Utc::now()).is_none());
    }

    proptest! {
        #[test]
        fn prop_converted_is_amount_times_rate(raw in "[0-9.]{0,9}") {
            let table = table();
            let snapshot = compute_conversion(&raw, &table, &CurrencyCode::eur()).unwrap();
            let expected = parse_amount(&sanitize_amount_text(&raw)) * dec!(0.92);
            prop_assert_eq!(snapshot.converted_amount, expected);
            prop_assert_eq!(parse_amount(&snapshot.amount_text), snapshot.amount);
        }
    }
}
