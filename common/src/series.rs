//! Chart series points.

use chrono::{Days, NaiveDate};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum jitter of a placeholder point, in basis points of the seed.
const PLACEHOLDER_JITTER_BPS: i64 = 40;

/// One day of a rate history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl RatePoint {
    /// Create a new point.
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }

    /// Smallest value a placeholder point may take.
    pub fn placeholder_floor() -> Decimal {
        Decimal::new(1, 2)
    }

    /// Synthetic series of `days` points ending on `end`, each within
    /// ±0.4% of `seed` and never below [`Self::placeholder_floor`].
    ///
    /// Never fails; dates that cannot be represented are skipped.
    pub fn placeholder_series(seed: Decimal, days: u32, end: NaiveDate) -> Vec<RatePoint> {
        let mut rng = rand::thread_rng();
        let floor = Self::placeholder_floor();

        let mut points: Vec<RatePoint> = (0..u64::from(days))
            .filter_map(|offset| {
                let date = end.checked_sub_days(Days::new(offset))?;
                let variance = Decimal::new(
                    rng.gen_range(-PLACEHOLDER_JITTER_BPS..=PLACEHOLDER_JITTER_BPS),
                    4,
                );
                let value = (seed * (Decimal::ONE + variance)).max(floor);
                Some(RatePoint::new(date, value))
            })
            .collect();

        points.sort_by_key(|p| p.date);
        points
    }
}
