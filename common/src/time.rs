//! Time utilities and constants for WidgetFX.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Days of history shown on the chart.
    pub const TREND_DAYS: u32 = 7;

    /// Widget timeline cadence (15 minutes).
    pub fn timeline_refresh_interval() -> Duration {
        Duration::minutes(15)
    }

    /// Upstream HTTP request timeout (10 seconds).
    pub fn http_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp with timezone (always UTC for WidgetFX).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Inclusive calendar window used for history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window of `days` days ending the day before `now`, so that a partial
    /// current day is never requested. `None` if the calendar overflows.
    pub fn ending_before(now: Timestamp, days: u32) -> Option<Self> {
        let end = now.date_naive().checked_sub_days(Days::new(1))?;
        let start = end.checked_sub_days(Days::new(u64::from(days)))?;
        Some(Self { start, end })
    }
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_ends_yesterday() {
        let now = Utc.with_ymd_and_hms(2025, 11, 9, 15, 30, 0).unwrap();
        let window = DateWindow::ending_before(now, 7).unwrap();

        assert_eq!(window.end, NaiveDate::from_ymd_opt(2025, 11, 8).unwrap());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
    }

    #[test]
    fn test_window_crosses_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let window = DateWindow::ending_before(now, 3).unwrap();

        assert_eq!(window.end, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 2, 26).unwrap());
    }

    #[test]
    fn test_negative_duration_as_std() {
        assert_eq!(Duration::seconds(-5).as_std(), std::time::Duration::ZERO);
        assert_eq!(
            constants::timeline_refresh_interval().as_std(),
            std::time::Duration::from_secs(900)
        );
    }
}
