//! Rate gateway and conversion error types.

use widgetfx_common::CurrencyCode;
use thiserror::Error;

/// Errors that can occur while fetching or applying rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// One upstream provider failed (network, HTTP status or decode).
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Every rate provider failed.
    #[error("Rates unavailable for {base}")]
    RatesUnavailable { base: CurrencyCode },

    /// The history window could not be computed.
    #[error("Unable to prepare date range: {0}")]
    DateRangeError(String),

    /// The rate table has no quote for the target.
    #[error("No {target} rate in {base} table")]
    NoRateForTarget {
        base: CurrencyCode,
        target: CurrencyCode,
    },
}

impl FxError {
    /// Build a provider failure.
    pub fn provider(provider: &str, reason: impl ToString) -> Self {
        FxError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the caller can recover by using cached data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FxError::ProviderUnavailable { .. } | FxError::RatesUnavailable { .. }
        )
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
