//! Currency catalog offered by the converter.

use crate::monetary::CurrencyCode;

static PRIMARY: [&str; 11] = [
    "USD", "EUR", "GBP", "CHF", "JPY", "CNY", "AUD", "CAD", "AED", "KZT", "TRY",
];

static EXTENDED: [&str; 18] = [
    "USD", "EUR", "GBP", "CHF", "JPY", "CNY", "AUD", "CAD", "AED", "KZT", "TRY", "SEK", "NOK",
    "PLN", "UAH", "BRL", "INR", "SGD",
];

/// Currencies shown on the widget conversion rows.
pub fn primary_codes() -> Vec<CurrencyCode> {
    PRIMARY.iter().map(|c| CurrencyCode::known(*c)).collect()
}

/// Currencies requested from the rate providers.
pub fn extended_codes() -> Vec<CurrencyCode> {
    EXTENDED.iter().map(|c| CurrencyCode::known(*c)).collect()
}
