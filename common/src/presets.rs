//! User-defined quick-amount presets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of presets a user can keep.
pub const MAX_PRESETS: usize = 6;

/// A quick-amount shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: Uuid,
    pub title: String,
    pub amount: Decimal,
}

impl Preset {
    /// Create a preset with a fresh identifier.
    pub fn new(title: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            amount,
        }
    }
}

/// Ordered, non-empty list of at most [`MAX_PRESETS`] positive presets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PresetList(Vec<Preset>);

impl PresetList {
    /// Built-in set used on first run and whenever a list would be empty.
    pub fn defaults() -> Self {
        Self(
            [25, 50, 100]
                .into_iter()
                .map(|amount| Preset::new(amount.to_string(), Decimal::from(amount)))
                .collect(),
        )
    }

    /// Accept a user-supplied list: non-positive amounts are dropped, the
    /// list is capped, and an empty result falls back to the defaults.
    pub fn from_user(presets: Vec<Preset>) -> Self {
        let kept: Vec<Preset> = presets
            .into_iter()
            .filter(|p| p.amount > Decimal::ZERO)
            .take(MAX_PRESETS)
            .collect();

        if kept.is_empty() {
            Self::defaults()
        } else {
            Self(kept)
        }
    }

    pub fn as_slice(&self) -> &[Preset] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Preset> {
        self.0
    }
}

impl Default for PresetList {
    fn default() -> Self {
        Self::defaults()
    }
}
