//! Typed access to the three shared records.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use widgetfx_common::{ConversionSnapshot, Preset, PresetList, RateTable};

use crate::backend::KeyValueBackend;
use crate::error::{StoreError, StoreResult};

/// Record keys. Each record is independent of the others.
pub mod keys {
    pub const SNAPSHOT: &str = "widgetfx.latestSnapshot";
    pub const RATES: &str = "widgetfx.latestRates";
    pub const PRESETS: &str = "widgetfx.widgetPresets";
}

/// Store handle shared by the foreground app and the widget.
///
/// Cloning is cheap; clones share the backend.
#[derive(Clone)]
pub struct SharedStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl SharedStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Latest persisted rate table.
    pub fn load_rates(&self) -> Option<RateTable> {
        self.load(keys::RATES)
    }

    pub fn save_rates(&self, rates: &RateTable) -> StoreResult<()> {
        self.save(keys::RATES, rates)
    }

    /// Latest persisted conversion, `None` before the first write.
    pub fn load_snapshot(&self) -> Option<ConversionSnapshot> {
        self.load(keys::SNAPSHOT)
    }

    pub fn save_snapshot(&self, snapshot: &ConversionSnapshot) -> StoreResult<()> {
        self.save(keys::SNAPSHOT, snapshot)
    }

    /// Presets, or the defaults when none (or an empty list) are stored.
    pub fn load_presets(&self) -> PresetList {
        match self.load::<Vec<Preset>>(keys::PRESETS) {
            Some(presets) => PresetList::from_user(presets),
            None => PresetList::defaults(),
        }
    }

    pub fn save_presets(&self, presets: &PresetList) -> StoreResult<()> {
        self.save(keys::PRESETS, presets)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "Record absent");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Record unreadable, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Record undecodable, treating as absent");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileBackend, MemoryBackend};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use widgetfx_common::CurrencyCode;

    fn memory_store() -> (Arc<MemoryBackend>, SharedStore) {
        let backend = Arc::new(MemoryBackend::new());
        (backend.clone(), SharedStore::new(backend))
    }

    fn rates() -> RateTable {
        let mut rates = BTreeMap::new();
        rates.insert(CurrencyCode::eur(), dec!(0.92));
        RateTable::new(
            CurrencyCode::usd(),
            Utc.with_ymd_and_hms(2025, 11, 8, 0, 0, 0).unwrap(),
            rates,
        )
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let root = tempfile::tempdir().unwrap();
        let store = SharedStore::new(Arc::new(FileBackend::open(root.path(), "group.test").unwrap()));
        let snapshot = ConversionSnapshot::placeholder();

        store.save_snapshot(&snapshot).unwrap();

        assert_eq!(store.load_snapshot(), Some(snapshot));
    }

    #[test]
    fn test_records_are_independent() {
        let (_, store) = memory_store();
        let snapshot = ConversionSnapshot::placeholder();

        store.save_snapshot(&snapshot).unwrap();
        store.save_rates(&rates()).unwrap();

        assert_eq!(store.load_snapshot(), Some(snapshot));
        assert_eq!(store.load_rates(), Some(rates()));
    }

    #[test]
    fn test_missing_records_are_absent() {
        let (_, store) = memory_store();
        assert!(store.load_snapshot().is_none());
        assert!(store.load_rates().is_none());
        assert_eq!(store.load_presets().len(), 3);
    }

    #[test]
    fn test_undecodable_record_is_absent() {
        let (backend, store) = memory_store();
        backend.set(keys::SNAPSHOT, b"{not json").unwrap();
        backend.set(keys::RATES, br#"{"base":"??","asOf":"x","rates":{}}"#).unwrap();

        assert!(store.load_snapshot().is_none());
        assert!(store.load_rates().is_none());
    }

    #[test]
    fn test_empty_presets_fall_back_to_defaults() {
        let (backend, store) = memory_store();
        backend.set(keys::PRESETS, b"[]").unwrap();

        let presets = store.load_presets();
        let amounts: Vec<_> = presets.as_slice().iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![dec!(25), dec!(50), dec!(100)]);
    }

    #[test]
    fn test_presets_roundtrip() {
        let (_, store) = memory_store();
        let presets = PresetList::from_user(vec![Preset::new("rent", dec!(1200))]);

        store.save_presets(&presets).unwrap();

        assert_eq!(store.load_presets(), presets);
    }
}
