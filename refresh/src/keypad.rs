//! Keypad edits delivered by the widget surface.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use widgetfx_common::ConversionSnapshot;
use widgetfx_fx::{apply_keypad_edit, recompute_amount, KeypadButton};
use widgetfx_store::{SharedStore, StoreResult};

use crate::metrics::SharedMetrics;
use crate::reload::ReloadSignal;

/// Applies a single keypad press to the persisted snapshot.
///
/// Runs without network access: the cached rate and chart series of the
/// stored snapshot are reused, and the placeholder stands in when nothing
/// has been stored yet.
pub struct KeypadMutation {
    store: SharedStore,
    reload: Arc<dyn ReloadSignal>,
    metrics: SharedMetrics,
}

impl KeypadMutation {
    pub fn new(store: SharedStore, reload: Arc<dyn ReloadSignal>, metrics: SharedMetrics) -> Self {
        Self {
            store,
            reload,
            metrics,
        }
    }

    /// Edit, persist and signal. Returns the snapshot that was written, or
    /// the unchanged one when the edited amount cannot be converted.
    pub fn handle(&self, button: KeypadButton) -> StoreResult<ConversionSnapshot> {
        let current = self
            .store
            .load_snapshot()
            .unwrap_or_else(ConversionSnapshot::placeholder);

        let text = apply_keypad_edit(&current.amount_text, button);
        let Some(updated) = recompute_amount(&current, &text, Utc::now()) else {
            warn!(button = %button, amount = %text, "Converted amount overflows, edit dropped");
            return Ok(current);
        };

        self.store.save_snapshot(&updated)?;
        self.metrics.keypad_edited();
        self.metrics.snapshot_persisted();
        self.reload.reload_timelines();

        info!(
            button = %button,
            amount = %updated.amount_text,
            converted = %updated.converted_amount,
            "Keypad edit applied"
        );
        Ok(updated)
    }
}
