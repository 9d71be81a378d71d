use tracing::{error, info};

use crate::record::{decode_record, encode_record, PersistedState, DEST_SLOTS};
use crate::{CdsError, KeyValueStore};

/// Engine-facing adapter over a [`KeyValueStore`].
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
    key: String,
    active: bool,
}

impl Persistence {
    /// The adapter starts inactive; call [`create_or_restore`](Self::create_or_restore).
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            active: false,
        }
    }

    /// An adapter that never persists anything.
    pub fn disabled() -> Self {
        Self::new(Box::new(crate::MemoryStore::new()), String::new())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// On first run writes the current values; otherwise overwrites
    /// `counts` (and `enabled`, when `restore_enable_state`) with the stored
    /// ones. Returns `true` when stored values were adopted.
    ///
    /// Errors are logged and leave the adapter inactive.
    pub fn create_or_restore(
        &mut self,
        counts: &mut [u32; DEST_SLOTS],
        enabled: &mut bool,
        restore_enable_state: bool,
    ) -> bool {
        if self.key.is_empty() {
            self.active = false;
            return false;
        }
        match self.try_create_or_restore(counts, enabled, restore_enable_state) {
            Ok(restored) => {
                self.active = true;
                restored
            }
            Err(e) => {
                error!(key = %self.key, "critical data store access error: {}", e);
                self.active = false;
                false
            }
        }
    }

    fn try_create_or_restore(
        &mut self,
        counts: &mut [u32; DEST_SLOTS],
        enabled: &mut bool,
        restore_enable_state: bool,
    ) -> Result<bool, CdsError> {
        match self.store.read(&self.key)? {
            None => {
                let state = PersistedState {
                    sequence_counts: *counts,
                    app_enabled: *enabled,
                };
                self.store.write(&self.key, &encode_record(&state))?;
                info!(key = %self.key, "critical data store created");
                Ok(false)
            }
            Some(bytes) => {
                let state = decode_record(&bytes)?;
                *counts = state.sequence_counts;
                if restore_enable_state {
                    *enabled = state.app_enabled;
                }
                info!(key = %self.key, "critical data store restored");
                Ok(true)
            }
        }
    }

    /// Best-effort write of the current values. A failure is logged and
    /// makes the adapter inactive; an inactive adapter does nothing.
    pub fn update(&mut self, counts: &[u32; DEST_SLOTS], enabled: bool) {
        if !self.active {
            return;
        }
        let state = PersistedState {
            sequence_counts: *counts,
            app_enabled: enabled,
        };
        if let Err(e) = self.store.write(&self.key, &encode_record(&state)) {
            error!(key = %self.key, "critical data store update error: {}", e);
            self.active = false;
        }
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("key", &self.key)
            .field("active", &self.active)
            .finish()
    }
}
