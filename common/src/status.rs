use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct StatusSlot {
    slot: Arc<Mutex<Option<String>>>,
}

impl StatusSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: impl Into<String>) {
        // A poisoned slot only means a consumer panicked mid-take; the string
        // inside is still usable.
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(event.into());
    }

    pub fn take(&self) -> Option<String> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.take()
    }
}
