use log::{info, warn};

use crate::{
    error::StorageError,
    state::{ColorState, PersistedRecord},
};

pub trait StorageVolume {
    fn mount(&mut self) -> Result<(), StorageError>;

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, StorageError>;

    fn write_record(&mut self, bytes: &[u8]) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    SkippedReadOnly,
}

pub struct SettingsStore<V> {
    volume: V,
    read_only: bool,
}

impl<V: StorageVolume> SettingsStore<V> {
    pub fn mount(mut volume: V) -> Self {
        let read_only = match volume.mount() {
            Ok(()) => false,
            Err(err) => {
                warn!("{err}; settings will not be saved");
                true
            }
        };
        Self { volume, read_only }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn load(&mut self) -> Option<ColorState> {
        if self.read_only {
            return None;
        }
        let raw = match self.volume.read_record() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!("{err}; starting without previous settings");
                return None;
            }
        };

        match serde_json::from_slice::<PersistedRecord>(&raw) {
            Ok(record) => {
                info!(
                    "+ Found previous settings: hue: {}; sat: {}; val: {}; previousVal: {}",
                    record.hue, record.saturation, record.brightness, record.previous_brightness
                );
                Some(record.into())
            }
            Err(err) => {
                warn!("settings record is corrupt ({err}); starting without previous settings");
                None
            }
        }
    }

    pub fn save(&mut self, state: &ColorState) -> Result<SaveOutcome, StorageError> {
        if self.read_only {
            return Ok(SaveOutcome::SkippedReadOnly);
        }

        let payload = serde_json::to_vec(&PersistedRecord::from(state))?;
        self.volume.write_record(&payload)?;
        Ok(SaveOutcome::Written)
    }

    #[cfg(test)]
    pub(crate) fn volume(&self) -> &V {
        &self.volume
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    pub(crate) struct MemoryVolume {
        pub record: Option<Vec<u8>>,
        pub writes: usize,
        pub fail_mount: bool,
        pub fail_writes: bool,
        pub fail_reads: bool,
    }

    impl MemoryVolume {
        pub(crate) fn with_record(json: &str) -> Self {
            Self {
                record: Some(json.as_bytes().to_vec()),
                ..Self::default()
            }
        }

        pub(crate) fn record_json(&self) -> Option<serde_json::Value> {
            self.record
                .as_deref()
                .map(|raw| serde_json::from_slice(raw).unwrap())
        }
    }

    impl StorageVolume for MemoryVolume {
        fn mount(&mut self) -> Result<(), StorageError> {
            if self.fail_mount {
                return Err(StorageError::Mount("injected".to_string()));
            }
            Ok(())
        }

        fn read_record(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Read("injected".to_string()));
            }
            Ok(self.record.clone())
        }

        fn write_record(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Write("injected".to_string()));
            }
            self.record = Some(bytes.to_vec());
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn missing_record_loads_nothing() {
        let mut store = SettingsStore::mount(MemoryVolume::default());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn corrupt_record_loads_nothing() {
        let mut store = SettingsStore::mount(MemoryVolume::with_record("{\"hue\": "));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn unreadable_volume_loads_nothing() {
        let volume = MemoryVolume {
            fail_reads: true,
            ..MemoryVolume::default()
        };
        let mut store = SettingsStore::mount(volume);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn saved_state_loads_back() {
        let mut store = SettingsStore::mount(MemoryVolume::default());
        let state = ColorState {
            hue: 12,
            saturation: 34,
            brightness: 0,
            last_non_zero_brightness: 78,
        };

        assert_eq!(store.save(&state).unwrap(), SaveOutcome::Written);
        assert_eq!(store.load(), Some(state));
    }

    #[test]
    fn failed_mount_is_read_only() {
        let volume = MemoryVolume {
            fail_mount: true,
            ..MemoryVolume::with_record(r#"{"hue":1,"sat":2,"val":3,"previousVal":3}"#)
        };
        let mut store = SettingsStore::mount(volume);

        assert!(store.is_read_only());
        assert_eq!(store.load(), None);
        assert_eq!(
            store.save(&ColorState::default()).unwrap(),
            SaveOutcome::SkippedReadOnly
        );
        assert_eq!(store.volume().writes, 0);
    }

    #[test]
    fn write_failure_is_returned() {
        let volume = MemoryVolume {
            fail_writes: true,
            ..MemoryVolume::default()
        };
        let mut store = SettingsStore::mount(volume);
        let err = store.save(&ColorState::default()).unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));
    }
}
