use log::{debug, info, warn};

use crate::{
    color::Rgb,
    error::OutputError,
    settings::{SaveOutcome, SettingsStore, StorageVolume},
    state::{
        degrees_to_unit, percent_to_unit, unit_to_degrees, unit_to_percent, ColorState,
    },
    status::StatusSlot,
};

pub trait RgbOutput {
    fn write_rgb(&mut self, rgb: Rgb) -> Result<(), OutputError>;
}

pub struct LedController<O, V> {
    state: ColorState,
    output: O,
    store: SettingsStore<V>,
    status: StatusSlot,
}

impl<O: RgbOutput, V: StorageVolume> LedController<O, V> {
    pub fn new(output: O, mut store: SettingsStore<V>, status: StatusSlot) -> Self {
        let state = store.load().unwrap_or_default();
        let mut controller = Self {
            state,
            output,
            store,
            status,
        };

        if controller.state.is_on() {
            info!("restoring light from previous settings");
            controller.drive();
        }
        controller
    }

    pub fn state(&self) -> &ColorState {
        &self.state
    }

    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    pub fn turn_on(&mut self) {
        let brightness = self.state.last_non_zero_brightness;
        self.state.set_brightness(brightness);
        self.apply();
    }

    pub fn turn_off(&mut self) {
        self.state.brightness = 0;
        self.apply();
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    pub fn set_brightness_percent(&mut self, percent: i64) -> u8 {
        self.state.set_brightness(percent_to_unit(percent));
        self.apply();
        self.state.brightness
    }

    pub fn brightness_percent(&self) -> u8 {
        unit_to_percent(self.state.brightness)
    }

    pub fn set_hue_degrees(&mut self, degrees: i64) -> u8 {
        self.state.hue = degrees_to_unit(degrees);
        self.apply();
        self.state.hue
    }

    pub fn hue_degrees(&self) -> u16 {
        unit_to_degrees(self.state.hue)
    }

    pub fn set_saturation_percent(&mut self, percent: i64) -> u8 {
        self.state.saturation = percent_to_unit(percent);
        self.apply();
        self.state.saturation
    }

    pub fn saturation_percent(&self) -> u8 {
        unit_to_percent(self.state.saturation)
    }

    fn apply(&mut self) {
        self.drive();
        self.persist();
    }

    fn drive(&mut self) {
        let rgb = self.state.rgb();
        if let Err(err) = self.output.write_rgb(rgb) {
            warn!("{err}");
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.state) {
            Ok(SaveOutcome::Written) => {}
            Ok(SaveOutcome::SkippedReadOnly) => debug!("read only mode, settings not saved"),
            Err(err) => {
                warn!("{err}; keeping in-memory state");
                self.status.publish(format!("Save failed: {err}"));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn output(&self) -> &O {
        &self.output
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &SettingsStore<V> {
        &self.store
    }
}
