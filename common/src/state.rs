use serde::{Deserialize, Serialize};

use crate::color::{hsv_to_rgb_spectrum, Rgb};

pub const PERCENT_MAX: i64 = 100;
pub const DEGREES_MAX: i64 = 360;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorState {
    pub hue: u8,
    pub saturation: u8,
    pub brightness: u8,
    pub last_non_zero_brightness: u8,
}

impl ColorState {
    pub fn is_on(&self) -> bool {
        self.brightness != 0
    }

    pub fn rgb(&self) -> Rgb {
        hsv_to_rgb_spectrum(self.hue, self.saturation, self.brightness)
    }

    pub(crate) fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
        if brightness > 0 {
            self.last_non_zero_brightness = brightness;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedRecord {
    pub hue: u8,
    #[serde(rename = "sat")]
    pub saturation: u8,
    #[serde(rename = "val")]
    pub brightness: u8,
    #[serde(rename = "previousVal", default)]
    pub previous_brightness: u8,
}

impl From<&ColorState> for PersistedRecord {
    fn from(state: &ColorState) -> Self {
        Self {
            hue: state.hue,
            saturation: state.saturation,
            brightness: state.brightness,
            previous_brightness: state.last_non_zero_brightness,
        }
    }
}

impl From<PersistedRecord> for ColorState {
    fn from(record: PersistedRecord) -> Self {
        let last_non_zero_brightness = if record.previous_brightness == 0 {
            record.brightness
        } else {
            record.previous_brightness
        };
        Self {
            hue: record.hue,
            saturation: record.saturation,
            brightness: record.brightness,
            last_non_zero_brightness,
        }
    }
}

pub fn percent_to_unit(percent: i64) -> u8 {
    (percent.clamp(0, PERCENT_MAX) * 255 / 100) as u8
}

pub fn unit_to_percent(unit: u8) -> u8 {
    (u16::from(unit) * 100 / 255) as u8
}

pub fn degrees_to_unit(degrees: i64) -> u8 {
    (degrees.clamp(0, DEGREES_MAX) * 182 / 256) as u8
}

pub fn unit_to_degrees(unit: u8) -> u16 {
    u16::from(unit) * 256 / 182
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_uses_legacy_key_names() {
        let state = ColorState {
            hue: 85,
            saturation: 127,
            brightness: 0,
            last_non_zero_brightness: 204,
        };
        let json = serde_json::to_value(PersistedRecord::from(&state)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "hue": 85, "sat": 127, "val": 0, "previousVal": 204 })
        );
    }

    #[test]
    fn record_without_previous_brightness_falls_back_to_brightness() {
        let record: PersistedRecord =
            serde_json::from_str(r#"{"hue":10,"sat":20,"val":30}"#).unwrap();
        let state = ColorState::from(record);
        assert_eq!(state.last_non_zero_brightness, 30);
    }

    #[test]
    fn percent_mapping_truncates() {
        assert_eq!(percent_to_unit(0), 0);
        assert_eq!(percent_to_unit(1), 2);
        assert_eq!(percent_to_unit(50), 127);
        assert_eq!(percent_to_unit(80), 204);
        assert_eq!(percent_to_unit(100), 255);
        assert_eq!(unit_to_percent(204), 80);
        assert_eq!(unit_to_percent(127), 49);
    }

    #[test]
    fn percent_round_trip_matches_truncating_formula() {
        for percent in 0..=100i64 {
            let expected = ((percent * 255 / 100) * 100 / 255) as u8;
            assert_eq!(unit_to_percent(percent_to_unit(percent)), expected);
            assert!(i64::from(expected) <= percent && percent - i64::from(expected) <= 1);
        }
    }

    #[test]
    fn hue_round_trip_matches_truncating_formula() {
        for degrees in 0..=360i64 {
            let expected = ((degrees * 182 / 256) * 256 / 182) as u16;
            assert_eq!(unit_to_degrees(degrees_to_unit(degrees)), expected);
        }
        assert_eq!(degrees_to_unit(120), 85);
        assert_eq!(unit_to_degrees(85), 119);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(percent_to_unit(-5), 0);
        assert_eq!(percent_to_unit(250), 255);
        assert_eq!(degrees_to_unit(-1), 0);
        assert_eq!(degrees_to_unit(720), 255);
    }

    #[test]
    fn set_brightness_keeps_last_on_value() {
        let mut state = ColorState::default();
        state.set_brightness(100);
        state.set_brightness(0);
        assert_eq!(state.brightness, 0);
        assert_eq!(state.last_non_zero_brightness, 100);
        assert!(!state.is_on());
    }
}
