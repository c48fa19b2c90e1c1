const HSV_SECTION_3: u8 = 0x40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Self = Self { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

fn scale8(i: u8, scale: u8) -> u8 {
    ((u16::from(i) * (u16::from(scale) + 1)) >> 8) as u8
}

pub fn hsv_to_rgb_spectrum(hue: u8, saturation: u8, value: u8) -> Rgb {
    // Compress the wheel into the three 64-step sections (0..=191).
    hsv_to_rgb_raw(scale8(hue, 191), saturation, value)
}

fn hsv_to_rgb_raw(hue: u8, saturation: u8, value: u8) -> Rgb {
    let invsat = 255 - saturation;
    let brightness_floor = (u16::from(value) * u16::from(invsat) / 256) as u8;
    let color_amplitude = value - brightness_floor;

    let section = hue / HSV_SECTION_3;
    let offset = hue % HSV_SECTION_3;

    let rampup = offset;
    let rampdown = (HSV_SECTION_3 - 1) - offset;

    // Ramps are 0..=63, so scaling by amplitude / 64 stands in for the
    // 0..=255 stretch followed by / 256.
    let rampup_amp_adj = (u16::from(rampup) * u16::from(color_amplitude) / 64) as u8;
    let rampdown_amp_adj = (u16::from(rampdown) * u16::from(color_amplitude) / 64) as u8;

    let rampup_with_floor = rampup_amp_adj + brightness_floor;
    let rampdown_with_floor = rampdown_amp_adj + brightness_floor;

    match section {
        0 => Rgb::new(rampdown_with_floor, rampup_with_floor, brightness_floor),
        1 => Rgb::new(brightness_floor, rampdown_with_floor, rampup_with_floor),
        _ => Rgb::new(rampup_with_floor, brightness_floor, rampdown_with_floor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_hues_at_full_value() {
        assert_eq!(hsv_to_rgb_spectrum(0, 255, 255), Rgb::new(251, 0, 0));
        assert_eq!(hsv_to_rgb_spectrum(85, 255, 255), Rgb::new(0, 251, 0));
        assert_eq!(hsv_to_rgb_spectrum(128, 255, 255), Rgb::new(0, 123, 127));
        assert_eq!(hsv_to_rgb_spectrum(255, 255, 255), Rgb::new(251, 0, 0));
    }

    #[test]
    fn zero_value_is_black() {
        for hue in 0..=255u8 {
            assert_eq!(hsv_to_rgb_spectrum(hue, 200, 0), Rgb::OFF);
        }
    }

    #[test]
    fn zero_saturation_is_grey() {
        let rgb = hsv_to_rgb_spectrum(40, 0, 255);
        assert_eq!(rgb, Rgb::new(254, 254, 254));
    }

    #[test]
    fn channels_never_exceed_value() {
        for hue in (0..=255u8).step_by(7) {
            for saturation in (0..=255u8).step_by(17) {
                for value in (0..=255u8).step_by(15) {
                    let rgb = hsv_to_rgb_spectrum(hue, saturation, value);
                    assert!(rgb.r <= value && rgb.g <= value && rgb.b <= value);
                }
            }
        }
    }

    #[test]
    fn conversion_is_deterministic() {
        let first = hsv_to_rgb_spectrum(85, 127, 204);
        let second = hsv_to_rgb_spectrum(85, 127, 204);
        assert_eq!(first, second);
        assert_eq!(first, Rgb::new(102, 202, 102));
    }
}
