pub const RECORD_KEY: &str = "boot_config";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PwmHardwareConfig {
    pub red_pin: i32,
    pub green_pin: i32,
    pub blue_pin: i32,
    pub frequency_hz: u32,
}

impl Default for PwmHardwareConfig {
    fn default() -> Self {
        Self {
            red_pin: 14,
            green_pin: 4,
            blue_pin: 5,
            frequency_hz: 5_000,
        }
    }
}

impl PwmHardwareConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if self.red_pin < 0 {
            self.red_pin = defaults.red_pin;
        }
        if self.green_pin < 0 {
            self.green_pin = defaults.green_pin;
        }
        if self.blue_pin < 0 {
            self.blue_pin = defaults.blue_pin;
        }

        self.frequency_hz = self.frequency_hz.clamp(100, 40_000);
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
}

impl NetworkConfig {
    pub fn from_build_env() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or_default().to_string(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or_default().to_string(),
        }
    }

    pub fn has_station_credentials(&self) -> bool {
        !self.wifi_ssid.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LightConfig {
    pub pwm: PwmHardwareConfig,
    pub network: NetworkConfig,
    pub http_port: u16,
    pub record_key: String,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            pwm: PwmHardwareConfig::default(),
            network: NetworkConfig::from_build_env(),
            http_port: 80,
            record_key: RECORD_KEY.to_string(),
        }
    }
}

impl LightConfig {
    pub fn sanitize(&mut self) {
        self.pwm.sanitize();
        if self.http_port == 0 {
            self.http_port = 80;
        }
        if self.record_key.trim().is_empty() {
            self.record_key = RECORD_KEY.to_string();
        }
    }
}
