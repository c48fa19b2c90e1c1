use core::convert::TryInto;
use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use anyhow::{anyhow, Context};
use embedded_svc::{
    http::Method,
    io::Write,
    wifi::{AuthMethod, ClientConfiguration, Configuration},
};
use esp_idf_hal::{
    gpio::AnyOutputPin,
    ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution, TIMER0},
    modem::Modem,
    prelude::Peripherals,
    units::FromValueType,
};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    http::server::{Configuration as HttpConfiguration, EspHttpServer},
    log::EspLogger,
    nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault},
    wifi::{BlockingWifi, EspWifi},
};
use log::{info, warn};

use led_monitor_common::{
    dispatch, parse_query, LedController, LightConfig, NetworkConfig, OutputError, Rgb, RgbOutput,
    Route, SettingsStore, StatusSlot, StorageError, StorageVolume,
};

const NVS_NAMESPACE: &str = "ledmonitor";
const MAX_RECORD_BYTES: usize = 256;
const HTTP_STACK_SIZE: usize = 8 * 1024;
const WIFI_RETRY_DELAY_MS: u64 = 500;
const STATUS_POLL_MS: u64 = 250;

type DeviceController = LedController<LedcOutput, NvsVolume>;

struct LedcOutput {
    _timer: LedcTimerDriver<'static, TIMER0>,
    red: LedcDriver<'static>,
    green: LedcDriver<'static>,
    blue: LedcDriver<'static>,
}

impl LedcOutput {
    fn set_channel(
        driver: &mut LedcDriver<'static>,
        channel: &'static str,
        level: u8,
    ) -> Result<(), OutputError> {
        let duty = u32::from(level) * driver.get_max_duty() / 255;
        driver.set_duty(duty).map_err(|err| OutputError::Channel {
            channel,
            reason: err.to_string(),
        })
    }
}

impl RgbOutput for LedcOutput {
    fn write_rgb(&mut self, rgb: Rgb) -> Result<(), OutputError> {
        Self::set_channel(&mut self.red, "red", rgb.r)?;
        Self::set_channel(&mut self.green, "green", rgb.g)?;
        Self::set_channel(&mut self.blue, "blue", rgb.b)
    }
}

struct NvsVolume {
    partition: EspDefaultNvsPartition,
    key: String,
    nvs: Option<EspNvs<NvsDefault>>,
}

impl NvsVolume {
    fn new(partition: EspDefaultNvsPartition, key: &str) -> Self {
        Self {
            partition,
            key: key.to_string(),
            nvs: None,
        }
    }
}

impl StorageVolume for NvsVolume {
    fn mount(&mut self) -> Result<(), StorageError> {
        let nvs = EspNvs::new(self.partition.clone(), NVS_NAMESPACE, true)
            .map_err(|err| StorageError::Mount(err.to_string()))?;
        self.nvs = Some(nvs);
        Ok(())
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        let nvs = self
            .nvs
            .as_ref()
            .ok_or_else(|| StorageError::Read("namespace not open".to_string()))?;
        let mut buffer = vec![0_u8; MAX_RECORD_BYTES];

        match nvs.get_str(&self.key, &mut buffer) {
            Ok(value) => Ok(value.map(|value| value.as_bytes().to_vec())),
            Err(err) => Err(StorageError::Read(err.to_string())),
        }
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let nvs = self
            .nvs
            .as_mut()
            .ok_or_else(|| StorageError::Write("namespace not open".to_string()))?;
        let payload =
            core::str::from_utf8(bytes).map_err(|err| StorageError::Write(err.to_string()))?;
        nvs.set_str(&self.key, payload)
            .map_err(|err| StorageError::Write(err.to_string()))
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();
    info!("+ SERIAL | Setup complete");

    let mut config = LightConfig::default();
    config.sanitize();

    let status = StatusSlot::new();
    status.publish(">led-monitor bootup<");
    spawn_status_loop(status.clone());

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let peripherals = Peripherals::take()?;

    let wifi = connect_wifi(
        peripherals.modem,
        sys_loop,
        nvs_partition.clone(),
        &config.network,
        &status,
    )
    .context("wifi startup failed")?;

    let timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new()
            .frequency(config.pwm.frequency_hz.Hz().into())
            .resolution(Resolution::Bits8),
    )
    .context("failed to configure LEDC timer")?;
    let red = LedcDriver::new(peripherals.ledc.channel0, &timer, unsafe {
        AnyOutputPin::new(config.pwm.red_pin)
    })?;
    let green = LedcDriver::new(peripherals.ledc.channel1, &timer, unsafe {
        AnyOutputPin::new(config.pwm.green_pin)
    })?;
    let blue = LedcDriver::new(peripherals.ledc.channel2, &timer, unsafe {
        AnyOutputPin::new(config.pwm.blue_pin)
    })?;
    info!(
        "PWM output on GPIO{}/GPIO{}/GPIO{} @ {}Hz",
        config.pwm.red_pin, config.pwm.green_pin, config.pwm.blue_pin, config.pwm.frequency_hz
    );
    let output = LedcOutput {
        _timer: timer,
        red,
        green,
        blue,
    };

    let store = SettingsStore::mount(NvsVolume::new(nvs_partition, &config.record_key));
    if store.is_read_only() {
        warn!("+ Error while mounting NVS");
        status.publish("Error while mounting NVS");
    } else {
        info!("+ FS mounted. Settings will be saved");
        status.publish("FS mounted. Settings will be saved");
    }

    let controller = Arc::new(Mutex::new(LedController::new(output, store, status.clone())));
    let server = create_http_server(&config, controller, status.clone())?;

    info!("+ Init complete. Listening ...");
    status.publish("Init complete. Listening ...");

    // Keep services alive for the program lifetime.
    let _wifi = wifi;
    let _server = server;

    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

fn create_http_server(
    config: &LightConfig,
    controller: Arc<Mutex<DeviceController>>,
    status: StatusSlot,
) -> anyhow::Result<EspHttpServer<'static>> {
    let conf = HttpConfiguration {
        http_port: config.http_port,
        stack_size: HTTP_STACK_SIZE,
        ..Default::default()
    };

    let mut server = EspHttpServer::new(&conf)?;

    for route in Route::ALL {
        let controller = controller.clone();
        let status = status.clone();
        server.fn_handler::<anyhow::Error, _>(route.path(), Method::Get, move |req| {
            let params = parse_query(req.uri());
            let reply = {
                let mut controller = controller
                    .lock()
                    .map_err(|_| anyhow!("controller lock poisoned"))?;
                dispatch(route, &params, &mut controller, &status)
            };

            req.into_response(
                reply.status,
                None,
                &[("Content-Type", reply.content_type)],
            )?
            .write_all(reply.body.as_bytes())?;
            Ok(())
        })?;
    }

    Ok(server)
}

fn connect_wifi(
    modem: Modem,
    sys_loop: EspSystemEventLoop,
    nvs_partition: EspDefaultNvsPartition,
    network: &NetworkConfig,
    status: &StatusSlot,
) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
    if !network.has_station_credentials() {
        return Err(anyhow!("no wifi credentials; build with WIFI_SSID and WIFI_PASS set"));
    }

    let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs_partition))?;
    let mut wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;

    let auth_method = if network.wifi_pass.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: network
            .wifi_ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi ssid too long"))?,
        password: network
            .wifi_pass
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("+ Connecting to wifi '{}'", network.wifi_ssid);
    status.publish(format!("Connecting to wifi '{}'", network.wifi_ssid));

    // The light is useless off the network, so keep trying.
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
            Ok(()) => break,
            Err(err) => {
                warn!("wifi connect attempt {attempt} failed: {err:#}");
                let _ = wifi.disconnect();
                thread::sleep(Duration::from_millis(WIFI_RETRY_DELAY_MS));
            }
        }
    }

    let ip = wifi.wifi().sta_netif().get_ip_info()?.ip;
    info!("+ Connected, IP address: {ip}");
    status.publish(format!("Connected, IP address: {ip}"));

    Ok(wifi)
}

fn spawn_status_loop(status: StatusSlot) {
    thread::spawn(move || loop {
        if let Some(event) = status.take() {
            info!("display: {event}");
        }
        thread::sleep(Duration::from_millis(STATUS_POLL_MS));
    });
}
