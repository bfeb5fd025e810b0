//! Weather Station Firmware: Main Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Boot: logger · peripherals · WiFi · SNTP · config          │
//! │                                                             │
//! │  ┌──────────┐     ┌───────────────┐     ┌────────────────┐  │
//! │  │ sampler  │────▶│  SampleStore  │◀────│  http :50001   │  │
//! │  │ (Core 1) │     └───────▲───────┘     │  (Core 0)      │  │
//! │  └────┬─────┘             │             └────────────────┘  │
//! │       │ bus lock   ┌──────┴───────┐                         │
//! │  HTU21D+MPL3115A2  │ cloud (Core0)│──▶ Event Hub (HTTPS)    │
//! │                    └──────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use log::{info, warn};

use weatherstation::adapters::http_client::EspHttpPoster;
use weatherstation::adapters::indicator::PinIndicator;
use weatherstation::adapters::wifi::{self, WifiCredentials};
use weatherstation::cloud::CloudPublisher;
use weatherstation::config::StationConfig;
use weatherstation::scheduler::{BusLock, SamplingScheduler};
use weatherstation::sensors::WeatherShield;
use weatherstation::server::SnapshotResponder;
use weatherstation::store::SampleStore;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Weather station v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let config = StationConfig::from_json(include_str!("../config/station.json"))?;

    // ── 3. Network + wall clock ───────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let credentials = WifiCredentials::from_settings(&config.wifi)?;
    let _wifi = wifi::connect(peripherals.modem, sysloop, nvs, &credentials)?;
    // Signing tokens need real time; the publisher waits for the first sync.
    let _sntp = EspSntp::new_default()?;

    // ── 4. Weather shield on I2C0 (SDA 8, SCL 9) ──────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    let shield = WeatherShield::with_settle_ms(i2c, FreeRtos, config.pressure_settle_ms);
    let bus = Arc::new(BusLock::new(shield));
    let store = Arc::new(SampleStore::default());

    // ── 5. Status LEDs (blue: sampling, green: serving) ───────
    let blue = PinIndicator::new(PinDriver::output(peripherals.pins.gpio4)?, "blue");
    let green = PinIndicator::new(PinDriver::output(peripherals.pins.gpio5)?, "green");

    // ── 6. Actors ─────────────────────────────────────────────
    let _sampler = SamplingScheduler::new(bus, Arc::clone(&store), &config)
        .with_indicator(Arc::new(blue))
        .spawn()?;

    let _responder = SnapshotResponder::bind(config.http_port, Arc::clone(&store))?
        .with_indicator(Arc::new(green))
        .spawn()?;

    let _publisher = match CloudPublisher::new(&config, store, EspHttpPoster::new()?) {
        Some(publisher) => Some(publisher.spawn()?),
        None => {
            warn!("Running without cloud publishing");
            None
        }
    };

    info!("Weather station running");
    loop {
        std::thread::park();
    }
}
