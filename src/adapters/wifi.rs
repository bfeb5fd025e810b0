//! WiFi station-mode adapter.
//!
//! The station needs the network up before the responder and publisher are
//! useful, so the device binary calls [`connect`] once at boot and keeps the
//! returned driver alive for the lifetime of the program.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real driver via `esp_idf_svc::wifi::BlockingWifi`.
//! - **all builds**: credential validation, shared with host tests.
//!
//! ## Retry policy
//!
//! A failed association is retried after an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) until [`MAX_ATTEMPTS`] is reached.

use core::fmt;

use crate::config::WifiSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    /// ESP-IDF error code from the driver.
    Driver(i32),
    /// Every attempt failed.
    ConnectionFailed,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::Driver(code) => write!(f, "WiFi driver error {code}"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for WifiError {}

pub const MAX_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

/// Delay before the next attempt.
pub fn next_backoff(current_secs: u32) -> u32 {
    current_secs.saturating_mul(2).min(MAX_BACKOFF_SECS)
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

/// Validated credentials in the fixed-size form the driver expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn from_settings(settings: &WifiSettings) -> Result<Self, WifiError> {
        validate_ssid(&settings.ssid)?;
        validate_password(&settings.password)?;

        let mut ssid = heapless::String::new();
        ssid.push_str(&settings.ssid).map_err(|()| WifiError::InvalidSsid)?;
        let mut password = heapless::String::new();
        password
            .push_str(&settings.password)
            .map_err(|()| WifiError::InvalidPassword)?;
        Ok(Self { ssid, password })
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF driver
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::connect;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{INITIAL_BACKOFF_SECS, MAX_ATTEMPTS, WifiCredentials, WifiError, next_backoff};

    fn driver(e: EspError) -> WifiError {
        WifiError::Driver(e.code())
    }

    /// Bring the station interface up, retrying with backoff.
    pub fn connect(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        credentials: &WifiCredentials,
    ) -> Result<BlockingWifi<EspWifi<'static>>, WifiError> {
        let mut wifi = BlockingWifi::wrap(
            EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(driver)?,
            sysloop,
        )
        .map_err(driver)?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: credentials.ssid.clone(),
            password: credentials.password.clone(),
            auth_method: if credentials.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        }))
        .map_err(driver)?;
        wifi.start().map_err(driver)?;
        info!("WiFi: started, connecting to '{}'", credentials.ssid);

        let mut backoff = INITIAL_BACKOFF_SECS;
        for attempt in 1..=MAX_ATTEMPTS {
            match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
                Ok(()) => {
                    info!("WiFi: connected (attempt {})", attempt);
                    return Ok(wifi);
                }
                Err(e) => {
                    warn!("WiFi: attempt {} failed ({}), retry in {}s", attempt, e, backoff);
                    std::thread::sleep(Duration::from_secs(u64::from(backoff)));
                    backoff = next_backoff(backoff);
                }
            }
        }
        Err(WifiError::ConnectionFailed)
    }
}
