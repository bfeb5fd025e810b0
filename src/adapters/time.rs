//! Clock and delay adapter.
//!
//! - Wall-clock timestamps via `chrono`. On ESP-IDF the system clock is set
//!   by SNTP once Wi-Fi is up; before that it counts from 1970.
//! - [`StdDelay`] implements `embedded_hal::delay::DelayNs` with
//!   `std::thread::sleep`, which on ESP-IDF maps to a FreeRTOS task delay.

use core::time::Duration;

use chrono::{Local, SecondsFormat, Utc};
use embedded_hal::delay::DelayNs;

/// Anything earlier than 2020-01-01 means the clock has not been synced.
const EPOCH_2020: i64 = 1_577_836_800;

/// Local time, RFC 3339 with second precision.
pub fn local_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// UTC round-trip timestamp (millisecond precision, `Z` suffix).
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// `false` while the wall clock still looks unsynced.
pub fn wall_clock_synced(unix_secs: i64) -> bool {
    unix_secs >= EPOCH_2020
}

/// Blocking delay backed by the OS scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
