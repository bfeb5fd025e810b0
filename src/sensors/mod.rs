//! Sensor subsystem: frame decoders and the aggregating [`WeatherShield`].
//!
//! The shield owns the I2C bus handle and the settle delay. It lives inside
//! the bus lock held by the sampling scheduler, so holding `&mut WeatherShield`
//! is what grants the right to issue transport calls.

pub mod crc;
pub mod htu21d;
pub mod mpl3115a2;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::BusError;
use htu21d::Channel;
use mpl3115a2::PressureReading;

/// Per-channel outcome of one pass over every sensor.
///
/// Frame rejections have already been turned into sentinel values; an `Err`
/// here means the transaction itself failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldReadout {
    pub humidity_pct: Result<f32, BusError>,
    pub temperature_c: Result<f32, BusError>,
    pub pressure: Result<PressureReading, BusError>,
}

/// HTU21D + MPL3115A2 on one shared bus.
pub struct WeatherShield<I, D> {
    bus: I,
    delay: D,
    settle_ms: u32,
}

impl<I: I2c, D: DelayNs> WeatherShield<I, D> {
    pub fn new(bus: I, delay: D) -> Self {
        Self::with_settle_ms(bus, delay, mpl3115a2::SETTLE_MS)
    }

    pub fn with_settle_ms(bus: I, delay: D, settle_ms: u32) -> Self {
        Self {
            bus,
            delay,
            settle_ms,
        }
    }

    pub fn humidity(&mut self) -> Result<f32, BusError> {
        htu21d::measure(&mut self.bus, Channel::Humidity)
    }

    pub fn temperature(&mut self) -> Result<f32, BusError> {
        htu21d::measure(&mut self.bus, Channel::Temperature)
    }

    pub fn pressure(&mut self) -> Result<PressureReading, BusError> {
        mpl3115a2::measure(&mut self.bus, &mut self.delay, self.settle_ms)
    }

    /// Read humidity, temperature and pressure in that order. A failure on
    /// one channel does not stop the others.
    pub fn read_all(&mut self) -> ShieldReadout {
        ShieldReadout {
            humidity_pct: self.humidity(),
            temperature_c: self.temperature(),
            pressure: self.pressure(),
        }
    }

    /// Give the bus back, e.g. to inspect a simulated device in tests.
    pub fn release(self) -> (I, D) {
        (self.bus, self.delay)
    }

    pub fn bus_mut(&mut self) -> &mut I {
        &mut self.bus
    }
}
