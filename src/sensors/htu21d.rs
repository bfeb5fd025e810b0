//! HTU21D relative-humidity and temperature sensor.
//!
//! Both channels share one device and one frame layout. A hold-master
//! command is written and three bytes come back in the same transaction:
//!
//! ```text
//!   byte 0   MSB of the measurement
//!   byte 1   LSB; bit 1 = channel (0 temperature, 1 humidity), bit 0 unused
//!   byte 2   CRC-8 over the masked 16-bit measurement
//! ```
//!
//! The humidity checksum is sent XORed with `0x62` by the sensor firmware,
//! so the receiver undoes that before comparing.

use embedded_hal::i2c::{Error as _, I2c};
use log::warn;

use super::crc::crc8;
use crate::error::{BusError, FrameError};

/// 7-bit bus address.
pub const ADDRESS: u8 = 0x40;

/// Hold-master temperature measurement.
pub const SAMPLE_TEMPERATURE_HOLD: u8 = 0xE3;
/// Hold-master humidity measurement.
pub const SAMPLE_HUMIDITY_HOLD: u8 = 0xE5;

/// Sensor firmware quirk applied to the humidity CRC byte.
pub const HUMIDITY_CRC_XOR: u8 = 0x62;

const STATUS_MASK: u8 = 0x03;
const STATUS_HUMIDITY: u8 = 0x02;

/// Value reported for a channel whose frame was rejected.
pub const SENTINEL: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Humidity,
}

impl Channel {
    pub const fn command(self) -> u8 {
        match self {
            Self::Temperature => SAMPLE_TEMPERATURE_HOLD,
            Self::Humidity => SAMPLE_HUMIDITY_HOLD,
        }
    }

    /// Convert a validated raw measurement into physical units
    /// (degrees Celsius or percent relative humidity).
    pub fn convert(self, raw: u16) -> f32 {
        match self {
            Self::Temperature => raw_to_celsius(raw),
            Self::Humidity => raw_to_relative_humidity(raw),
        }
    }
}

/// Validate a 3-byte frame read for `channel` and return the masked raw value.
pub fn decode_frame(frame: [u8; 3], channel: Channel) -> Result<u16, FrameError> {
    let [msb, lsb, received_crc] = frame;
    let raw = (u16::from(msb) << 8) | u16::from(lsb & !STATUS_MASK);

    let is_humidity = lsb & STATUS_HUMIDITY != 0;
    if is_humidity != (channel == Channel::Humidity) {
        return Err(FrameError::WrongChannel);
    }

    let received = match channel {
        Channel::Temperature => received_crc,
        Channel::Humidity => received_crc ^ HUMIDITY_CRC_XOR,
    };
    let expected = crc8(raw);
    if expected != received {
        return Err(FrameError::CrcMismatch { expected, received });
    }

    Ok(raw)
}

/// `(175.72 * raw) / 65536 - 46.85`
pub fn raw_to_celsius(raw: u16) -> f32 {
    ((175.72 * f64::from(raw)) / 65536.0 - 46.85) as f32
}

/// `(125.0 * raw) / 65536 - 6.0`
pub fn raw_to_relative_humidity(raw: u16) -> f32 {
    ((125.0 * f64::from(raw)) / 65536.0 - 6.0) as f32
}

/// Run one measurement on the bus.
///
/// A rejected frame yields [`SENTINEL`] so the cycle can carry on; only a
/// failed transaction is an error.
pub fn measure<I: I2c>(bus: &mut I, channel: Channel) -> Result<f32, BusError> {
    let mut frame = [0u8; 3];
    bus.write_read(ADDRESS, &[channel.command()], &mut frame)
        .map_err(|e| BusError::new(ADDRESS, e.kind()))?;

    match decode_frame(frame, channel) {
        Ok(raw) => Ok(channel.convert(raw)),
        Err(e) => {
            warn!("HTU21D: {:?} frame rejected: {}", channel, e);
            Ok(SENTINEL)
        }
    }
}
