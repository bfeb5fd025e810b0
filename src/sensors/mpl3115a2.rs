//! MPL3115A2 barometric pressure sensor.
//!
//! Sampled in one-shot mode: put the part in standby with the one-shot bit
//! set, wait for the conversion, then read the 20-bit pressure result from
//! `OUT_P_MSB..OUT_P_LSB`. Altitude is derived on the host from pressure.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};

use crate::error::BusError;

/// 7-bit bus address.
pub const ADDRESS: u8 = 0x60;

pub const CTRL_REG1: u8 = 0x26;
pub const OUT_P_MSB: u8 = 0x01;

/// CTRL_REG1 bit 0: 0 = standby, 1 = active.
const CTRL_SBYB: u8 = 0x01;
/// CTRL_REG1 bit 1: initiate a one-shot measurement.
const CTRL_OST: u8 = 0x02;

/// Default conversion wait.
pub const SETTLE_MS: u32 = 10;

/// Sea-level reference pressure for the altitude formula (Pa).
const SEA_LEVEL_PA: f64 = 101_326.0;

/// One decoded pressure measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureReading {
    pub pressure_pa: f32,
    pub altitude_m: f32,
}

impl PressureReading {
    pub fn from_raw(raw: u32) -> Self {
        let pressure_pa = raw_to_pascal(raw);
        Self {
            pressure_pa,
            altitude_m: pascal_to_altitude(pressure_pa),
        }
    }
}

/// `(b0 << 16) | (b1 << 8) | b2`
pub fn assemble_raw(bytes: [u8; 3]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}

/// Integer pascals in bits 23..6, quarter pascals in bits 5..4.
pub fn raw_to_pascal(raw: u32) -> f32 {
    let whole = f64::from(raw >> 6);
    let fraction = f64::from((raw >> 4) & 0x03) / 4.0;
    (whole + fraction) as f32
}

/// US Standard Atmosphere 1976.
pub fn pascal_to_altitude(pressure_pa: f32) -> f32 {
    (44_330.77 * (1.0 - (f64::from(pressure_pa) / SEA_LEVEL_PA).powf(0.190_263_2))) as f32
}

/// Control register value that requests a one-shot conversion.
pub fn one_shot_control(current: u8) -> u8 {
    (current & !CTRL_SBYB) | CTRL_OST
}

/// Trigger a one-shot conversion, wait `settle_ms`, and read the result.
pub fn measure<I: I2c, D: DelayNs>(
    bus: &mut I,
    delay: &mut D,
    settle_ms: u32,
) -> Result<PressureReading, BusError> {
    let fault = |e: I::Error| BusError::new(ADDRESS, e.kind());

    let mut ctrl = [0u8; 1];
    bus.write_read(ADDRESS, &[CTRL_REG1], &mut ctrl).map_err(fault)?;
    bus.write(ADDRESS, &[CTRL_REG1, one_shot_control(ctrl[0])])
        .map_err(fault)?;

    delay.delay_ms(settle_ms);

    let mut out = [0u8; 3];
    bus.write_read(ADDRESS, &[OUT_P_MSB], &mut out).map_err(fault)?;

    Ok(PressureReading::from_raw(assemble_raw(out)))
}
