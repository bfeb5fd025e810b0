//! Simulated weather shield for host runs and tests.
//!
//! Answers the same I2C transactions as the real HTU21D (`0x40`) and
//! MPL3115A2 (`0x60`), building correctly framed responses from configured
//! physical values. Faults can be injected per channel to exercise the
//! sentinel and skip paths.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::sensors::crc::crc8;
use crate::sensors::{htu21d, mpl3115a2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fault {
    #[default]
    None,
    /// Flip one bit of the transmitted CRC byte.
    CorruptCrc,
    /// Report the other channel in the status bits.
    WrongStatus,
    /// The device does not acknowledge its address.
    Nack,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelFaults {
    pub temperature: Fault,
    pub humidity: Fault,
    /// Only [`Fault::Nack`] applies to the pressure sensor.
    pub pressure: Fault,
}

pub struct SimulatedShield {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_pa: f32,
    pub faults: ChannelFaults,
    /// Completed transactions, successful or not.
    pub transactions: u32,
    pending: Option<htu21d::Channel>,
    register: u8,
    ctrl_reg1: u8,
}

impl SimulatedShield {
    pub fn new(temperature_c: f32, humidity_pct: f32, pressure_pa: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            pressure_pa,
            faults: ChannelFaults::default(),
            transactions: 0,
            pending: None,
            register: 0,
            ctrl_reg1: 0,
        }
    }

    /// Last value written to the pressure sensor's CTRL_REG1.
    pub fn ctrl_reg1(&self) -> u8 {
        self.ctrl_reg1
    }

    fn fault_for(&self, channel: htu21d::Channel) -> Fault {
        match channel {
            htu21d::Channel::Temperature => self.faults.temperature,
            htu21d::Channel::Humidity => self.faults.humidity,
        }
    }

    fn htu_frame(&self, channel: htu21d::Channel) -> [u8; 3] {
        let fault = self.fault_for(channel);
        let (raw, status) = match channel {
            htu21d::Channel::Temperature => (celsius_to_raw(self.temperature_c), 0x00),
            htu21d::Channel::Humidity => (humidity_to_raw(self.humidity_pct), 0x02),
        };
        let status = if fault == Fault::WrongStatus { status ^ 0x02 } else { status };

        let mut crc = crc8(raw);
        if channel == htu21d::Channel::Humidity {
            crc ^= htu21d::HUMIDITY_CRC_XOR;
        }
        if fault == Fault::CorruptCrc {
            crc ^= 0x01;
        }

        let [msb, lsb] = raw.to_be_bytes();
        [msb, lsb | status, crc]
    }

    fn mpl_read(&self, buf: &mut [u8]) {
        match self.register {
            mpl3115a2::CTRL_REG1 => {
                if let Some(b) = buf.first_mut() {
                    *b = self.ctrl_reg1;
                }
            }
            mpl3115a2::OUT_P_MSB => {
                let raw = pascal_to_raw(self.pressure_pa).to_be_bytes();
                for (dst, src) in buf.iter_mut().zip(&raw[1..]) {
                    *dst = *src;
                }
            }
            _ => buf.fill(0),
        }
    }

    fn exchange(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        match address {
            htu21d::ADDRESS => {
                for op in operations {
                    match op {
                        Operation::Write(bytes) => {
                            self.pending = match bytes.first() {
                                Some(&htu21d::SAMPLE_TEMPERATURE_HOLD) => {
                                    Some(htu21d::Channel::Temperature)
                                }
                                Some(&htu21d::SAMPLE_HUMIDITY_HOLD) => {
                                    Some(htu21d::Channel::Humidity)
                                }
                                _ => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
                            };
                            if self.pending.is_some_and(|c| self.fault_for(c) == Fault::Nack) {
                                return Err(nack);
                            }
                        }
                        Operation::Read(buf) => {
                            let channel = self.pending.ok_or(ErrorKind::Other)?;
                            let frame = self.htu_frame(channel);
                            for (dst, src) in buf.iter_mut().zip(frame) {
                                *dst = src;
                            }
                        }
                    }
                }
                Ok(())
            }
            mpl3115a2::ADDRESS => {
                if self.faults.pressure == Fault::Nack {
                    return Err(nack);
                }
                for op in operations {
                    match op {
                        Operation::Write(bytes) => match **bytes {
                            [reg] => self.register = reg,
                            [reg, value, ..] => {
                                self.register = reg;
                                if reg == mpl3115a2::CTRL_REG1 {
                                    self.ctrl_reg1 = value;
                                }
                            }
                            [] => {}
                        },
                        Operation::Read(buf) => self.mpl_read(buf),
                    }
                }
                Ok(())
            }
            _ => Err(nack),
        }
    }
}

impl ErrorType for SimulatedShield {
    type Error = ErrorKind;
}

impl I2c for SimulatedShield {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.transactions = self.transactions.wrapping_add(1);
        self.exchange(address, operations)
    }
}

/// Inverse of `raw_to_celsius`, status bits cleared.
fn celsius_to_raw(c: f32) -> u16 {
    let raw = ((f64::from(c) + 46.85) * 65536.0 / 175.72).round();
    (raw.clamp(0.0, 65535.0) as u16) & !0x03
}

/// Inverse of `raw_to_relative_humidity`, status bits cleared.
fn humidity_to_raw(rh: f32) -> u16 {
    let raw = ((f64::from(rh) + 6.0) * 65536.0 / 125.0).round();
    (raw.clamp(0.0, 65535.0) as u16) & !0x03
}

/// Integer pascals in bits 23..6, quarter pascals in bits 5..4.
fn pascal_to_raw(pa: f32) -> u32 {
    let pa = f64::from(pa).max(0.0);
    let whole = pa.floor() as u32 & 0x3_FFFF;
    let quarters = (((pa - pa.floor()) * 4.0).round() as u32).min(3);
    (whole << 6) | (quarters << 4)
}
